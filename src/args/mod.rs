//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{
    BatchArgs, Command, ConcurrentArgs, DashboardArgs, ProbeArgs, ResourceArgs, StressArgs,
    WsArgs,
};
pub use types::{HttpMethod, PositiveU64, Preset, ResourceKind};

pub(crate) use defaults::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_PATH, DEFAULT_CHANNEL, DEFAULT_USER_AGENT, DEFAULT_WS_URL,
};
pub(crate) use parsers::{parse_duration_arg, parse_header, parse_headers_json};
