use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{DEFAULT_BASE_URL, DEFAULT_CHANNEL, DEFAULT_WS_URL};
use super::parsers::{parse_duration_arg, parse_header, parse_positive_u64};
use super::types::{HttpMethod, PositiveU64, Preset, ResourceKind};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Drive HTTP and WebSocket tests against a backend and aggregate the results."
)]
pub struct DashboardArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Base URL that relative targets and backend test endpoints resolve against
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// WebSocket URL of the `connect` channel; other channels replace its `/connect` segment
    #[arg(long = "ws-url", default_value = DEFAULT_WS_URL)]
    pub ws_url: String,

    /// Request timeout (supports ms/s/m)
    #[arg(long = "timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Connect timeout for HTTP and WebSocket (supports ms/s/m)
    #[arg(long = "connect-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Directory the results export is written to
    #[arg(long = "export-dir", default_value = ".")]
    pub export_dir: String,

    /// Export the collected results after the command finishes
    #[arg(long)]
    pub export: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Headers added to single probes (set from config)
    #[arg(skip)]
    pub default_headers: Vec<(String, String)>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Send a single HTTP probe
    Probe(ProbeArgs),
    /// Probe one URL with every HTTP method in turn
    Batch(BatchArgs),
    /// Ask the backend to run a concurrent load test
    Concurrent(ConcurrentArgs),
    /// Ask the backend to run a stress test
    Stress(StressArgs),
    /// Show backend runtime information
    System,
    /// Run a backend resource test
    Resource(ResourceArgs),
    /// Open a WebSocket channel, send messages and print the transcript
    Ws(WsArgs),
    /// Interactive session reading commands from stdin
    Session,
}

#[derive(Debug, Args, Clone)]
pub struct ProbeArgs {
    /// HTTP method to use
    #[arg(long, short = 'X', ignore_case = true)]
    pub method: Option<HttpMethod>,

    /// Target URL (absolute, or relative to --base-url)
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long, short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// HTTP headers as a JSON object
    #[arg(long = "headers-json")]
    pub headers_json: Option<String>,

    /// Request body (sent for POST/PUT/PATCH only)
    #[arg(long, short)]
    pub data: Option<String>,

    /// Start from a canned request
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Target URL (defaults to /api/test)
    #[arg(long, short)]
    pub url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ConcurrentArgs {
    /// Number of concurrent workers on the backend
    #[arg(long, default_value = "10", value_parser = parse_positive_u64)]
    pub concurrency: PositiveU64,

    /// Total requests the backend issues
    #[arg(long, default_value = "100", value_parser = parse_positive_u64)]
    pub requests: PositiveU64,

    /// Delay per request in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay: u64,
}

#[derive(Debug, Args, Clone)]
pub struct StressArgs {
    /// Stress duration in seconds
    #[arg(long, default_value = "60", value_parser = parse_positive_u64)]
    pub duration: PositiveU64,

    /// Number of concurrent workers on the backend
    #[arg(long, default_value = "20", value_parser = parse_positive_u64)]
    pub concurrency: PositiveU64,
}

#[derive(Debug, Args, Clone)]
pub struct ResourceArgs {
    /// Resource test to run
    #[arg(value_enum)]
    pub kind: ResourceKind,
}

#[derive(Debug, Args, Clone)]
pub struct WsArgs {
    /// Logical channel name (connect, echo, broadcast, realtime, heartbeat, binary, chat, performance)
    #[arg(long, default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    /// Explicit WebSocket URL (skips deriving it from --ws-url)
    #[arg(long)]
    pub url: Option<String>,

    /// Message text to send (repeatable)
    #[arg(long = "message", short)]
    pub messages: Vec<String>,

    /// How long to keep listening after the last message (supports ms/s/m)
    #[arg(long, default_value = "2s", value_parser = parse_duration_arg)]
    pub listen: Duration,
}
