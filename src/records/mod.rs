//! Test outcome records and the in-memory result log.
mod latency;
mod log;
mod types;


pub use latency::{LatencyHistogram, LatencySummary};
pub use log::{LogStats, ResultLog, SuccessRate};
pub use types::{ErrorFacet, Outcome, RecordId, RequestInfo, ResponseFacet, TestRecord};
