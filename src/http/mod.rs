//! HTTP probes: single requests, the all-methods batch and remote load triggers.
mod batch;
mod client;
mod probe;
mod remote;

#[cfg(test)]
mod tests;

pub use batch::{BatchRunner, batch_requests};
pub use client::{ClientSettings, build_client, resolve_target};
pub use probe::{HttpProbeRunner, ProbeRequest, error_message};
pub use remote::{
    AggregateStats, ApiEnvelope, ConcurrentParams, GcInfo, MemoryInfo, RemoteLoadTrigger,
    StressParams, SystemInfo,
};
