//! The narrow interface the core reports to. Rendering lives behind it.
use serde::Serialize;

use crate::args::ResourceKind;
use crate::http::{AggregateStats, SystemInfo};
use crate::records::{LatencySummary, LogStats, TestRecord};
use crate::socket::{SocketState, TranscriptEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Danger, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Concurrent,
    Stress,
}

impl LoadKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LoadKind::Concurrent => "Concurrent test",
            LoadKind::Stress => "Stress test",
        }
    }
}

/// Receives everything a view would render. Every method defaults to a no-op.
pub trait Reporter: Send + Sync {
    fn record(&self, _record: &TestRecord) {}

    fn stats(&self, _stats: &LogStats) {}

    fn latency(&self, _latency: &LatencySummary) {}

    fn notice(&self, _notice: &Notice) {}

    fn socket_state(&self, _channel: &str, _state: SocketState) {}

    fn transcript(&self, _channel: &str, _entry: &TranscriptEntry) {}

    fn aggregate(&self, _kind: LoadKind, _stats: &AggregateStats) {}

    fn system_info(&self, _info: &SystemInfo) {}

    fn resource(&self, _kind: ResourceKind, _data: &serde_json::Value) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}
