use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::args::HttpMethod;

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub fn next() -> Self {
        RecordId(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What was sent. `body` is `None` when the method does not carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseFacet {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ResponseFacet {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorFacet {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Response(ResponseFacet),
    Error(ErrorFacet),
}

impl Outcome {
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(ErrorFacet {
            message: message.into(),
        })
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        match self {
            Outcome::Response(response) => response.is_ok(),
            Outcome::Error(_) => false,
        }
    }

    #[must_use]
    pub const fn response(&self) -> Option<&ResponseFacet> {
        match self {
            Outcome::Response(response) => Some(response),
            Outcome::Error(_) => None,
        }
    }
}

/// One probe outcome. Immutable once built; `success` is always derived from
/// the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    id: RecordId,
    timestamp: DateTime<Utc>,
    request: RequestInfo,
    #[serde(flatten)]
    outcome: Outcome,
    success: bool,
}

impl TestRecord {
    #[must_use]
    pub fn new(request: RequestInfo, outcome: Outcome) -> Self {
        let success = outcome.is_success();
        Self {
            id: RecordId::next(),
            timestamp: Utc::now(),
            request,
            outcome,
            success,
        }
    }

    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn request(&self) -> &RequestInfo {
        &self.request
    }

    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }
}
