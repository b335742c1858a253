use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    Server,
    Client,
}

impl Speaker {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Speaker::System => "System",
            Speaker::Server => "Server",
            Speaker::Client => "Client",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    Info,
    Error,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
            Direction::Info => "info",
            Direction::Error => "error",
        }
    }
}

/// Message content: parsed JSON when the text is JSON, the raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Structured(serde_json::Value),
    Raw(String),
}

impl Payload {
    /// Never fails; malformed JSON is kept verbatim.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        serde_json::from_str(text).map_or_else(|_| Payload::Raw(text.to_owned()), Payload::Structured)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Payload::Raw(text.into())
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Structured(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{}", value),
            },
            Payload::Raw(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub sender: Speaker,
    pub payload: Payload,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    #[must_use]
    pub fn new(sender: Speaker, payload: Payload, direction: Direction) -> Self {
        Self {
            sender,
            payload,
            direction,
            timestamp: Utc::now(),
        }
    }

    pub fn system(message: impl Into<String>, direction: Direction) -> Self {
        Self::new(Speaker::System, Payload::text(message), direction)
    }
}

/// Outbound wire format: `{"type":"message","data":...,"timestamp":<epoch ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
    pub timestamp: i64,
}

impl MessageEnvelope {
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            kind: "message".to_owned(),
            data: data.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
