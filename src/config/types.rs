use std::time::Duration;

use serde::Deserialize;

use crate::args::parse_duration_arg;
use crate::error::{AppResult, ConfigError, ValidationError};

/// File-backed defaults. Every field is optional; explicit CLI flags win.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    /// `Key: Value` entries sent with every single probe.
    pub headers: Option<Vec<String>>,
    pub export_dir: Option<String>,
    pub no_color: Option<bool>,
    pub verbose: Option<bool>,
}

/// Integer seconds or a duration string such as `500ms`, `10s` or `2m`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        match self {
            DurationValue::Seconds(0) => Err(ConfigError::InvalidField {
                field,
                source: ValidationError::DurationZero,
            }
            .into()),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
