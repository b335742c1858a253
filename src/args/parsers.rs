use std::collections::BTreeMap;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};

use super::types::PositiveU64;
use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    let (key, value) = match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => (key.trim(), value.trim()),
        Some(_) | None => {
            return Err(ValidationError::InvalidHeaderFormat {
                value: s.to_owned(),
            });
        }
    };
    HeaderName::from_bytes(key.as_bytes()).map_err(|err| ValidationError::InvalidHeaderName {
        header: key.to_owned(),
        source: err,
    })?;
    HeaderValue::from_str(value).map_err(|err| ValidationError::InvalidHeaderValue {
        header: key.to_owned(),
        source: err,
    })?;
    Ok((key.to_owned(), value.to_owned()))
}

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

/// Parses the header editor's JSON object text.
///
/// Anything that is not a JSON object yields `None`; the caller treats that as
/// "no headers". String values are taken verbatim, other JSON values are
/// rendered with their JSON text.
pub(crate) fn parse_headers_json(text: &str) -> Option<BTreeMap<String, String>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(BTreeMap::new());
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(key, value)| {
                let rendered = value
                    .as_str()
                    .map_or_else(|| value.to_string(), str::to_owned);
                (key.clone(), rendered)
            })
            .collect(),
    )
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    let value = s.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }

    let mut digits_len = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits_len = digits_len.saturating_add(1);
        } else {
            break;
        }
    }
    if digits_len == 0 {
        return Err(AppError::validation(
            ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            },
        ));
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            }));
        }
    };

    if duration.as_millis() == 0 {
        return Err(AppError::validation(ValidationError::DurationZero));
    }

    Ok(duration)
}
