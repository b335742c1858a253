const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const BYTE_STEP: u64 = 1024;
const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;

/// Binary-scaled size with at most two decimals: `0 Bytes`, `1.5 KB`, `2 MB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let mut scale: u64 = 1;
    let mut unit_index: usize = 0;
    while unit_index < BYTE_UNITS.len().saturating_sub(1)
        && bytes >= scale.saturating_mul(BYTE_STEP)
    {
        scale = scale.saturating_mul(BYTE_STEP);
        unit_index = unit_index.saturating_add(1);
    }
    let unit = BYTE_UNITS.get(unit_index).copied().unwrap_or("Bytes");

    let hundredths = u128::from(bytes)
        .saturating_mul(100)
        .saturating_add(u128::from(scale.checked_div(2).unwrap_or(0)))
        .checked_div(u128::from(scale))
        .unwrap_or(0);
    let whole = hundredths.checked_div(100).unwrap_or(0);
    let fraction = hundredths.checked_rem(100).unwrap_or(0);
    if fraction == 0 {
        format!("{} {}", whole, unit)
    } else if fraction.checked_rem(10) == Some(0) {
        format!("{}.{} {}", whole, fraction.checked_div(10).unwrap_or(0), unit)
    } else {
        format!("{}.{:02} {}", whole, fraction, unit)
    }
}

/// `1h 2m 3s`, `2m 5s` or `42s`.
#[must_use]
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs.checked_div(SECS_PER_HOUR).unwrap_or(0);
    let minutes = total_secs
        .checked_rem(SECS_PER_HOUR)
        .and_then(|rest| rest.checked_div(SECS_PER_MINUTE))
        .unwrap_or(0);
    let seconds = total_secs.checked_rem(SECS_PER_MINUTE).unwrap_or(0);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Pretty-prints JSON bodies; anything else is returned as is.
#[must_use]
pub fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_owned())
}

/// Keeps at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}... ({} more bytes)",
            text.get(..cut).unwrap_or(text),
            text.len().saturating_sub(cut)
        ),
        None => text.to_owned(),
    }
}

pub(crate) fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
