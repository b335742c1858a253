use thiserror::Error;

/// Input the user got wrong; the action is dropped before any network call.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Please enter a request URL.")]
    MissingUrl,
    #[error("Please enter a message to send.")]
    MissingMessage,
    #[error("Channel name must not be empty.")]
    MissingChannel,
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header name '{header}': {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{header}': {source}")]
    InvalidHeaderValue {
        header: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Unknown preset '{name}'. Use basic-get, json-post, or file-upload.")]
    UnknownPreset { name: String },
    #[error("Unknown resource test '{value}'. Use memory, cpu, network, or fileio.")]
    UnknownResourceKind { value: String },
    #[error("Unknown HTTP method '{value}'.")]
    UnknownMethod { value: String },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid WebSocket URL '{url}': {source}")]
    InvalidSocketUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unknown command '{value}'. Type 'help' for the command list.")]
    UnknownCommand { value: String },
    #[error("Missing argument: {name}.")]
    MissingArgument { name: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
