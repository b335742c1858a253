mod app;
mod config;
mod export;
mod http;
mod metrics;
mod socket;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use export::ExportError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use socket::SocketError;
pub use validation::ValidationError;
