use std::time::Duration;

use reqwest::Client;
use tracing::error;
use url::Url;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, HttpError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Builds the shared HTTP client used by every probe.
///
/// # Errors
///
/// Returns an error when the client cannot be constructed.
pub fn build_client(settings: &ClientSettings) -> AppResult<Client> {
    Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(settings.user_agent.as_str())
        .build()
        .map_err(|err| {
            error!("Failed to build HTTP client: {}", err);
            AppError::http(HttpError::BuildClientFailed { source: err })
        })
}

/// Resolves `target` the way a page resolves a link: absolute URLs pass
/// through, anything else is joined onto `base`.
///
/// # Errors
///
/// Returns an error when the target is neither absolute nor joinable.
pub fn resolve_target(base: &Url, target: &str) -> Result<Url, url::ParseError> {
    match Url::parse(target) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(target),
        Err(err) => Err(err),
    }
}
