use std::collections::BTreeMap;
use std::error::Error as _;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::args::{HttpMethod, Preset};
use crate::records::{Outcome, RequestInfo, ResponseFacet, TestRecord};

use super::client::resolve_target;

/// A probe as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl ProbeRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any existing header whose name matches
    /// case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_owned(), value.into());
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::BasicGet => ProbeRequest::new(HttpMethod::Get, "/api/test"),
            Preset::JsonPost => ProbeRequest::new(HttpMethod::Post, "/api/test")
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"message":"Hello, World!"}"#),
            Preset::FileUpload => ProbeRequest::new(HttpMethod::Post, "/api/upload"),
        }
    }

    /// The body that actually goes on the wire.
    #[must_use]
    pub fn effective_body(&self) -> Option<&str> {
        self.body
            .as_deref()
            .filter(|body| !body.is_empty() && self.method.carries_body())
    }
}

/// Issues one request and folds whatever happens into a [`TestRecord`].
#[derive(Debug, Clone)]
pub struct HttpProbeRunner {
    client: Client,
    base_url: Url,
}

impl HttpProbeRunner {
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs the probe. Transport failures become an Error facet and HTTP
    /// error statuses a Response facet; nothing is returned as `Err`.
    pub async fn run(&self, request: &ProbeRequest) -> TestRecord {
        let body = request.effective_body().map(str::to_owned);
        let info = RequestInfo {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: body.clone(),
        };
        let outcome = self.execute(request, body).await;
        TestRecord::new(info, outcome)
    }

    async fn execute(&self, request: &ProbeRequest, body: Option<String>) -> Outcome {
        let target = match resolve_target(&self.base_url, &request.url) {
            Ok(target) => target,
            Err(err) => return Outcome::error(format!("Invalid URL '{}': {}", request.url, err)),
        };

        let mut builder = self.client.request(request.method.to_reqwest(), target);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        debug!("Probing {} {}", request.method, request.url);
        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(
                    "Probe {} {} failed after {}ms: {}",
                    request.method,
                    request.url,
                    round_millis(started.elapsed()),
                    err
                );
                return Outcome::error(error_message(&err));
            }
        };

        let status = response.status();
        let headers = collect_headers(response.headers());
        let body_text = if request.method.reads_body() {
            match response.text().await {
                Ok(text) => text,
                Err(err) => return Outcome::error(error_message(&err)),
            }
        } else {
            drop(response);
            String::new()
        };
        let elapsed_ms = round_millis(started.elapsed());
        debug!(
            "Probe {} {} -> {} in {}ms",
            request.method,
            request.url,
            status.as_u16(),
            elapsed_ms
        );

        Outcome::Response(ResponseFacet {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: body_text,
            elapsed_ms,
        })
    }
}

/// Flattens an error and its sources into one line.
#[must_use]
pub fn error_message(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

/// Repeated header names are joined with ", ".
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&text);
            })
            .or_insert(text);
    }
    collected
}

/// Nearest whole millisecond, halves rounding up.
pub(super) fn round_millis(elapsed: Duration) -> u64 {
    elapsed
        .as_micros()
        .saturating_add(500)
        .checked_div(1000)
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(u64::MAX)
}
