use tracing::debug;

use crate::args::HttpMethod;
use crate::records::TestRecord;

use super::probe::{HttpProbeRunner, ProbeRequest};

/// The seven probes of an all-methods run, in issue order.
#[must_use]
pub fn batch_requests(url: &str) -> Vec<ProbeRequest> {
    HttpMethod::ALL
        .into_iter()
        .map(|method| {
            let request =
                ProbeRequest::new(method, url).with_header("Content-Type", "application/json");
            if method.carries_body() {
                let payload = serde_json::json!({ "test": true, "method": method.as_str() });
                request.with_body(payload.to_string())
            } else {
                request
            }
        })
        .collect()
}

/// Probes one URL with every method, one after another.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    runner: HttpProbeRunner,
}

impl BatchRunner {
    #[must_use]
    pub const fn new(runner: HttpProbeRunner) -> Self {
        Self { runner }
    }

    /// Always yields seven records, one per method in [`HttpMethod::ALL`]
    /// order. Each probe completes before the next is sent.
    pub async fn run_all(&self, url: &str) -> Vec<TestRecord> {
        let mut records = Vec::with_capacity(HttpMethod::ALL.len());
        self.run_all_with(url, |record| records.push(record)).await;
        records
    }

    /// Like [`BatchRunner::run_all`], handing each record to `on_record` as
    /// soon as its probe finishes.
    pub async fn run_all_with<F>(&self, url: &str, mut on_record: F)
    where
        F: FnMut(TestRecord),
    {
        for request in batch_requests(url) {
            let record = self.runner.run(&request).await;
            debug!(
                "Batch {} finished (success={})",
                request.method,
                record.success()
            );
            on_record(record);
        }
    }
}
