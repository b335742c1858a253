use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::MetricsError;

/// Elapsed-time distribution over the response records of a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_ms: u64,
    pub avg_ms: u64,
    pub max_ms: u64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
}

#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
    min_ms: u64,
    max_ms: u64,
    sum_ms: u128,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| MetricsError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self {
            hist,
            min_ms: u64::MAX,
            max_ms: 0,
            sum_ms: 0,
        })
    }

    /// Record a latency value in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency_ms: u64) -> Result<(), MetricsError> {
        self.hist
            .record(latency_ms.max(1))
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })?;
        self.min_ms = self.min_ms.min(latency_ms);
        self.max_ms = self.max_ms.max(latency_ms);
        self.sum_ms = self.sum_ms.saturating_add(u128::from(latency_ms));
        Ok(())
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        let count = self.count();
        if count == 0 {
            return LatencySummary::default();
        }
        let avg = self
            .sum_ms
            .checked_div(u128::from(count))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(u64::MAX);
        LatencySummary {
            count,
            min_ms: self.min_ms,
            avg_ms: avg,
            max_ms: self.max_ms,
            p50_ms: self.hist.value_at_quantile(0.5),
            p90_ms: self.hist.value_at_quantile(0.9),
            p99_ms: self.hist.value_at_quantile(0.99),
        }
    }
}
