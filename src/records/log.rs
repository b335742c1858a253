use serde::{Serialize, Serializer};

use crate::error::MetricsError;

use super::latency::{LatencyHistogram, LatencySummary};
use super::types::{Outcome, TestRecord};

/// Success percentage kept in tenths so rounding stays exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SuccessRate {
    tenths: u64,
}

impl SuccessRate {
    /// Rounds `success / total * 100` half-up to one decimal place.
    #[must_use]
    pub fn from_counts(success: u64, total: u64) -> Self {
        if total == 0 {
            return Self::default();
        }
        let half = total.checked_div(2).unwrap_or(0);
        let tenths = u128::from(success)
            .saturating_mul(1000)
            .saturating_add(u128::from(half))
            .checked_div(u128::from(total))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);
        Self { tenths }
    }

    #[must_use]
    pub const fn tenths(self) -> u64 {
        self.tenths
    }

    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "Percent is exposed as a one-decimal float for display and export."
    )]
    pub fn percent(self) -> f64 {
        f64::from(u32::try_from(self.tenths).unwrap_or(u32::MAX)) / 10.0
    }
}

impl std::fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.tenths.checked_div(10).unwrap_or(0);
        let fraction = self.tenths.checked_rem(10).unwrap_or(0);
        write!(f, "{}.{}", whole, fraction)
    }
}

impl Serialize for SuccessRate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.percent())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: u64,
    pub success_count: u64,
    pub failed_count: u64,
    #[serde(rename = "success_rate_percent")]
    pub success_rate: SuccessRate,
}

/// Append-only record sequence in append order.
#[derive(Debug, Default)]
pub struct ResultLog {
    records: Vec<TestRecord>,
}

impl ResultLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> LogStats {
        let total = u64::try_from(self.records.len()).unwrap_or(u64::MAX);
        let success_count = u64::try_from(
            self.records
                .iter()
                .filter(|record| record.success())
                .count(),
        )
        .unwrap_or(u64::MAX);
        LogStats {
            total,
            success_count,
            failed_count: total.saturating_sub(success_count),
            success_rate: SuccessRate::from_counts(success_count, total),
        }
    }

    /// Latency distribution over records that got a response.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be built.
    pub fn latency(&self) -> Result<LatencySummary, MetricsError> {
        let mut histogram = LatencyHistogram::new()?;
        for record in &self.records {
            if let Outcome::Response(response) = record.outcome() {
                histogram.record(response.elapsed_ms)?;
            }
        }
        Ok(histogram.summary())
    }
}
