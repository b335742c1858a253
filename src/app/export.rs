use std::path::{Path, PathBuf};

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::error::ExportError;
use crate::records::{ResultLog, TestRecord};

/// The export artifact: the whole log, in append order.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'log> {
    pub export_time: String,
    pub total_tests: usize,
    pub results: &'log [TestRecord],
}

/// # Errors
///
/// Returns [`ExportError::EmptyLog`] when there is nothing to export.
pub fn build_export(log: &ResultLog) -> Result<ExportDocument<'_>, ExportError> {
    if log.is_empty() {
        return Err(ExportError::EmptyLog);
    }
    Ok(ExportDocument {
        export_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        total_tests: log.len(),
        results: log.records(),
    })
}

#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("proxy-test-results-{}.json", date.format("%Y-%m-%d"))
}

/// Writes the log as pretty JSON into `dir` and returns the file path.
///
/// # Errors
///
/// Returns an error when the log is empty or the file cannot be written.
pub async fn write_export(dir: &Path, log: &ResultLog) -> Result<PathBuf, ExportError> {
    let document = build_export(log)?;
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    let json =
        serde_json::to_vec_pretty(&document).map_err(|source| ExportError::Encode { source })?;

    let write_failed = |source: std::io::Error| ExportError::Write {
        path: path.clone(),
        source,
    };
    let file = tokio::fs::File::create(&path).await.map_err(write_failed)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&json).await.map_err(write_failed)?;
    writer.flush().await.map_err(write_failed)?;

    info!("Exported {} results to {}", document.total_tests, path.display());
    Ok(path)
}
