use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no test results to export.")]
    EmptyLog,
    #[error("Failed to encode export document: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write export '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
