use std::path::PathBuf;

use casetrack_core::CaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: {reason}")]
    BadRow { row: usize, reason: String },

    #[error("row {row}: {source}")]
    Case {
        row: usize,
        #[source]
        source: CaseError,
    },
}
