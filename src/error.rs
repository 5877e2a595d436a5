use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read {} row {row}: {message}", path.display())]
    Decode {
        path: PathBuf,
        row: u64,
        message: String,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid year range {0:?}: expected YEAR or START-END with START <= END")]
    InvalidYearRange(String),

    #[error("select up to {max} names (got {got})")]
    TooManyNames { max: usize, got: usize },

    #[error("no {0} data loaded; check the data directory")]
    EmptyTable(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
