// crates/rmatrack-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("store operation failed: {0}")]
    Store(String),

    #[error("catch-up span of {pending_days} days exceeds the archive backfill cap")]
    CatchUpOverflow { pending_days: i64 },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
