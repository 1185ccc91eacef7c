//! Error types for Tsar

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TsarError {
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Preparation error: {0}")]
    Preparation(String),

    #[error("Isolation boundary unavailable: {0}")]
    BoundaryUnavailable(String),
}

pub type Result<T> = std::result::Result<T, TsarError>;
