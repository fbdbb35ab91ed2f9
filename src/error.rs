//! Error types for template/recording I/O and engine configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A recording contained no tracked frame at all.
    #[error("recording {0} has no tracked frames")]
    EmptyRecording(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, GestureError>;
