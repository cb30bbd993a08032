use thiserror::Error;

/// Validation and contract errors exposed by `coincast-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("asset id cannot be empty")]
    EmptyAssetId,
    #[error("asset id length {len} exceeds max {max}")]
    AssetIdTooLong { len: usize, max: usize },
    #[error("asset id contains invalid character '{ch}' at index {index}")]
    AssetIdInvalidChar { ch: char, index: usize },

    #[error("price series cannot be empty")]
    EmptySeries,
    #[error("batch must contain at least one series")]
    EmptyBatch,
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("window length mismatch for '{asset}': expected {expected}, got {actual}")]
    WindowLengthMismatch {
        asset: String,
        expected: usize,
        actual: usize,
    },
    #[error("history for '{asset}' has {available} observations, window needs {required}")]
    InsufficientHistory {
        asset: String,
        available: usize,
        required: usize,
    },
    #[error("batch has {windows} windows but {targets} targets")]
    TargetCountMismatch { windows: usize, targets: usize },

    #[error("sentiment {value} is outside [-1, 1]")]
    SentimentOutOfRange { value: f64 },
    #[error("lookback must be at least 1")]
    InvalidLookback,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
