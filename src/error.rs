use thiserror::Error;

/// Fatal errors. Anything recoverable is reported through
/// [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("actual and predicted series differ in length ({actual} vs {predicted})")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("folded layout precondition broken: {reason}")]
    FoldPrecondition { reason: String },

    #[error("payload field '{key}' is not a record array")]
    Payload { key: String },

    #[error("unknown payload shape '{0}'")]
    UnknownShape(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
