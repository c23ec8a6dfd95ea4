use thiserror::Error;

/// Errors produced by the measure evaluation pipeline.
///
/// Warnings that do not invalidate results are written to stderr instead of
/// being raised through this type.
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed CNL data: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("empty collection: {0}")]
    EmptyCollection(String),

    #[error("node bases differ: {0}")]
    NodeBaseMismatch(String),

    /// The requested measure carries no information for these collections.
    /// Callers must not mistake this for a zero similarity.
    #[error("measure is undefined: {0}")]
    MeasureUndefined(String),

    #[error("accumulator out of range: {0}")]
    Overflow(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type MeasureResult<T> = std::result::Result<T, MeasureError>;
