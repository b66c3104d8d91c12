use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmlError {
    /// Transaction input missing required fields or carrying an
    /// unparseable timestamp. Aborts evaluation for that transaction only.
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A persisted model snapshot could not be loaded. Recovered
    /// internally by bootstrap training; never surfaced to callers.
    #[error("Model snapshot unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// Unexpected failure inside a scorer. Recovered internally by
    /// returning a neutral score.
    #[error("Scoring error: {reason}")]
    Scoring { reason: String },

    /// Alert/assessment write failure. Audit durability is a correctness
    /// requirement, so this surfaces to the caller.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compliance reporting channel failure. Logged and retried
    /// out-of-band; never blocks the evaluation path.
    #[error("Reporting error: {reason}")]
    Reporting { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AmlResult<T> = Result<T, AmlError>;
