use thiserror::Error;

/// Failure taxonomy for the sync engine.
///
/// `RowNotFound` is terminal for a single card (the backing row was deleted
/// remotely, never retry). `Transient` is anything worth retrying through the
/// durable backlog. Everything else is fatal to the operation that raised it.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("required columns missing: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("could not extract a spreadsheet id from '{0}'")]
    InvalidLocator(String),

    #[error("the backing row no longer exists")]
    RowNotFound,

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("the spreadsheet contains no usable rows")]
    EmptyDeck,

    #[error("no deck is currently loaded")]
    NoDeckLoaded,

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("cramsheet error: {0}")]
    Custom(String),
}

impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        SyncError::Io(Box::new(error))
    }
}

// Network, timeout and decode failures are all retryable from the caller's
// point of view, so they collapse into Transient.
impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        SyncError::Transient(error.to_string())
    }
}

/// Outcome of a conflict-checked remote write. A skipped write is an expected
/// result of last-writer-wins, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    ConflictSkipped,
}
