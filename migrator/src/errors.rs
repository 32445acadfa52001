use std::borrow::Cow;

use thiserror::Error;

/// Error type returned by caller-supplied read/transform/write operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure talking to the store that records executed scripts.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An execution record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store holds something under the script's key that is not a record.
    #[error("corrupt execution record for '{script}': {message}")]
    Corrupt { script: String, message: String },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

/// Top-level error type of a migration run.
///
/// Page and batch numbers are 1-based, counted from the start of the run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The idempotency store could not be read or written.
    #[error("tracker unavailable: {0}")]
    TrackerUnavailable(#[from] TrackerError),

    /// The paginated read failed; nothing from that page was written.
    #[error("read failed on page {page}: {source}")]
    ReadFailed {
        page: u64,
        #[source]
        source: BoxError,
    },

    /// The transform raised an error; nothing from that page was written.
    #[error("transform failed on page {page}: {source}")]
    TransformFailed {
        page: u64,
        #[source]
        source: BoxError,
    },

    /// A batch failed to persist. Earlier batches stay written.
    #[error("write failed on page {page}, batch {batch}: {source}")]
    WriteFailed {
        page: u64,
        batch: u64,
        #[source]
        source: BoxError,
    },

    /// The engine or its configuration was constructed with invalid values.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: Cow<'static, str> },
}

impl MigrationError {
    /// Stable label for log lines and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrationError::TrackerUnavailable(_) => "tracker_unavailable",
            MigrationError::ReadFailed { .. } => "read_failed",
            MigrationError::TransformFailed { .. } => "transform_failed",
            MigrationError::WriteFailed { .. } => "write_failed",
            MigrationError::InvalidConfig { .. } => "invalid_config",
        }
    }

    pub fn invalid_config(message: impl Into<Cow<'static, str>>) -> Self {
        MigrationError::InvalidConfig { message: message.into() }
    }
}
