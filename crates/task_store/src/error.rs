//! Task store error types.

use thiserror::Error;

/// Errors that can occur during task store operations.
///
/// A lookup miss is not an error: `get` answers with `None` and
/// `remove`/`complete` are silent no-ops for unknown ids.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Snapshot destination or source is unreachable or unwritable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored content does not deserialize into valid task records.
    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;
