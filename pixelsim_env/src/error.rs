//! Error types for the Pixelsim environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Durable flag read/write failed (poisoned lock, database error, etc.)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Clock operation failed
    #[error("Clock error: {0}")]
    ClockError(String),
}

impl EnvError {
    /// Creates a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}
