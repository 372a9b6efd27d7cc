//! Error types for the archive crate

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur in archive operations
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Archived revision not found (missing or already compacted away)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying bucket failure
    #[error("Bucket error: {0}")]
    Bucket(String),

    /// Core error wrapper
    #[error("Core error: {0}")]
    Core(#[from] estuary_sync_core::Error),
}

impl ArchiveError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a bucket error
    pub fn bucket(msg: impl Into<String>) -> Self {
        Self::Bucket(msg.into())
    }

    /// True for misses, which callers surface as HTTP 404 "missing".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
