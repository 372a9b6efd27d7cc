//! Error types for estuary-sync-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
///
/// Malformed revision ids never appear here: the revid codec degrades
/// them to the `(-1, "")` sentinel and logs a warning instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Revision-tree structural invariant violated
    #[error("Invalid revision tree: {0}")]
    InvalidRevTree(String),

    /// Malformed encoded revisions list
    #[error("Invalid revisions list: {0}")]
    InvalidRevisions(String),

    /// Revision not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Body property has the wrong JSON shape
    #[error("Bad property: {0}")]
    BadProperty(String),

    /// Invalid expiry value
    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid revision tree error
    pub fn invalid_rev_tree(msg: impl Into<String>) -> Self {
        Error::InvalidRevTree(msg.into())
    }

    /// Create an invalid revisions list error
    pub fn invalid_revisions(msg: impl Into<String>) -> Self {
        Error::InvalidRevisions(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a bad property error
    pub fn bad_property(msg: impl Into<String>) -> Self {
        Error::BadProperty(msg.into())
    }

    /// Create an invalid expiry error
    pub fn invalid_expiry(msg: impl Into<String>) -> Self {
        Error::InvalidExpiry(msg.into())
    }
}
