//! Key-value bucket traits
//!
//! The archive does not own a data store; the host injects one through
//! [`Bucket`]. The trait is runtime-agnostic and uses `async_trait` for
//! async support. Production deployments back it with the server's
//! document bucket; tests use [`MemoryBucket`].

use crate::error::{ArchiveError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

/// Raw key-value operations the archive needs from its host store.
#[async_trait]
pub trait Bucket: Debug + Send + Sync {
    /// Read the raw bytes stored under `key`.
    ///
    /// Returns `ArchiveError::NotFound` if the key doesn't exist.
    async fn get_raw(&self, key: &str) -> Result<Vec<u8>>;

    /// Store raw bytes under `key` with a time-to-live.
    ///
    /// `expiry_seconds` follows the host store's convention (relative
    /// seconds, or absolute epoch for large values); 0 means no expiry.
    async fn set_raw(&self, key: &str, expiry_seconds: u32, bytes: &[u8]) -> Result<()>;

    /// Delete a key.
    ///
    /// Deleting a non-existent key succeeds; only actual failures error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// A simple in-memory bucket for testing
///
/// Stores data in a HashMap with interior mutability (via
/// `Arc<RwLock<...>>`). Expiries are recorded, not enforced, so tests can
/// assert on them.
#[derive(Debug, Clone, Default)]
pub struct MemoryBucket {
    data: Arc<RwLock<HashMap<String, (u32, Vec<u8>)>>>,
}

impl MemoryBucket {
    /// Create a new empty memory bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// The expiry recorded for a key, if present.
    pub fn expiry_of(&self, key: &str) -> Option<u32> {
        self.data
            .read()
            .expect("RwLock poisoned")
            .get(key)
            .map(|(expiry, _)| *expiry)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().expect("RwLock poisoned").len()
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn get_raw(&self, key: &str) -> Result<Vec<u8>> {
        self.data
            .read()
            .expect("RwLock poisoned")
            .get(key)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ArchiveError::not_found(key.to_string()))
    }

    async fn set_raw(&self, key: &str, expiry_seconds: u32, bytes: &[u8]) -> Result<()> {
        self.data
            .write()
            .expect("RwLock poisoned")
            .insert(key.to_string(), (expiry_seconds, bytes.to_vec()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.write().expect("RwLock poisoned").remove(key);
        Ok(())
    }
}
