//! # Estuary Sync Archive
//!
//! Detached revision-body archive for the Estuary Sync server.
//!
//! When compaction or replication drops a body from a document's revision
//! tree, this crate parks the raw JSON in the host's key-value bucket
//! under a compaction-eligible key with a short TTL, so peers replicating
//! slightly behind the head can still fetch it.
//!
//! The bucket itself is injected by the host; see [`bucket::Bucket`].

pub mod bucket;
pub mod error;
pub mod store;

// Re-export main types
pub use bucket::{Bucket, MemoryBucket};
pub use error::{ArchiveError, Result};
pub use store::{ArchiveOptions, OldRevisionStore};
