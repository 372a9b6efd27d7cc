//! Archived revision bodies
//!
//! When a revision body is no longer inlined in the tree, replication
//! still needs it for a while (peers may ask for a recently replaced
//! revision). Bodies are parked in the bucket under dedicated keys with a
//! short expiry so compaction reclaims them.
//!
//! Stored values carry a leading non-JSON byte. The host bucket is
//! exposed to a secondary query engine that indexes JSON documents; the
//! sentinel makes it skip these records.

use crate::bucket::Bucket;
use crate::error::{ArchiveError, Result};

/// First byte of every archived value; not valid JSON.
const NON_JSON_PREFIX: u8 = 0x01;

/// Bucket key for an archived revision body.
///
/// The revision id length is part of the key so ids containing `:` cannot
/// collide with other documents' keys.
fn old_revision_key(doc_id: &str, rev_id: &str) -> String {
    format!("_sync:rev:{}:{}:{}", doc_id, rev_id.len(), rev_id)
}

/// Archive configuration.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Time-to-live for archived bodies, in seconds.
    pub old_rev_expiry_seconds: u32,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            // Five minutes: long enough for in-flight replications to
            // fetch the replaced body.
            old_rev_expiry_seconds: 300,
        }
    }
}

/// The archive store for detached revision bodies.
#[derive(Debug)]
pub struct OldRevisionStore<B> {
    bucket: B,
    options: ArchiveOptions,
}

impl<B: Bucket> OldRevisionStore<B> {
    /// Create a store over the given bucket with default options.
    pub fn new(bucket: B) -> Self {
        Self::with_options(bucket, ArchiveOptions::default())
    }

    /// Create a store with explicit options.
    pub fn with_options(bucket: B, options: ArchiveOptions) -> Self {
        Self { bucket, options }
    }

    /// Fetch the archived JSON body of a revision.
    ///
    /// Returns `NotFound` when the body was never archived or has already
    /// expired; REST callers translate that to 404 "missing".
    pub async fn get_old_revision_json(&self, doc_id: &str, rev_id: &str) -> Result<Vec<u8>> {
        let key = old_revision_key(doc_id, rev_id);
        let mut data = match self.bucket.get_raw(&key).await {
            Ok(data) => data,
            Err(err) if err.is_not_found() => {
                tracing::debug!(doc_id = %doc_id, rev_id = %rev_id, "no archived revision");
                return Err(ArchiveError::not_found("missing"));
            }
            Err(err) => return Err(err),
        };
        if data.first() == Some(&NON_JSON_PREFIX) {
            data.remove(0);
        }
        tracing::debug!(
            doc_id = %doc_id,
            rev_id = %rev_id,
            bytes = data.len(),
            "got archived revision"
        );
        Ok(data)
    }

    /// Archive a revision body, prefixed with the non-JSON sentinel and
    /// expiring per the configured TTL.
    pub async fn set_old_revision_json(
        &self,
        doc_id: &str,
        rev_id: &str,
        body: &[u8],
    ) -> Result<()> {
        tracing::debug!(
            doc_id = %doc_id,
            rev_id = %rev_id,
            bytes = body.len(),
            "archiving revision body"
        );
        let mut data = Vec::with_capacity(body.len() + 1);
        data.push(NON_JSON_PREFIX);
        data.extend_from_slice(body);
        self.bucket
            .set_raw(
                &old_revision_key(doc_id, rev_id),
                self.options.old_rev_expiry_seconds,
                &data,
            )
            .await
    }

    /// Unconditionally delete an archived body. Used by tests.
    pub async fn purge_old_revision_json(&self, doc_id: &str, rev_id: &str) -> Result<()> {
        tracing::debug!(doc_id = %doc_id, rev_id = %rev_id, "purging archived revision");
        self.bucket.delete(&old_revision_key(doc_id, rev_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::MemoryBucket;

    /// A bucket whose operations always fail, as a flaky host store would.
    #[derive(Debug)]
    struct BrokenBucket;

    #[async_trait::async_trait]
    impl Bucket for BrokenBucket {
        async fn get_raw(&self, _key: &str) -> Result<Vec<u8>> {
            Err(ArchiveError::bucket("connection reset"))
        }

        async fn set_raw(&self, _key: &str, _expiry_seconds: u32, _bytes: &[u8]) -> Result<()> {
            Err(ArchiveError::bucket("connection reset"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(ArchiveError::bucket("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_bucket_failures_propagate() {
        let store = OldRevisionStore::new(BrokenBucket);

        // A real bucket failure is not a miss and must not become one.
        let err = store
            .get_old_revision_json("doc1", "1-aa")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Bucket(_)));
        assert!(!err.is_not_found());

        let err = store
            .set_old_revision_json("doc1", "1-aa", b"{}")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Bucket(_)));

        let err = store
            .purge_old_revision_json("doc1", "1-aa")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Bucket(_)));
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let bucket = MemoryBucket::new();
        let store = OldRevisionStore::new(bucket.clone());

        store
            .set_old_revision_json("doc1", "2-cafe", br#"{"k":1}"#)
            .await
            .unwrap();
        let body = store.get_old_revision_json("doc1", "2-cafe").await.unwrap();
        assert_eq!(body, br#"{"k":1}"#);

        // The raw stored value carries the sentinel and the default TTL.
        let raw = bucket.get_raw("_sync:rev:doc1:6:2-cafe").await.unwrap();
        assert_eq!(raw[0], 0x01);
        assert_eq!(&raw[1..], br#"{"k":1}"#);
        assert_eq!(bucket.expiry_of("_sync:rev:doc1:6:2-cafe"), Some(300));
    }

    #[tokio::test]
    async fn test_get_missing_revision() {
        let store = OldRevisionStore::new(MemoryBucket::new());
        let err = store
            .get_old_revision_json("doc1", "1-beef")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_purge() {
        let store = OldRevisionStore::new(MemoryBucket::new());
        store
            .set_old_revision_json("doc1", "1-beef", b"{}")
            .await
            .unwrap();
        store.purge_old_revision_json("doc1", "1-beef").await.unwrap();
        let err = store
            .get_old_revision_json("doc1", "1-beef")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // Purging again is fine.
        store.purge_old_revision_json("doc1", "1-beef").await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_expiry() {
        let bucket = MemoryBucket::new();
        let store = OldRevisionStore::with_options(
            bucket.clone(),
            ArchiveOptions {
                old_rev_expiry_seconds: 60,
            },
        );
        store
            .set_old_revision_json("doc2", "1-aa", b"{}")
            .await
            .unwrap();
        assert_eq!(bucket.expiry_of("_sync:rev:doc2:4:1-aa"), Some(60));
    }
}
