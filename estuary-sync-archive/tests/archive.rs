//! Archive integration tests
//!
//! Runs the archive against bodies produced by the core crate, the way
//! the replicator does when a revision loses its inlined body.

use estuary_sync_archive::{ArchiveOptions, Bucket, MemoryBucket, OldRevisionStore};
use estuary_sync_core::revtree::{RevInfo, RevTree};

fn tree_with_bodies() -> RevTree {
    [
        RevInfo {
            id: "1-one".to_string(),
            body: Some(br#"{"state":"old"}"#.to_vec()),
            ..Default::default()
        },
        RevInfo {
            id: "2-two".to_string(),
            parent: Some("1-one".to_string()),
            body: Some(br#"{"state":"new"}"#.to_vec()),
            ..Default::default()
        },
    ]
    .into_iter()
    .collect()
}

#[tokio::test]
async fn test_archive_replaced_revision_body() {
    let mut tree = tree_with_bodies();
    let bucket = MemoryBucket::new();
    let store = OldRevisionStore::new(bucket.clone());

    // The winner's parent is being replaced: detach its body into the
    // archive, then drop it from the tree.
    let winner = tree.winning_revision().winner.unwrap();
    let parent = tree.get_parent(&winner).unwrap().to_string();
    let body = tree.get_info(&parent).unwrap().body.clone().unwrap();
    store
        .set_old_revision_json("doc1", &parent, &body)
        .await
        .unwrap();
    tree.get_info_mut(&parent).unwrap().body = None;

    // The tree no longer has the body, but the archive serves it intact.
    assert!(tree.get_info(&parent).unwrap().body.is_none());
    let archived = store.get_old_revision_json("doc1", &parent).await.unwrap();
    assert_eq!(archived, br#"{"state":"old"}"#);

    // The stored value is sentinel-prefixed so query engines skip it.
    let raw = bucket.get_raw("_sync:rev:doc1:5:1-one").await.unwrap();
    assert_eq!(raw[0], 0x01);
}

#[tokio::test]
async fn test_archive_miss_after_expiry_configured_purge() {
    let store = OldRevisionStore::with_options(
        MemoryBucket::new(),
        ArchiveOptions {
            old_rev_expiry_seconds: 30,
        },
    );
    store
        .set_old_revision_json("doc1", "3-abc", b"{}")
        .await
        .unwrap();
    store.purge_old_revision_json("doc1", "3-abc").await.unwrap();
    let err = store
        .get_old_revision_json("doc1", "3-abc")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
