//! Revision-tree integration tests
//!
//! Exercises the tree engine end to end on larger generated histories:
//! branch construction, winner selection, pruning windows, and the
//! round trip through the persisted form.

use estuary_sync_core::revisions::encode_revisions;
use estuary_sync_core::revtree::{RevInfo, RevTree};

struct BranchSpec {
    num_revs: usize,
    digest: &'static str,
    tombstone: bool,
}

fn rev_id(generation: usize, digest: &str) -> String {
    format!("{}-{}", generation, digest)
}

fn add_chain(tree: &mut RevTree, start_parent: &str, start_gen: usize, num_revs: usize, digest: &str) {
    let mut parent = if start_parent.is_empty() {
        None
    } else {
        Some(start_parent.to_string())
    };
    for offset in 0..num_revs {
        let id = rev_id(start_gen + offset, digest);
        tree.add_revision(RevInfo {
            id: id.clone(),
            parent: parent.clone(),
            body: Some(br#"{"k":"v"}"#.to_vec()),
            channels: ["ABC", "CBS"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
        .expect("chain revision inserts cleanly");
        parent = Some(id);
    }
}

//              / 4-trunk ... (winning branch)
// 1-trunk ... 3-trunk
//              \ 4-beta ...  (losing branches, optionally tombstoned)
fn build_multi_branch(trunk_revs: usize, winning_revs: usize, losing: &[BranchSpec]) -> RevTree {
    assert!(trunk_revs >= 1, "trunk must have at least one revision");
    let mut tree = RevTree::new();
    add_chain(&mut tree, "", 1, trunk_revs, "trunk");
    let fork = rev_id(trunk_revs, "trunk");

    add_chain(&mut tree, &fork, trunk_revs + 1, winning_revs, "trunk");

    for spec in losing {
        add_chain(&mut tree, &fork, trunk_revs + 1, spec.num_revs, spec.digest);
        if spec.tombstone {
            let last_gen = trunk_revs + spec.num_revs;
            tree.add_revision(RevInfo {
                id: rev_id(last_gen + 1, spec.digest),
                parent: Some(rev_id(last_gen, spec.digest)),
                deleted: true,
                ..Default::default()
            })
            .expect("tombstone inserts cleanly");
        }
    }
    tree
}

#[test]
fn test_multi_branch_builder_leaves() {
    let tree = build_multi_branch(
        50,
        100,
        &[
            BranchSpec {
                num_revs: 60,
                digest: "left",
                tombstone: false,
            },
            BranchSpec {
                num_revs: 25,
                digest: "right",
                tombstone: true,
            },
        ],
    );
    let mut leaves = tree.get_leaves();
    leaves.sort();
    assert_eq!(leaves, vec!["110-left", "150-trunk", "76-right"]);
}

#[test]
fn test_winner_on_branched_tree() {
    let tree = build_multi_branch(
        3,
        7,
        &[BranchSpec {
            num_revs: 7,
            digest: "beta",
            tombstone: false,
        }],
    );
    // Both leaves sit at generation 10; "trunk" > "beta" lexicographically.
    let w = tree.winning_revision();
    assert_eq!(w.winner.as_deref(), Some("10-trunk"));
    assert!(w.branched);
    assert!(w.conflict);
}

#[test]
fn test_tombstone_resolves_conflict_but_stays_branched() {
    let tree = build_multi_branch(
        3,
        2,
        &[BranchSpec {
            num_revs: 4,
            digest: "beta",
            tombstone: true,
        }],
    );
    // The losing branch is longer but ends in a tombstone, so the shorter
    // live branch wins and the conflict is resolved.
    let w = tree.winning_revision();
    assert_eq!(w.winner.as_deref(), Some("5-trunk"));
    assert!(w.branched);
    assert!(!w.conflict);
}

#[test]
fn test_new_leaf_dethrones_winner() {
    let mut tree = build_multi_branch(2, 2, &[]);
    assert_eq!(
        tree.winning_revision().winner.as_deref(),
        Some("4-trunk")
    );
    tree.add_revision(RevInfo {
        id: "5-usurper".to_string(),
        parent: Some("4-trunk".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        tree.winning_revision().winner.as_deref(),
        Some("5-usurper")
    );
}

#[test]
fn test_pruning_two_branch_tree() {
    // Trunk of 3, live branch to generation 103, tombstoned branch to 94.
    let mut tree = build_multi_branch(
        3,
        100,
        &[BranchSpec {
            num_revs: 90,
            digest: "beta",
            tombstone: true,
        }],
    );
    assert_eq!(tree.len(), 103 + 91);

    let pruned = tree.prune_revisions(20, None);
    assert_eq!(pruned, 154);
    assert_eq!(tree.len(), 40);

    // Leaves survive and each branch keeps a window of exactly 20.
    let mut leaves = tree.get_leaves();
    leaves.sort();
    assert_eq!(leaves, vec!["103-trunk", "94-beta"]);
    assert_eq!(tree.get_history("103-trunk").len(), 20);
    assert_eq!(tree.get_history("94-beta").len(), 20);
    assert_eq!(tree.get_parent("84-trunk"), None);
    assert_eq!(tree.get_parent("75-beta"), None);

    // Pruning again at the same depth is a no-op.
    assert_eq!(tree.prune_revisions(20, None), 0);
}

#[test]
fn test_pruning_preserves_winner() {
    let mut tree = build_multi_branch(
        10,
        50,
        &[BranchSpec {
            num_revs: 30,
            digest: "beta",
            tombstone: false,
        }],
    );
    let before = tree.winning_revision();
    tree.prune_revisions(15, None);
    assert_eq!(tree.winning_revision(), before);
}

#[test]
fn test_round_trip_large_tree() {
    let tree = build_multi_branch(
        20,
        40,
        &[
            BranchSpec {
                num_revs: 10,
                digest: "beta",
                tombstone: true,
            },
            BranchSpec {
                num_revs: 5,
                digest: "gamma",
                tombstone: false,
            },
        ],
    );
    let encoded = serde_json::to_string(&tree).unwrap();
    let decoded: RevTree = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, tree);

    // The persisted form stays in the modern shape.
    let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
    assert!(value.get("bodies").is_none());
    assert!(value.get("bodymap").is_some());
}

#[test]
fn test_history_feeds_encoded_revisions() {
    let tree = build_multi_branch(5, 0, &[]);
    let history = tree.get_history("5-trunk");
    assert_eq!(history.len(), 5);

    let mut encoded = encode_revisions(&history).unwrap();
    assert_eq!(encoded.start, 5);
    assert_eq!(encoded.ids.len(), 5);

    // A peer that already has generation 3 needs only the newest three.
    assert!(encoded.trim_to_ancestor(&[rev_id(3, "trunk")], 1000));
    assert_eq!(encoded.ids.len(), 3);
    assert_eq!(
        encoded.rev_ids().unwrap(),
        vec!["5-trunk", "4-trunk", "3-trunk"]
    );
}
