//! Revision tree
//!
//! The per-document history of every known revision: parent/child edges,
//! conflict branches, and tombstones. Nodes live in a flat map keyed by
//! revision id with string-valued parent edges, so the structure is a
//! forest: pruning can detach subtrees, whose surviving roots simply
//! have no parent.
//!
//! A tree is an in-memory value. It is not safe for concurrent mutation;
//! the replicator serializes writers per document and may share immutable
//! snapshots freely.

mod dot;
mod prune;
mod serialization;

use crate::error::{Error, Result};
use crate::revid::compare_rev_ids;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Routing labels attached to a revision. Sorted so serialized trees are
/// deterministic.
pub type ChannelSet = BTreeSet<String>;

/// One node of a revision tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevInfo {
    /// Revision id; unique within a tree.
    pub id: String,
    /// Parent revision id; `None` for a root.
    pub parent: Option<String>,
    /// Tombstone flag.
    pub deleted: bool,
    /// Whether the revision body carries attachments.
    pub has_attachments: bool,
    /// Channels the revision was assigned to.
    pub channels: ChannelSet,
    /// Raw JSON body, if still inlined in the tree.
    pub body: Option<Vec<u8>>,
}

/// Outcome of [`RevTree::winning_revision`].
///
/// `winner` is the leaf every peer independently agrees on; `branched`
/// means more than one leaf exists; `conflict` means more than one
/// non-deleted leaf exists. Tombstoning a branch resolves the conflict
/// while leaving the tree branched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerInfo {
    pub winner: Option<String>,
    pub branched: bool,
    pub conflict: bool,
}

/// A document's revision tree: a map from revision id to [`RevInfo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevTree {
    pub(crate) revs: HashMap<String, RevInfo>,
}

impl RevTree {
    /// Create an empty tree (a document that has no revisions yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of revisions in the tree.
    pub fn len(&self) -> usize {
        self.revs.len()
    }

    /// True when the tree holds no revisions.
    pub fn is_empty(&self) -> bool {
        self.revs.is_empty()
    }

    /// True iff the tree contains the given revision id.
    pub fn contains(&self, rev_id: &str) -> bool {
        self.revs.contains_key(rev_id)
    }

    /// The parent id of a revision, or `None` for roots and unknown ids.
    pub fn get_parent(&self, rev_id: &str) -> Option<&str> {
        self.revs.get(rev_id).and_then(|info| info.parent.as_deref())
    }

    /// Look up a revision.
    pub fn get_info(&self, rev_id: &str) -> Result<&RevInfo> {
        self.revs
            .get(rev_id)
            .ok_or_else(|| Error::not_found(format!("revision {} not in tree", rev_id)))
    }

    /// Mutable lookup, for callers that own the tree exclusively.
    pub fn get_info_mut(&mut self, rev_id: &str) -> Result<&mut RevInfo> {
        self.revs
            .get_mut(rev_id)
            .ok_or_else(|| Error::not_found(format!("revision {} not in tree", rev_id)))
    }

    /// Iterate over all revisions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &RevInfo> {
        self.revs.values()
    }

    /// True iff the id names a revision with no children. Unknown ids are
    /// not leaves.
    pub fn is_leaf(&self, rev_id: &str) -> bool {
        self.contains(rev_id)
            && self
                .revs
                .values()
                .all(|info| info.parent.as_deref() != Some(rev_id))
    }

    /// All revisions with no children, in unspecified order.
    pub fn get_leaves(&self) -> Vec<String> {
        self.leaves_filtered(|_| true)
    }

    /// Leaves accepted by the filter, in unspecified order.
    pub fn leaves_filtered(&self, filter: impl Fn(&str) -> bool) -> Vec<String> {
        let parents: HashSet<&str> = self
            .revs
            .values()
            .filter_map(|info| info.parent.as_deref())
            .collect();
        self.revs
            .keys()
            .filter(|id| !parents.contains(id.as_str()) && filter(id))
            .cloned()
            .collect()
    }

    /// Invoke the callback once per leaf.
    pub fn for_each_leaf(&self, mut f: impl FnMut(&RevInfo)) {
        let parents: HashSet<&str> = self
            .revs
            .values()
            .filter_map(|info| info.parent.as_deref())
            .collect();
        for (id, info) in &self.revs {
            if !parents.contains(id.as_str()) {
                f(info);
            }
        }
    }

    /// The history of a revision: the id itself followed by each ancestor
    /// down to the reachable root.
    ///
    /// Unknown ids produce an empty history; a missing parent (pruned
    /// away) ends the walk without error.
    pub fn get_history(&self, rev_id: &str) -> Vec<String> {
        let mut history = Vec::new();
        let mut current = rev_id;
        while let Some(info) = self.revs.get(current) {
            history.push(info.id.clone());
            match info.parent.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        history
    }

    /// Insert a new revision.
    ///
    /// The id must be new to the tree and the parent, when given, must
    /// already be present. Violations are programmer errors on the caller
    /// side; the tree is left untouched.
    pub fn add_revision(&mut self, info: RevInfo) -> Result<()> {
        if info.id.is_empty() {
            return Err(Error::invalid_rev_tree("revision id must not be empty"));
        }
        if self.contains(&info.id) {
            return Err(Error::invalid_rev_tree(format!(
                "tree already contains revision {}",
                info.id
            )));
        }
        match info.parent.as_deref() {
            Some("") => {
                return Err(Error::invalid_rev_tree(format!(
                    "revision {} has an empty parent id; use None for roots",
                    info.id
                )));
            }
            Some(parent) if !self.contains(parent) => {
                return Err(Error::invalid_rev_tree(format!(
                    "parent {} of revision {} not in tree",
                    parent, info.id
                )));
            }
            _ => {}
        }
        self.revs.insert(info.id.clone(), info);
        Ok(())
    }

    /// Deterministically select the current (winning) revision.
    ///
    /// Non-deleted leaves rank strictly above deleted ones; within the
    /// same class the higher (generation, digest) wins. The rule is a pure
    /// function of tree content so uncoordinated peers agree.
    pub fn winning_revision(&self) -> WinnerInfo {
        let mut winner = String::new();
        let mut winner_exists = false;
        let mut leaf_count = 0usize;
        let mut active_leaf_count = 0usize;
        self.for_each_leaf(|info| {
            let exists = !info.deleted;
            leaf_count += 1;
            if exists {
                active_leaf_count += 1;
            }
            if (exists && !winner_exists)
                || (exists == winner_exists
                    && compare_rev_ids(&info.id, &winner) == Ordering::Greater)
            {
                winner = info.id.clone();
                winner_exists = exists;
            }
        });
        WinnerInfo {
            winner: (!winner.is_empty()).then_some(winner),
            branched: leaf_count > 1,
            conflict: active_leaf_count > 1,
        }
    }

    /// Find the first of the given revision ids that exists in the tree,
    /// trying newer generations first.
    pub fn find_ancestor<'a>(&self, rev_ids: &'a [String]) -> Option<&'a str> {
        let mut candidates: Vec<&str> = rev_ids.iter().map(String::as_str).collect();
        candidates.sort_by(|a, b| compare_rev_ids(b, a));
        candidates.into_iter().find(|id| self.contains(id))
    }
}

impl FromIterator<RevInfo> for RevTree {
    /// Build a tree from nodes without linkage checks; intended for tests
    /// and decoding, where parents may arrive in any order.
    fn from_iter<I: IntoIterator<Item = RevInfo>>(iter: I) -> Self {
        RevTree {
            revs: iter
                .into_iter()
                .map(|info| (info.id.clone(), info))
                .collect(),
        }
    }
}
