//! Depth-bounded pruning of revision history
//!
//! Pruning garbage-collects interior nodes while keeping every branch
//! usable for replication: each leaf retains a window of at most
//! `max_depth` ancestors (counting the leaf itself), leaves themselves are
//! never removed, and a caller-supplied keep revision extends the window
//! to cover its own chain.
//!
//! Depth is measured per branch against the nearest *non-deleted*
//! descendant leaf. Nodes whose descendants are all tombstoned fall back
//! to the nearest tombstoned leaf, so a fully tombstoned branch preserves
//! itself without holding back pruning above the merge point.

use super::RevTree;
use std::collections::HashMap;

impl RevTree {
    /// Prune history deeper than `max_depth`, returning how many nodes
    /// were removed. Children of pruned nodes become roots of the
    /// resulting forest.
    pub fn prune_revisions(&mut self, max_depth: u32, keep_rev: Option<&str>) -> usize {
        if max_depth == 0 || self.len() <= max_depth as usize {
            return 0;
        }

        let leaves = self.get_leaves();
        let mut live_depth: HashMap<String, u32> = HashMap::new();
        let mut tombstone_depth: HashMap<String, u32> = HashMap::new();
        for leaf in &leaves {
            let deleted = self
                .revs
                .get(leaf)
                .map(|info| info.deleted)
                .unwrap_or(false);
            let depths = if deleted {
                &mut tombstone_depth
            } else {
                &mut live_depth
            };
            self.record_chain_depths(leaf, depths);
        }

        // The keep revision and its ancestors count as a virtual leaf.
        let mut keep_depth: HashMap<String, u32> = HashMap::new();
        if let Some(keep) = keep_rev {
            if self.contains(keep) {
                self.record_chain_depths(keep, &mut keep_depth);
            }
        }

        let mut pruned = 0;
        let prunable: Vec<String> = self
            .revs
            .keys()
            .filter(|id| {
                let mut depth = live_depth
                    .get(*id)
                    .or_else(|| tombstone_depth.get(*id))
                    .copied()
                    .unwrap_or(u32::MAX);
                if let Some(keep) = keep_depth.get(*id) {
                    depth = depth.min(*keep);
                }
                // depth 0 marks a leaf (or the keep revision); never pruned
                depth > 0 && depth >= max_depth
            })
            .cloned()
            .collect();
        for id in prunable {
            self.revs.remove(&id);
            pruned += 1;
        }

        // Snip dangling parent links so surviving children become roots.
        if pruned > 0 {
            let orphans: Vec<String> = self
                .revs
                .values()
                .filter(|info| {
                    info.parent
                        .as_deref()
                        .is_some_and(|parent| !self.revs.contains_key(parent))
                })
                .map(|info| info.id.clone())
                .collect();
            for id in orphans {
                if let Some(info) = self.revs.get_mut(&id) {
                    info.parent = None;
                }
            }
        }
        pruned
    }

    /// Walk from `start` to its reachable root, recording the minimum hop
    /// distance seen for each node. Stops early once an ancestor already
    /// has an equal or smaller distance, since everything above it does
    /// too.
    fn record_chain_depths(&self, start: &str, depths: &mut HashMap<String, u32>) {
        let mut current = start;
        let mut distance = 0u32;
        while let Some(info) = self.revs.get(current) {
            match depths.get(&info.id) {
                Some(existing) if *existing <= distance => break,
                _ => {
                    depths.insert(info.id.clone(), distance);
                }
            }
            match info.parent.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
            distance += 1;
        }
    }
}
