//! Graphviz rendering for operator diagnostics
//!
//! Not on any hot path; output is meant for `dot -Tpng` when debugging a
//! misbehaving document's history.

use super::RevTree;
use crate::revid::compare_rev_ids;
use std::fmt::Write as _;

impl RevTree {
    /// Render the tree as a Graphviz DOT digraph. Tombstones are marked
    /// in red, edges point from parent to child, and nodes are emitted in
    /// generation order so repeated renders diff cleanly.
    pub fn render_graphviz_dot(&self) -> String {
        let mut infos: Vec<_> = self.revs.values().collect();
        infos.sort_by(|a, b| compare_rev_ids(&a.id, &b.id));

        let mut out = String::from("digraph revtree {\n");
        for info in infos {
            if info.deleted {
                let _ = writeln!(out, "  \"{}\" [fontcolor=red];", info.id);
            }
            match info.parent.as_deref() {
                Some(parent) if info.deleted => {
                    let _ = writeln!(
                        out,
                        "  \"{}\" -> \"{}\" [label=\"tombstone\"];",
                        parent, info.id
                    );
                }
                Some(parent) => {
                    let _ = writeln!(out, "  \"{}\" -> \"{}\";", parent, info.id);
                }
                None => {
                    let _ = writeln!(out, "  \"{}\";", info.id);
                }
            }
        }
        out.push('}');
        out
    }
}
