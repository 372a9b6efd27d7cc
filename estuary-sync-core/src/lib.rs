//! # Estuary Sync Core
//!
//! Revision-tree core for the Estuary Sync multi-master document
//! synchronization server.
//!
//! This crate provides:
//! - Revision id parsing, ordering, and fingerprinting (`revid`)
//! - Document body utilities for the reserved underscore namespace (`body`)
//! - The per-document revision tree: insertion, leaves, winner selection,
//!   history, and depth-bounded pruning (`revtree`)
//! - The parallel-array on-disk form of a tree, including the legacy
//!   dense-bodies variant (`revtree`, via serde)
//! - The `{start, ids}` encoded history used on the wire (`revisions`)
//!
//! ## Design Principles
//!
//! 1. **Value semantics**: a tree is plain data; no threads, files, or
//!    sockets. Callers serialize mutation per document.
//! 2. **Deterministic conflict resolution**: winner selection is a pure
//!    function of tree content, so peers agree without coordination.
//! 3. **Forgiving at the wire, strict inside**: malformed revision ids
//!    from peers degrade to sentinels; structural corruption detected
//!    internally is refused outright.

pub mod body;
pub mod error;
pub mod revid;
pub mod revisions;
pub mod revtree;

// Re-export main types
pub use body::{
    contains_user_special_properties, extract_expiry, fix_body_numbers, fix_json_numbers,
    get_string_array_property, parse_body, reflect_expiry, shallow_copy,
    strip_special_properties, Body, BODY_ATTACHMENTS, BODY_DELETED, BODY_EXPIRY, BODY_ID,
    BODY_REV, BODY_REVISIONS,
};
pub use error::{Error, Result};
pub use revid::{
    canonical_encoding, compare_rev_ids, create_rev_id, gen_of_rev_id, parse_rev_id,
};
pub use revisions::{encode_revisions, parse_revisions, Revisions};
pub use revtree::{ChannelSet, RevInfo, RevTree, WinnerInfo};
