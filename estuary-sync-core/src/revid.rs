//! Revision identifier codec
//!
//! A revision id is `"<generation>-<digest>"`: a positive decimal
//! generation, a dash, and an opaque digest token (conventionally 32 hex
//! characters of MD5). The empty string means "no revision". Parsing is
//! deliberately forgiving: malformed ids from the wire are logged and
//! mapped to a sentinel rather than failing the surrounding operation.
//!
//! The fingerprint in [`create_rev_id`] must produce the same results as
//! TouchDB: an MD5 over the parent id (length-prefixed) and the canonical
//! encoding of the body with reserved keys stripped.

use crate::body::{strip_special_properties, Body};
use md5::{Digest, Md5};
use std::cmp::Ordering;

/// Split a revision id into generation and digest.
///
/// Returns `(0, "")` for the empty id and the `(-1, "")` sentinel for
/// anything that does not parse; the failure is logged but never fatal.
pub fn parse_rev_id(rev_id: &str) -> (i64, String) {
    if rev_id.is_empty() {
        return (0, String::new());
    }
    if let Some((gen_part, digest)) = rev_id.split_once('-') {
        if let Ok(generation) = gen_part.parse::<i64>() {
            if generation >= 1 && !digest.is_empty() {
                return (generation, digest.to_string());
            }
        }
    }
    tracing::warn!(rev_id = %rev_id, "unable to parse revision id");
    (-1, String::new())
}

/// The generation number (numeric prefix) of a revision id.
///
/// Returns 0 for the empty id and -1 for malformed input.
pub fn gen_of_rev_id(rev_id: &str) -> i64 {
    if rev_id.is_empty() {
        return 0;
    }
    let (generation, _) = parse_rev_id(rev_id);
    generation
}

/// Total order on revision ids: by generation, then by digest
/// (lexicographic). This order is the conflict tie-break, so it must be
/// identical on every peer.
pub fn compare_rev_ids(id1: &str, id2: &str) -> Ordering {
    let (gen1, digest1) = parse_rev_id(id1);
    let (gen2, digest2) = parse_rev_id(id2);
    (gen1, digest1).cmp(&(gen2, digest2))
}

/// Deterministic JSON encoding used as fingerprint input.
///
/// `Body` maps iterate in key-sorted order at every level, so the output
/// is canonical; arrays keep their order and numbers serialize in their
/// narrowest exact form.
pub fn canonical_encoding(body: &Body) -> Vec<u8> {
    serde_json::to_vec(body).expect("JSON object with string keys always encodes")
}

/// Build the revision id for a new revision.
///
/// The digest covers `len(parent) byte || parent bytes ||
/// canonical(strip_special(body))`, matching TouchDB.
pub fn create_rev_id(generation: i64, parent_rev_id: &str, body: &Body) -> String {
    let mut digester = Md5::new();
    digester.update([parent_rev_id.len() as u8]);
    digester.update(parent_rev_id.as_bytes());
    digester.update(canonical_encoding(&strip_special_properties(body)));
    format!("{}-{}", generation, hex::encode(digester.finalize()))
}
