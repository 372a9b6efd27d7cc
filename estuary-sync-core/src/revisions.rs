//! Encoded revision history: the `{start, ids}` wire form
//!
//! A history path is sent on the wire as the generation of its newest
//! revision plus a list of bare digests, newest first, each entry exactly
//! one generation older than the previous. The shape is fixed by CouchDB
//! compatibility and appears both in REST responses (`_revisions`) and in
//! replication messages.

use crate::body::{Body, BODY_REV, BODY_REVISIONS};
use crate::error::{Error, Result};
use crate::revid::parse_rev_id;
use serde::{Deserialize, Serialize};

/// The `_revisions` property of a document: `start` is the generation of
/// `ids[0]`, and each following digest is one generation older.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revisions {
    pub start: i64,
    pub ids: Vec<String>,
}

impl Revisions {
    /// Expand into full revision ids, newest first.
    ///
    /// Returns `None` when the list is empty or would descend below
    /// generation 1 (`start` too small for the number of ids).
    pub fn rev_ids(&self) -> Option<Vec<String>> {
        if self.ids.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(self.ids.len());
        let mut generation = self.start;
        for digest in &self.ids {
            if generation < 1 || digest.is_empty() {
                return None;
            }
            out.push(format!("{}-{}", generation, digest));
            generation -= 1;
        }
        Some(out)
    }

    /// The most recent entry of this list that appears in `ancestors`.
    pub fn find_ancestor(&self, ancestors: &[String]) -> Option<String> {
        let mut generation = self.start;
        for digest in &self.ids {
            let rev_id = format!("{}-{}", generation, digest);
            if ancestors.iter().any(|a| *a == rev_id) {
                return Some(rev_id);
            }
            generation -= 1;
        }
        None
    }

    /// Normalize this list for sending to a peer that already knows some
    /// of our history.
    ///
    /// If any of `ancestors` appears in the expanded list, the list is cut
    /// just past the first (most recent) match, so the common ancestor is
    /// included exactly once. `max_length` then caps the result (0 means
    /// uncapped). Returns true whenever the input was well formed; the
    /// caller reads it as "a trimmed form is available", not "content
    /// changed". Returns false, leaving the list untouched, when `start`
    /// cannot cover `ids`.
    pub fn trim_to_ancestor(&mut self, ancestors: &[String], max_length: usize) -> bool {
        if self.start < self.ids.len() as i64 {
            return false;
        }
        let mut match_index: Option<usize> = None;
        for ancestor in ancestors {
            let (generation, digest) = parse_rev_id(ancestor);
            if generation < 1 {
                continue;
            }
            let index = self.start - generation;
            if index < 0 {
                continue;
            }
            let index = index as usize;
            if index < self.ids.len()
                && self.ids[index] == digest
                && match_index.map_or(true, |m| index < m)
            {
                match_index = Some(index);
            }
        }
        let mut keep = match match_index {
            Some(index) => index + 1,
            None => self.ids.len(),
        };
        if max_length > 0 {
            keep = keep.min(max_length);
        }
        self.ids.truncate(keep);
        true
    }
}

/// Encode a newest-to-oldest history path into the wire form.
///
/// Refuses when the path is empty, contains a malformed id, or has a
/// generation gap; callers must supply a clean contiguous path.
pub fn encode_revisions(rev_ids: &[String]) -> Result<Revisions> {
    if rev_ids.is_empty() {
        return Err(Error::invalid_revisions("empty revision history"));
    }
    let mut start = 0i64;
    let mut ids = Vec::with_capacity(rev_ids.len());
    for (i, rev_id) in rev_ids.iter().enumerate() {
        let (generation, digest) = parse_rev_id(rev_id);
        if generation < 1 {
            return Err(Error::invalid_revisions(format!(
                "unparseable revision id {:?} in history",
                rev_id
            )));
        }
        if i == 0 {
            start = generation;
        } else if generation != start - i as i64 {
            return Err(Error::invalid_revisions(format!(
                "generation gap at {} in history (expected {})",
                rev_id,
                start - i as i64
            )));
        }
        ids.push(digest);
    }
    Ok(Revisions { start, ids })
}

/// Read the revision history from a document body on ingest.
///
/// Prefers a well-formed `_revisions` property and falls back to the bare
/// `_rev`. Every malformed shape yields `None`; the ingest path treats
/// that as a client error.
pub fn parse_revisions(body: &Body) -> Option<Vec<String>> {
    match body.get(BODY_REVISIONS) {
        Some(raw) => {
            let revisions: Revisions = serde_json::from_value(raw.clone()).ok()?;
            revisions.rev_ids()
        }
        None => {
            let rev = body.get(BODY_REV)?.as_str()?;
            let (generation, _) = parse_rev_id(rev);
            if generation < 1 {
                return None;
            }
            Some(vec![rev.to_string()])
        }
    }
}
