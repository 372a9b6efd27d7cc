//! Document body utilities
//!
//! A document body is free-form JSON with a reserved namespace of
//! leading-underscore keys at the top level. This module owns that
//! namespace: parsing, classification and stripping of reserved keys,
//! numeric narrowing, and expiry extraction.
//!
//! `Body` is backed by `serde_json::Map`, whose keys iterate in sorted
//! order; the canonical encoding used for revision fingerprints relies on
//! that ordering.

use crate::error::{Error, Result};
use serde_json::Value;

/// The body of a document revision as decoded from JSON.
pub type Body = serde_json::Map<String, Value>;

/// Reserved key: document id.
pub const BODY_ID: &str = "_id";
/// Reserved key: current revision id.
pub const BODY_REV: &str = "_rev";
/// Reserved key: tombstone marker.
pub const BODY_DELETED: &str = "_deleted";
/// Reserved key: attachment metadata.
pub const BODY_ATTACHMENTS: &str = "_attachments";
/// Reserved key: encoded revision history.
pub const BODY_REVISIONS: &str = "_revisions";
/// Reserved key: expiry.
pub const BODY_EXPIRY: &str = "_exp";

/// Parse raw JSON bytes into a `Body`.
///
/// Empty input is rejected outright rather than surfaced as a generic
/// JSON syntax error.
pub fn parse_body(data: &[u8]) -> Result<Body> {
    if data.is_empty() {
        return Err(Error::bad_property("unexpected empty JSON input to body"));
    }
    Ok(serde_json::from_slice(data)?)
}

/// One-level copy of a body.
///
/// `Body` is a value type in Rust, so this is a plain clone; it exists to
/// mark call sites that copy before mutating reserved keys.
pub fn shallow_copy(body: &Body) -> Body {
    body.clone()
}

/// Remove every top-level underscore-prefixed key except `_attachments`
/// and `_deleted`.
///
/// Those two exceptions participate in the revision fingerprint and are a
/// compatibility contract with CouchDB/TouchDB; do not alter them.
pub fn strip_special_properties(body: &Body) -> Body {
    body.iter()
        .filter(|(key, _)| {
            !key.starts_with('_') || *key == BODY_ATTACHMENTS || *key == BODY_DELETED
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// True iff the body has a top-level underscore-prefixed key outside the
/// known reserved set. Used by the ingest path to reject unknown reserved
/// names.
pub fn contains_user_special_properties(body: &Body) -> bool {
    body.keys().any(|key| {
        key.starts_with('_')
            && key != BODY_ID
            && key != BODY_REV
            && key != BODY_DELETED
            && key != BODY_ATTACHMENTS
            && key != BODY_REVISIONS
    })
}

/// Recursively narrow float-typed numbers with exact integral values to
/// i64.
///
/// Revision generations and expiry values must keep integer precision
/// even when an upstream producer emitted them in float form.
pub fn fix_json_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return;
            }
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    *value = Value::from(f as i64);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                fix_json_numbers(item);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                fix_json_numbers(item);
            }
        }
        _ => {}
    }
}

/// Narrow every value of a body in place. See [`fix_json_numbers`].
pub fn fix_body_numbers(body: &mut Body) {
    for value in body.values_mut() {
        fix_json_numbers(value);
    }
}

/// Read the `_exp` property as a 32-bit expiry and remove it from the
/// body. Returns `None` (and leaves the body untouched) when `_exp` is
/// absent or null.
pub fn extract_expiry(body: &mut Body) -> Result<Option<u32>> {
    let expiry = match body.get(BODY_EXPIRY) {
        None => return Ok(None),
        Some(raw) => reflect_expiry(raw)?,
    };
    if expiry.is_some() {
        body.remove(BODY_EXPIRY);
    }
    Ok(expiry)
}

/// Convert a raw JSON expiry value into the host store's 32-bit
/// absolute-or-relative expiry.
///
/// Accepted forms: an integer, a numeric string, or an RFC 3339 date
/// string. Null maps to `None`.
pub fn reflect_expiry(raw: &Value) -> Result<Option<u32>> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(value) = n.as_i64() {
                validate_u32_expiry(value).map(Some)
            } else if let Some(value) = n.as_u64() {
                u32::try_from(value)
                    .map(Some)
                    .map_err(|_| Error::invalid_expiry(format!("expiry {} out of range", value)))
            } else if let Some(value) = n.as_f64() {
                validate_u32_expiry(value as i64).map(Some)
            } else {
                Err(Error::invalid_expiry(format!("unparseable expiry {}", n)))
            }
        }
        Value::String(s) => {
            if let Ok(value) = s.parse::<i64>() {
                return validate_u32_expiry(value).map(Some);
            }
            match chrono::DateTime::parse_from_rfc3339(s) {
                Ok(when) => validate_u32_expiry(when.timestamp()).map(Some),
                Err(_) => Err(Error::invalid_expiry(format!(
                    "unable to parse expiry {:?} as number or RFC 3339 date",
                    s
                ))),
            }
        }
        other => Err(Error::invalid_expiry(format!(
            "unsupported expiry type: {}",
            other
        ))),
    }
}

fn validate_u32_expiry(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::invalid_expiry(format!("expiry {} out of range", value)))
}

/// Typed accessor for a string-array property.
///
/// Returns `Ok(None)` when the property is absent and an error when it is
/// present with any other shape.
pub fn get_string_array_property(body: &Body, property: &str) -> Result<Option<Vec<String>>> {
    let raw = match body.get(property) {
        None => return Ok(None),
        Some(raw) => raw,
    };
    let items = raw
        .as_array()
        .ok_or_else(|| Error::bad_property(format!("{} must be a string array", property)))?;
    let mut strings = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(s) => strings.push(s.to_string()),
            None => {
                return Err(Error::bad_property(format!(
                    "{} must be a string array",
                    property
                )))
            }
        }
    }
    Ok(Some(strings))
}
