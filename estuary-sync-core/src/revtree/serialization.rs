//! On-disk form of a revision tree
//!
//! Trees persist as parallel arrays to amortize JSON key overhead:
//!
//! ```json
//! { "revs":     ["3-three", "2-two", "1-one"],
//!   "parents":  [1, 2, -1],
//!   "deleted":  [0],
//!   "bodymap":  {"0": "{}"},
//!   "channels": [null, ["ABC"], null],
//!   "hasAttachments": [0] }
//! ```
//!
//! `parents` holds indexes into `revs` (-1 for roots). Older documents
//! carry a dense `bodies` array instead of the sparse `bodymap`; readers
//! accept both, writers emit `bodymap` only. An empty string in `bodies`
//! means "no body", not "empty body".
//!
//! Encoding refuses rather than emit an inconsistent tree, and decoding
//! validates every index before building a tree.

use super::{ChannelSet, RevInfo, RevTree};
use crate::revid::compare_rev_ids;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::HashMap;

#[derive(Serialize, Deserialize)]
struct RevTreeList {
    revs: Vec<String>,
    parents: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    deleted: Vec<usize>,
    #[serde(rename = "bodymap", default, skip_serializing_if = "BTreeMap::is_empty")]
    body_map: BTreeMap<String, String>,
    // Legacy dense form; never written.
    #[serde(rename = "bodies", default, skip_serializing_if = "Vec::is_empty")]
    legacy_bodies: Vec<String>,
    #[serde(default)]
    channels: Vec<Option<ChannelSet>>,
    #[serde(rename = "hasAttachments", default, skip_serializing_if = "Vec::is_empty")]
    has_attachments: Vec<usize>,
}

impl Serialize for RevTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut infos: Vec<&RevInfo> = self.revs.values().collect();
        // Generation-descending with digest tiebreak, so output is stable.
        infos.sort_by(|a, b| compare_rev_ids(&b.id, &a.id));

        let index_of: HashMap<&str, i64> = infos
            .iter()
            .enumerate()
            .map(|(i, info)| (info.id.as_str(), i as i64))
            .collect();

        let mut list = RevTreeList {
            revs: Vec::with_capacity(infos.len()),
            parents: Vec::with_capacity(infos.len()),
            deleted: Vec::new(),
            body_map: BTreeMap::new(),
            legacy_bodies: Vec::new(),
            channels: Vec::with_capacity(infos.len()),
            has_attachments: Vec::new(),
        };
        for (i, info) in infos.iter().enumerate() {
            list.revs.push(info.id.clone());
            let parent_index = match info.parent.as_deref() {
                None => -1,
                Some(parent) => *index_of.get(parent).ok_or_else(|| {
                    S::Error::custom(format!(
                        "revision {} has parent {} outside the tree",
                        info.id, parent
                    ))
                })?,
            };
            list.parents.push(parent_index);
            if info.deleted {
                list.deleted.push(i);
            }
            if info.has_attachments {
                list.has_attachments.push(i);
            }
            if let Some(body) = &info.body {
                if !body.is_empty() {
                    let text = String::from_utf8(body.clone()).map_err(|_| {
                        S::Error::custom(format!("body of revision {} is not UTF-8", info.id))
                    })?;
                    list.body_map.insert(i.to_string(), text);
                }
            }
            list.channels.push(if info.channels.is_empty() {
                None
            } else {
                Some(info.channels.clone())
            });
        }
        list.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RevTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = RevTreeList::deserialize(deserializer)?;
        let count = list.revs.len();
        if list.parents.len() != count {
            return Err(D::Error::custom(format!(
                "parents length {} does not match revs length {}",
                list.parents.len(),
                count
            )));
        }
        if !list.channels.is_empty() && list.channels.len() != count {
            return Err(D::Error::custom(format!(
                "channels length {} does not match revs length {}",
                list.channels.len(),
                count
            )));
        }
        if !list.legacy_bodies.is_empty() && list.legacy_bodies.len() != count {
            return Err(D::Error::custom(format!(
                "legacy bodies length {} does not match revs length {}",
                list.legacy_bodies.len(),
                count
            )));
        }

        let mut infos: Vec<RevInfo> = Vec::with_capacity(count);
        for (i, id) in list.revs.iter().enumerate() {
            if id.is_empty() {
                return Err(D::Error::custom("empty revision id in revs"));
            }
            let parent_index = list.parents[i];
            let parent = match parent_index {
                -1 => None,
                p if p >= 0 && (p as usize) < count => {
                    if p as usize == i {
                        return Err(D::Error::custom(format!(
                            "revision {} is its own parent",
                            id
                        )));
                    }
                    Some(list.revs[p as usize].clone())
                }
                p => {
                    return Err(D::Error::custom(format!(
                        "parent index {} of revision {} out of range",
                        p, id
                    )));
                }
            };
            let channels = list
                .channels
                .get(i)
                .and_then(|c| c.clone())
                .unwrap_or_default();
            infos.push(RevInfo {
                id: id.clone(),
                parent,
                deleted: false,
                has_attachments: false,
                channels,
                body: None,
            });
        }

        // Bodies: the sparse map wins; fall back to the legacy dense form.
        if !list.body_map.is_empty() {
            for (key, text) in &list.body_map {
                let index: usize = key.parse().map_err(|_| {
                    D::Error::custom(format!("bad bodymap index {:?}", key))
                })?;
                let info = infos.get_mut(index).ok_or_else(|| {
                    D::Error::custom(format!("bodymap index {} out of range", index))
                })?;
                if !text.is_empty() {
                    info.body = Some(text.clone().into_bytes());
                }
            }
        } else {
            for (i, text) in list.legacy_bodies.iter().enumerate() {
                if !text.is_empty() {
                    infos[i].body = Some(text.clone().into_bytes());
                }
            }
        }

        for index in &list.deleted {
            infos
                .get_mut(*index)
                .ok_or_else(|| D::Error::custom(format!("deleted index {} out of range", index)))?
                .deleted = true;
        }
        for index in &list.has_attachments {
            infos
                .get_mut(*index)
                .ok_or_else(|| {
                    D::Error::custom(format!("hasAttachments index {} out of range", index))
                })?
                .has_attachments = true;
        }

        let tree: RevTree = infos.into_iter().collect();
        if tree.len() != count {
            return Err(D::Error::custom("duplicate revision id in revs"));
        }
        Ok(tree)
    }
}
