//! Released patches
//!
//! Every top-level entry of the patch-notes manifest describes one patch:
//!
//! ```text
//! "patches"
//! {
//!     "7.35d"
//!     {
//!         "patch_name"  "patch_7.35d"
//!         "patch_date"  "2024-03-21"
//!     }
//! }
//! ```
//!
//! Dates carry no time zone. They are read as midnight at a fixed UTC-08:00,
//! never adjusted for daylight saving, so the same string always produces the
//! same timestamp.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use d2kv::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Literal prefix stripped from `patch_name` to get the patch number
pub const PATCH_NAME_PREFIX: &str = "patch_";

/// Format of `patch_date`
pub const PATCH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Offset the manifest dates are expressed in, seconds west of UTC
pub const SOURCE_UTC_OFFSET_WEST_SECS: i32 = 8 * 3600;

pub(crate) const FIELD_NAME: &str = "patch_name";
pub(crate) const FIELD_DATE: &str = "patch_date";

/// A released patch, keyed by its number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Patch {
    pub patch_number: String,
    /// Unix seconds
    pub timestamp: i64,
}

/// Derives the patch catalogue from the raw manifest
pub struct PatchListExtractor<'a> {
    manifest: &'a Document,
}

impl<'a> PatchListExtractor<'a> {
    pub fn new(manifest: &'a Document) -> Self {
        Self { manifest }
    }

    /// One patch per well-formed manifest entry, in manifest order
    ///
    /// Malformed entries are logged and left out.
    pub fn get_processed(&self) -> Vec<Patch> {
        let entries = self.manifest.root_children();
        let mut patches = Vec::with_capacity(entries.len());

        for entry in entries {
            match parse_patch(entry) {
                Ok(patch) => patches.push(patch),
                Err(e) => {
                    tracing::warn!(
                        entry = %entry.name,
                        error = %e,
                        "skipping malformed patch entry"
                    );
                }
            }
        }

        tracing::debug!(patches = patches.len(), "extracted patch list");
        patches
    }
}

/// Newest first; patches with equal timestamps keep their relative order
pub fn sort_descending(patches: &mut [Patch]) {
    patches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Read number and timestamp from one manifest entry
pub(crate) fn parse_patch(entry: &Node) -> Result<Patch> {
    if !entry.is_branch() {
        return Err(malformed(entry, "expected a block, found a value"));
    }

    let name = entry
        .child_text(FIELD_NAME)
        .ok_or_else(|| malformed(entry, "missing patch_name"))?;
    let patch_number = patch_number_from_name(name).ok_or_else(|| {
        malformed(
            entry,
            format!("patch_name '{}' lacks the '{}' prefix", name, PATCH_NAME_PREFIX),
        )
    })?;

    let date = entry
        .child_text(FIELD_DATE)
        .ok_or_else(|| malformed(entry, "missing patch_date"))?;
    let timestamp = parse_timestamp(date).ok_or_else(|| {
        malformed(
            entry,
            format!("patch_date '{}' is not {}", date, PATCH_DATE_FORMAT),
        )
    })?;

    Ok(Patch {
        patch_number: patch_number.to_string(),
        timestamp,
    })
}

/// `patch_7.35d` → `7.35d`
pub fn patch_number_from_name(name: &str) -> Option<&str> {
    name.trim()
        .strip_prefix(PATCH_NAME_PREFIX)
        .filter(|number| !number.is_empty())
}

/// Unix seconds for midnight of `date` at the fixed source offset
pub fn parse_timestamp(date: &str) -> Option<i64> {
    let day = NaiveDate::parse_from_str(date.trim(), PATCH_DATE_FORMAT).ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    let offset = FixedOffset::west_opt(SOURCE_UTC_OFFSET_WEST_SECS)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.timestamp())
}

fn malformed(entry: &Node, reason: impl Into<String>) -> Error {
    Error::Malformed {
        entry: entry.name.clone(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, name: Option<&str>, date: Option<&str>) -> Node {
        let mut children = Vec::new();
        if let Some(name) = name {
            children.push(Node::text(FIELD_NAME, name));
        }
        if let Some(date) = date {
            children.push(Node::text(FIELD_DATE, date));
        }
        Node::branch(key, children)
    }

    fn manifest(entries: Vec<Node>) -> Document {
        Document {
            roots: vec![Node::branch("patches", entries)],
        }
    }

    #[test]
    fn test_patch_number_from_name() {
        assert_eq!(patch_number_from_name("patch_7.35d"), Some("7.35d"));
        assert_eq!(patch_number_from_name(" patch_7.00 "), Some("7.00"));
        assert_eq!(patch_number_from_name("7.35d"), None);
        assert_eq!(patch_number_from_name("patch_"), None);
    }

    #[test]
    fn test_timestamp_fixed_offset() {
        assert_eq!(parse_timestamp("2024-03-21"), Some(1_711_008_000));
        assert_eq!(parse_timestamp("2023-12-14"), Some(1_702_540_800));
        // Summer dates use the same offset
        assert_eq!(parse_timestamp("2024-07-01"), Some(1_719_820_800));
        assert_eq!(parse_timestamp("2024-07-01"), parse_timestamp("2024-07-01"));
        assert_eq!(parse_timestamp("21/03/2024"), None);
        assert_eq!(parse_timestamp("2024-02-30"), None);
    }

    #[test]
    fn test_extracts_valid_entries_despite_malformed_ones() {
        let doc = manifest(vec![
            entry("7.35", Some("patch_7.35"), Some("2023-12-14")),
            entry("missing_date", Some("patch_7.35a"), None),
            entry("missing_name", None, Some("2024-01-01")),
            entry("bad_date", Some("patch_7.35b"), Some("soon")),
            Node::text("Version", "1"),
            entry("7.35d", Some("patch_7.35d"), Some("2024-03-21")),
        ]);

        let patches = PatchListExtractor::new(&doc).get_processed();
        assert_eq!(
            patches,
            vec![
                Patch {
                    patch_number: "7.35".to_string(),
                    timestamp: 1_702_540_800
                },
                Patch {
                    patch_number: "7.35d".to_string(),
                    timestamp: 1_711_008_000
                },
            ]
        );
    }

    #[test]
    fn test_result_set_independent_of_child_order() {
        let a = entry("a", Some("patch_7.34"), Some("2023-08-08"));
        let b = entry("b", Some("patch_7.35"), Some("2023-12-14"));
        let c = entry("c", Some("patch_7.35b"), Some("2024-01-05"));

        let forward_manifest = manifest(vec![a.clone(), b.clone(), c.clone()]);
        let mut forward = PatchListExtractor::new(&forward_manifest).get_processed();
        let mut backward = PatchListExtractor::new(&manifest(vec![c, b, a])).get_processed();

        sort_descending(&mut forward);
        sort_descending(&mut backward);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].patch_number, "7.35b");
    }

    #[test]
    fn test_sort_descending_keeps_tie_order() {
        let mut patches = vec![
            Patch {
                patch_number: "7.35".to_string(),
                timestamp: 100,
            },
            Patch {
                patch_number: "7.35a".to_string(),
                timestamp: 200,
            },
            Patch {
                patch_number: "7.35a-hotfix".to_string(),
                timestamp: 200,
            },
            Patch {
                patch_number: "7.35b".to_string(),
                timestamp: 150,
            },
        ];

        sort_descending(&mut patches);
        let order: Vec<_> = patches.iter().map(|p| p.patch_number.as_str()).collect();
        assert_eq!(order, vec!["7.35a", "7.35a-hotfix", "7.35b", "7.35"]);
    }

    #[test]
    fn test_empty_manifest() {
        assert!(PatchListExtractor::new(&Document::default())
            .get_processed()
            .is_empty());
    }
}
