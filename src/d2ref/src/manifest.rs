//! Raw patch-note manifest
//!
//! The manifest lists, per patch, which localization keys make up the notes
//! and how they are grouped. Note text is resolved later by the converter.
//!
//! ```text
//! "7.35d"
//! {
//!     "patch_name"   "patch_7.35d"
//!     "patch_date"   "2024-03-21"
//!     "website"      "https://www.dota2.com/patches/7.35d"
//!     "generic"      { "1" { "indent_level" "0" "note" "dota_patch_7_35d_general_1" } }
//!     "items"        { "item_blink" { "1" { "note" "..." "info" "..." } } }
//!     "heroes"
//!     {
//!         "npc_dota_hero_axe"
//!         {
//!             "hero_notes"   { ... }
//!             "abilities"    { "axe_berserkers_call" { ... } }
//!             "facets"       { "axe_one_man_army" { ... } }
//!             "innate"       { "axe_coat_of_blood" { ... } }
//!             "talent_notes" { ... }
//!         }
//!     }
//! }
//! ```

use d2kv::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::patch::parse_patch;
use crate::{Error, Result};

const FIELD_WEBSITE: &str = "website";
const FIELD_TITLE: &str = "title";
const FIELD_INDENT: &str = "indent_level";
const FIELD_NOTE: &str = "note";
const FIELD_INFO: &str = "info";

const HERO_GENERAL: &str = "hero_notes";
const HERO_ABILITIES: &str = "abilities";
const HERO_FACETS: &str = "facets";
const HERO_INNATE: &str = "innate";
const HERO_TALENTS: &str = "talent_notes";

/// Declared category of a manifest section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    Generic,
    Item,
    NeutralItem,
    NeutralCreep,
    Hero,
}

impl NoteCategory {
    /// Manifest section holding this category
    pub fn section(self) -> &'static str {
        match self {
            NoteCategory::Generic => "generic",
            NoteCategory::Item => "items",
            NoteCategory::NeutralItem => "neutral_items",
            NoteCategory::NeutralCreep => "neutral_creeps",
            NoteCategory::Hero => "heroes",
        }
    }
}

/// One note line before localization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNote {
    pub indent: u32,
    /// Localization key of the line
    pub key: String,
    pub info: Option<String>,
}

/// Notes about one item, creep, ability or facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityEntry {
    pub internal_name: String,
    /// Localization key of an explicit title
    pub title_key: Option<String>,
    pub notes: Vec<RawNote>,
}

/// Notes about one hero, grouped as the source groups them
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawHeroEntry {
    pub internal_name: String,
    pub general: Vec<RawNote>,
    pub abilities: Vec<RawEntityEntry>,
    pub facets: Vec<RawEntityEntry>,
    pub innate: Vec<RawEntityEntry>,
    pub talents: Vec<RawNote>,
}

/// Everything the manifest says about one patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchNoteManifest {
    pub patch_number: String,
    pub timestamp: i64,
    pub website: Option<String>,
    pub generic_notes: Vec<RawNote>,
    pub heroes_notes: Vec<RawHeroEntry>,
    pub item_notes: Vec<RawEntityEntry>,
    pub neutral_item_notes: Vec<RawEntityEntry>,
    pub neutral_creep_notes: Vec<RawEntityEntry>,
}

/// Parse every patch in the manifest, skipping malformed ones
pub fn parse_manifests(document: &Document) -> Vec<PatchNoteManifest> {
    document
        .root_children()
        .iter()
        .filter_map(|entry| match parse_manifest(entry) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(
                    entry = %entry.name,
                    error = %e,
                    "skipping malformed patch manifest"
                );
                None
            }
        })
        .collect()
}

/// Parse one patch entry
///
/// Fails only when the patch header is unusable. Malformed notes and entity
/// entries inside it are logged and dropped individually.
pub fn parse_manifest(entry: &Node) -> Result<PatchNoteManifest> {
    let patch = parse_patch(entry)?;
    let number = patch.patch_number.as_str();

    let generic_notes = entry
        .child(NoteCategory::Generic.section())
        .map(|section| {
            section
                .children()
                .iter()
                .filter(|n| n.is_branch())
                .filter_map(|n| keep(number, NoteCategory::Generic, &n.name, parse_note(n)))
                .collect()
        })
        .unwrap_or_default();

    let heroes_notes = section_entries(entry, NoteCategory::Hero)
        .filter_map(|n| keep(number, NoteCategory::Hero, &n.name, parse_hero(n)))
        .collect();

    let entities = |category: NoteCategory| -> Vec<RawEntityEntry> {
        section_entries(entry, category)
            .filter_map(|n| keep(number, category, &n.name, parse_entity(n)))
            .collect()
    };

    Ok(PatchNoteManifest {
        website: entry
            .child_text(FIELD_WEBSITE)
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string),
        generic_notes,
        heroes_notes,
        item_notes: entities(NoteCategory::Item),
        neutral_item_notes: entities(NoteCategory::NeutralItem),
        neutral_creep_notes: entities(NoteCategory::NeutralCreep),
        patch_number: patch.patch_number,
        timestamp: patch.timestamp,
    })
}

fn section_entries(entry: &Node, category: NoteCategory) -> impl Iterator<Item = &Node> {
    entry
        .child(category.section())
        .map(Node::children)
        .unwrap_or(&[])
        .iter()
        .filter(|n| n.is_branch())
}

/// Entry boundary: log and drop a malformed entry
fn keep<T>(patch: &str, category: NoteCategory, entry: &str, parsed: Result<T>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                patch = %patch,
                category = ?category,
                entry = %entry,
                error = %e,
                "skipping malformed patch-note entry"
            );
            None
        }
    }
}

fn parse_note(node: &Node) -> Result<RawNote> {
    let key = node
        .child_text(FIELD_NOTE)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| malformed(node, "note line without a note key"))?;

    let indent = match node.child_text(FIELD_INDENT) {
        None => 0,
        Some(text) => text
            .trim()
            .parse()
            .map_err(|_| malformed(node, format!("indent_level '{}' is not a number", text)))?,
    };

    let info = node
        .child_text(FIELD_INFO)
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(str::to_string);

    Ok(RawNote {
        indent,
        key: key.to_string(),
        info,
    })
}

/// Note lines are the branch children of `node`; text children are fields
fn parse_notes(node: &Node) -> Result<Vec<RawNote>> {
    node.children()
        .iter()
        .filter(|n| n.is_branch())
        .map(parse_note)
        .collect()
}

fn parse_entity(node: &Node) -> Result<RawEntityEntry> {
    Ok(RawEntityEntry {
        internal_name: node.name.clone(),
        title_key: node
            .child_text(FIELD_TITLE)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        notes: parse_notes(node)?,
    })
}

fn parse_hero(node: &Node) -> Result<RawHeroEntry> {
    let notes_of = |section: &str| -> Result<Vec<RawNote>> {
        node.child(section).map(parse_notes).unwrap_or(Ok(Vec::new()))
    };
    let entities_of = |section: &str| -> Result<Vec<RawEntityEntry>> {
        node.child(section)
            .map(Node::children)
            .unwrap_or(&[])
            .iter()
            .filter(|n| n.is_branch())
            .map(parse_entity)
            .collect()
    };

    Ok(RawHeroEntry {
        internal_name: node.name.clone(),
        general: notes_of(HERO_GENERAL)?,
        abilities: entities_of(HERO_ABILITIES)?,
        facets: entities_of(HERO_FACETS)?,
        innate: entities_of(HERO_INNATE)?,
        talents: notes_of(HERO_TALENTS)?,
    })
}

fn malformed(node: &Node, reason: impl Into<String>) -> Error {
    Error::Malformed {
        entry: node.name.clone(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
    "patches"
    {
        "7.35d"
        {
            "patch_name"  "patch_7.35d"
            "patch_date"  "2024-03-21"
            "website"     "https://www.dota2.com/patches/7.35d"
            "generic"
            {
                "1" { "indent_level" "0" "note" "dota_patch_7_35d_general_1" }
                "2"
                {
                    "indent_level" "1"
                    "note" "dota_patch_7_35d_general_2"
                    "info" "dota_patch_7_35d_general_2_info"
                }
                "3" { "indent_level" "deep" "note" "dota_patch_7_35d_general_3" }
            }
            "items"
            {
                "item_blink"
                {
                    "title" "dota_patch_item_blink_title"
                    "1" { "note" "dota_patch_7_35d_item_blink_1" }
                }
                "item_broken"
                {
                    "1" { "indent_level" "0" }
                }
            }
            "neutral_creeps"
            {
                "npc_dota_neutral_centaur_khan" { "1" { "note" "dota_patch_7_35d_centaur_1" } }
            }
            "heroes"
            {
                "npc_dota_hero_axe"
                {
                    "hero_notes" { "1" { "note" "dota_patch_7_35d_axe_1" } }
                    "abilities"
                    {
                        "axe_berserkers_call" { "1" { "note" "dota_patch_7_35d_axe_call_1" } }
                    }
                    "facets"
                    {
                        "axe_one_man_army" { "1" { "note" "dota_patch_7_35d_axe_oma_1" } }
                    }
                    "innate"
                    {
                        "axe_coat_of_blood" { "1" { "note" "dota_patch_7_35d_axe_cob_1" } }
                    }
                    "talent_notes"
                    {
                        "1" { "indent_level" "0" "note" "dota_patch_7_35d_axe_talent_1" }
                    }
                }
            }
        }
        "broken"
        {
            "patch_name" "7.36"
        }
    }
    "#;

    fn document() -> Document {
        d2kv::parse(MANIFEST, d2kv::ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_manifests_skips_broken_patch() {
        let manifests = parse_manifests(&document());
        assert_eq!(manifests.len(), 1);

        let m = &manifests[0];
        assert_eq!(m.patch_number, "7.35d");
        assert_eq!(m.timestamp, 1_711_008_000);
        assert_eq!(m.website.as_deref(), Some("https://www.dota2.com/patches/7.35d"));
    }

    #[test]
    fn test_generic_notes_keep_indent_and_info() {
        let m = &parse_manifests(&document())[0];

        // The non-numeric indent line is dropped, the others survive
        assert_eq!(m.generic_notes.len(), 2);
        assert_eq!(m.generic_notes[0].indent, 0);
        assert_eq!(m.generic_notes[0].info, None);
        assert_eq!(m.generic_notes[1].indent, 1);
        assert_eq!(
            m.generic_notes[1].info.as_deref(),
            Some("dota_patch_7_35d_general_2_info")
        );
    }

    #[test]
    fn test_entity_sections() {
        let m = &parse_manifests(&document())[0];

        assert_eq!(m.item_notes.len(), 1, "item without a note key is dropped");
        let blink = &m.item_notes[0];
        assert_eq!(blink.internal_name, "item_blink");
        assert_eq!(blink.title_key.as_deref(), Some("dota_patch_item_blink_title"));
        assert_eq!(blink.notes.len(), 1);
        assert_eq!(blink.notes[0].indent, 0);

        assert!(m.neutral_item_notes.is_empty());
        assert_eq!(m.neutral_creep_notes.len(), 1);
    }

    #[test]
    fn test_hero_sections() {
        let m = &parse_manifests(&document())[0];
        assert_eq!(m.heroes_notes.len(), 1);

        let axe = &m.heroes_notes[0];
        assert_eq!(axe.internal_name, "npc_dota_hero_axe");
        assert_eq!(axe.general.len(), 1);
        assert_eq!(axe.abilities[0].internal_name, "axe_berserkers_call");
        assert_eq!(axe.facets[0].internal_name, "axe_one_man_army");
        assert_eq!(axe.innate[0].internal_name, "axe_coat_of_blood");
        assert_eq!(axe.talents[0].key, "dota_patch_7_35d_axe_talent_1");
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(NoteCategory::NeutralItem.section(), "neutral_items");
        assert_eq!(NoteCategory::Hero.section(), "heroes");
    }
}
