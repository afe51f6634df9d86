//! Localized patch notes
//!
//! [`PatchNoteConverter`] turns the raw manifest into display records for one
//! language at a time. Hero entries keep the source grouping: general notes,
//! per-ability and per-facet notes, the innate ability and talents are four
//! independent lists and not a render order.

use serde::{Deserialize, Serialize};

use crate::entity::{ability_name_key, facet_name_key, HeroRoster};
use crate::localisation::LocalisedValues;
use crate::manifest::{NoteCategory, PatchNoteManifest, RawEntityEntry, RawHeroEntry, RawNote};
use crate::text::collapse_whitespace;
use crate::{Error, Language};

/// Internal name of the patch-wide notes record
pub const GENERIC_INTERNAL_NAME: &str = "generic";

/// One resolved note line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Nesting depth for rendering
    pub indent: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Notes about one item, creep, ability or facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNote {
    pub internal_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub notes: Vec<Note>,
}

/// Notes about one hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroNote {
    pub internal_name: String,
    pub general: Vec<Note>,
    pub abilities: Vec<EntityNote>,
    pub facets: Vec<EntityNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innate: Option<EntityNote>,
    pub talents: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "body", rename_all = "snake_case")]
pub enum PatchNoteBody {
    Generic(Vec<Note>),
    Item(EntityNote),
    NeutralItem(EntityNote),
    NeutralCreep(EntityNote),
    Hero(HeroNote),
}

impl PatchNoteBody {
    pub fn category(&self) -> NoteCategory {
        match self {
            PatchNoteBody::Generic(_) => NoteCategory::Generic,
            PatchNoteBody::Item(_) => NoteCategory::Item,
            PatchNoteBody::NeutralItem(_) => NoteCategory::NeutralItem,
            PatchNoteBody::NeutralCreep(_) => NoteCategory::NeutralCreep,
            PatchNoteBody::Hero(_) => NoteCategory::Hero,
        }
    }

    /// Every resolved text in the body, in display order
    pub fn texts(&self) -> Vec<&str> {
        fn lines(notes: &[Note]) -> impl Iterator<Item = &str> {
            notes.iter().map(|n| n.text.as_str())
        }
        fn entity(note: &EntityNote) -> impl Iterator<Item = &str> {
            note.title.as_deref().into_iter().chain(lines(&note.notes))
        }

        match self {
            PatchNoteBody::Generic(notes) => lines(notes).collect(),
            PatchNoteBody::Item(e)
            | PatchNoteBody::NeutralItem(e)
            | PatchNoteBody::NeutralCreep(e) => entity(e).collect(),
            PatchNoteBody::Hero(hero) => lines(&hero.general)
                .chain(hero.abilities.iter().flat_map(entity))
                .chain(hero.facets.iter().flat_map(entity))
                .chain(hero.innate.iter().flat_map(entity))
                .chain(lines(&hero.talents))
                .collect(),
        }
    }

    /// All texts on one line with whitespace collapsed, for substring search
    pub fn search_text(&self) -> String {
        collapse_whitespace(&self.texts().join(" "))
    }
}

/// Kind of hero sub-item a patch note refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubItemKind {
    Ability,
    Facet,
}

impl SubItemKind {
    pub fn label(self) -> &'static str {
        match self {
            SubItemKind::Ability => "ability",
            SubItemKind::Facet => "facet",
        }
    }
}

impl std::fmt::Display for SubItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Storage key of a patch note
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchNoteKey {
    pub patch_number: String,
    pub internal_name: String,
    pub locale: String,
}

/// One localized patch-note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchNote {
    pub patch_number: String,
    pub internal_name: String,
    pub language: Language,
    pub timestamp: i64,
    pub body: PatchNoteBody,
}

impl PatchNote {
    pub fn key(&self) -> PatchNoteKey {
        PatchNoteKey {
            patch_number: self.patch_number.clone(),
            internal_name: self.internal_name.clone(),
            locale: self.language.locale().to_string(),
        }
    }
}

/// A raw entry together with its declared category
#[derive(Debug, Clone, Copy)]
pub enum ManifestEntry<'a> {
    Generic(&'a [RawNote]),
    Item(&'a RawEntityEntry),
    NeutralItem(&'a RawEntityEntry),
    NeutralCreep(&'a RawEntityEntry),
    Hero(&'a RawHeroEntry),
}

impl ManifestEntry<'_> {
    pub fn category(&self) -> NoteCategory {
        match self {
            ManifestEntry::Generic(_) => NoteCategory::Generic,
            ManifestEntry::Item(_) => NoteCategory::Item,
            ManifestEntry::NeutralItem(_) => NoteCategory::NeutralItem,
            ManifestEntry::NeutralCreep(_) => NoteCategory::NeutralCreep,
            ManifestEntry::Hero(_) => NoteCategory::Hero,
        }
    }

    pub fn internal_name(&self) -> &str {
        match self {
            ManifestEntry::Generic(_) => GENERIC_INTERNAL_NAME,
            ManifestEntry::Item(e)
            | ManifestEntry::NeutralItem(e)
            | ManifestEntry::NeutralCreep(e) => &e.internal_name,
            ManifestEntry::Hero(h) => &h.internal_name,
        }
    }
}

/// Resolves raw manifest entries against the localization table
pub struct PatchNoteConverter<'a> {
    values: &'a LocalisedValues,
    roster: &'a HeroRoster,
}

impl<'a> PatchNoteConverter<'a> {
    pub fn new(values: &'a LocalisedValues, roster: &'a HeroRoster) -> Self {
        Self { values, roster }
    }

    /// Convert one entry, dispatching on its category
    pub fn convert(&self, entry: ManifestEntry<'_>, language: Language) -> PatchNoteBody {
        match entry {
            ManifestEntry::Generic(notes) => PatchNoteBody::Generic(self.notes(notes, language)),
            ManifestEntry::Item(e) => {
                PatchNoteBody::Item(self.entity(e, &ability_name_key(&e.internal_name), language))
            }
            ManifestEntry::NeutralItem(e) => PatchNoteBody::NeutralItem(self.entity(
                e,
                &ability_name_key(&e.internal_name),
                language,
            )),
            ManifestEntry::NeutralCreep(e) => {
                PatchNoteBody::NeutralCreep(self.entity(e, &e.internal_name, language))
            }
            ManifestEntry::Hero(hero) => PatchNoteBody::Hero(self.hero(hero, language)),
        }
    }

    /// Every record of one patch in one language
    ///
    /// Empty generic notes produce no record.
    pub fn convert_manifest(
        &self,
        manifest: &PatchNoteManifest,
        language: Language,
    ) -> Vec<PatchNote> {
        let mut entries = Vec::new();
        if !manifest.generic_notes.is_empty() {
            entries.push(ManifestEntry::Generic(&manifest.generic_notes));
        }
        entries.extend(manifest.item_notes.iter().map(ManifestEntry::Item));
        entries.extend(manifest.neutral_item_notes.iter().map(ManifestEntry::NeutralItem));
        entries.extend(manifest.neutral_creep_notes.iter().map(ManifestEntry::NeutralCreep));
        entries.extend(manifest.heroes_notes.iter().map(ManifestEntry::Hero));

        let notes: Vec<PatchNote> = entries
            .into_iter()
            .map(|entry| PatchNote {
                patch_number: manifest.patch_number.clone(),
                internal_name: entry.internal_name().to_string(),
                language,
                timestamp: manifest.timestamp,
                body: self.convert(entry, language),
            })
            .collect();

        tracing::debug!(
            patch = %manifest.patch_number,
            language = %language,
            records = notes.len(),
            "converted patch notes"
        );
        notes
    }

    fn hero(&self, hero: &RawHeroEntry, language: Language) -> HeroNote {
        let hero_name = hero.internal_name.as_str();

        let abilities = hero
            .abilities
            .iter()
            .filter(|a| {
                self.resolves(hero_name, SubItemKind::Ability, &a.internal_name, language)
            })
            .map(|a| self.entity(a, &ability_name_key(&a.internal_name), language))
            .collect();

        let facets = hero
            .facets
            .iter()
            .filter(|f| self.resolves(hero_name, SubItemKind::Facet, &f.internal_name, language))
            .map(|f| self.entity(f, &facet_name_key(&f.internal_name), language))
            .collect();

        let mut innate_entries = hero
            .innate
            .iter()
            .filter(|i| {
                self.resolves(hero_name, SubItemKind::Ability, &i.internal_name, language)
            });
        let innate = innate_entries
            .next()
            .map(|i| self.entity(i, &ability_name_key(&i.internal_name), language));
        for extra in innate_entries {
            tracing::warn!(
                hero = %hero_name,
                language = %language,
                entry = %extra.internal_name,
                "dropping additional innate entry"
            );
        }

        HeroNote {
            internal_name: hero.internal_name.clone(),
            general: self.notes(&hero.general, language),
            abilities,
            facets,
            innate,
            talents: self.notes(&hero.talents, language),
        }
    }

    /// Roster check for an ability or facet of `hero`; logs and rejects unknown ones
    fn resolves(
        &self,
        hero: &str,
        kind: SubItemKind,
        reference: &str,
        language: Language,
    ) -> bool {
        let known = match kind {
            SubItemKind::Ability => self.roster.has_ability(hero, reference),
            SubItemKind::Facet => self.roster.has_facet(hero, reference),
        };
        if !known {
            let error = Error::ReferenceNotResolved {
                hero: hero.to_string(),
                kind,
                reference: reference.to_string(),
            };
            tracing::warn!(language = %language, error = %error, "dropping patch-note sub-item");
        }
        known
    }

    fn entity(&self, entry: &RawEntityEntry, display_key: &str, language: Language) -> EntityNote {
        let title = match &entry.title_key {
            Some(key) => Some(self.text(key, language)),
            None => self
                .values
                .get_or_default(language, display_key)
                .map(str::to_string),
        };

        EntityNote {
            internal_name: entry.internal_name.clone(),
            title,
            notes: self.notes(&entry.notes, language),
        }
    }

    fn notes(&self, notes: &[RawNote], language: Language) -> Vec<Note> {
        notes
            .iter()
            .map(|note| Note {
                indent: note.indent,
                text: self.text(&note.key, language),
                info: note.info.as_deref().map(|key| self.text(key, language)),
            })
            .collect()
    }

    /// Localized text for `key`, or the key itself when no language has it
    fn text(&self, key: &str, language: Language) -> String {
        match self.values.get_or_default(language, key) {
            Some(text) => text.to_string(),
            None => {
                tracing::debug!(key = %key, language = %language, "unresolved patch-note key");
                key.to_string()
            }
        }
    }
}
