//! Dota 2 reference data ingestion
//!
//! Turns the game's scripts and localization into storable records:
//!
//! - [`localisation`]: concurrent (category, language) loads merged into one
//!   immutable [`LocalisedValues`] table
//! - [`patch`]: the released patch list
//! - [`manifest`] and [`patch_note`]: per-patch notes, localized
//! - [`entity`]: heroes, abilities, items and units
//! - [`special`]: the compact talent value grammar (`+25%`, `x2`, `=3`)
//! - [`ingest`]: all of the above in one run

pub mod entity;
pub mod ingest;
pub mod language;
pub mod localisation;
pub mod manifest;
pub mod patch;
pub mod patch_note;
pub mod special;
pub mod text;

pub use entity::{Entity, EntityExtractor, EntityType, HeroRoster};
pub use ingest::{IngestOptions, IngestOutput};
pub use language::{Language, UnknownLanguage, DEFAULT_LANGUAGE};
pub use localisation::{Category, LocalisationRequest, LocalisedValues};
pub use manifest::{NoteCategory, PatchNoteManifest};
pub use patch::{Patch, PatchListExtractor};
pub use patch_note::{
    EntityNote, HeroNote, Note, PatchNote, PatchNoteBody, PatchNoteConverter, PatchNoteKey,
    SubItemKind,
};
pub use special::{SpecialBonusValue, SpecialValueError};

/// Errors from building and converting reference data
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load {path} ({language}): {source}")]
    Load {
        path: String,
        language: Language,
        #[source]
        source: d2kv::Error,
    },

    #[error(transparent)]
    Document(#[from] d2kv::Error),

    #[error("Duplicate localization key '{key}' for {language} in {path}")]
    DuplicateKey {
        language: Language,
        key: String,
        path: String,
    },

    #[error("Unknown {kind} '{reference}' referenced by {hero}")]
    ReferenceNotResolved {
        hero: String,
        kind: SubItemKind,
        reference: String,
    },

    #[error("Malformed entry '{entry}': {reason}")]
    Malformed { entry: String, reason: String },

    #[error(transparent)]
    SpecialValue(#[from] SpecialValueError),

    #[error("Load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateKey {
            language: Language::Russian,
            key: "npc_dota_hero_axe".to_string(),
            path: "resource/localization/dota_russian.txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate localization key 'npc_dota_hero_axe' for russian in \
             resource/localization/dota_russian.txt"
        );

        let err = Error::Malformed {
            entry: "7.35d".to_string(),
            reason: "missing patch_date".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed entry '7.35d': missing patch_date");

        let err = Error::ReferenceNotResolved {
            hero: "npc_dota_hero_axe".to_string(),
            kind: SubItemKind::Facet,
            reference: "axe_one_man_army".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown facet 'axe_one_man_army' referenced by npc_dota_hero_axe"
        );
    }

    #[test]
    fn test_document_errors_convert() {
        let err: Error = d2kv::Error::NotFound("scripts/npc/items.txt".to_string()).into();
        assert_eq!(err.to_string(), "Path not found in archive: scripts/npc/items.txt");
    }

    #[test]
    fn test_special_value_errors_convert() {
        let err: Error = SpecialBonusValue::parse("abc").unwrap_err().into();
        assert!(matches!(err, Error::SpecialValue(_)));
    }
}
