//! One full ingestion run
//!
//! Builds the localization table, reads the npc scripts and the patch-note
//! manifest, and produces every record the storage sink persists. Records are
//! rebuilt from scratch each run.

use std::sync::Arc;

use d2kv::{paths, ArchiveSource, Document, DocumentOptions, DocumentProvider};

use crate::entity::{Entity, EntityExtractor, HeroRoster};
use crate::language::{Language, DEFAULT_LANGUAGE};
use crate::localisation::{self, Category, LocalisationRequest};
use crate::manifest::parse_manifests;
use crate::patch::{sort_descending, Patch, PatchListExtractor};
use crate::patch_note::{PatchNote, PatchNoteConverter};
use crate::text::clean_markup;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Languages to produce records for
    pub languages: Vec<Language>,
    /// Also load hero lore strings
    pub include_hero_lore: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            languages: vec![DEFAULT_LANGUAGE],
            include_hero_lore: false,
        }
    }
}

impl IngestOptions {
    /// Requested languages plus the fallback language, deduplicated
    pub fn effective_languages(&self) -> Vec<Language> {
        let mut languages = vec![DEFAULT_LANGUAGE];
        for &language in &self.languages {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }

    fn request(&self) -> LocalisationRequest {
        let mut request = LocalisationRequest::new()
            .with_category(Category::Abilities, Some(clean_markup))
            .with_category(Category::Dota, Some(clean_markup))
            .with_category(Category::PatchNotes, Some(clean_markup));
        if self.include_hero_lore {
            request = request.with_category(Category::HeroLore, Some(clean_markup));
        }
        request
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOutput {
    /// Newest first
    pub patches: Vec<Patch>,
    pub patch_notes: Vec<PatchNote>,
    pub entities: Vec<Entity>,
}

/// Every script an ingestion run reads
const SCRIPT_PATHS: [&str; 6] = [
    paths::PATCH_NOTES,
    paths::HEROES,
    paths::ABILITIES,
    paths::ITEMS,
    paths::NEUTRAL_ITEMS,
    paths::UNITS,
];

/// Script documents read in one provider scope
struct Scripts {
    manifest: Document,
    heroes: Document,
    abilities: Document,
    items: Document,
    neutral_items: Document,
    units: Document,
}

impl Scripts {
    fn read(source: &dyn ArchiveSource) -> Result<Self> {
        let mut provider = DocumentProvider::open(source)?;
        provider.verify()?;

        // Report every missing script at once instead of the first one
        let missing: Vec<&str> = SCRIPT_PATHS
            .into_iter()
            .filter(|path| !provider.contains(path))
            .collect();
        if !missing.is_empty() {
            tracing::error!(missing = ?missing, "archive is missing scripts");
            return Err(d2kv::Error::NotFound(missing.join(", ")).into());
        }

        let mut read = |path: &str| -> Result<Document> {
            let document = provider.get_document(path, DocumentOptions::default())?;
            tracing::debug!(path = %path, "read script");
            Ok(document)
        };

        Ok(Self {
            manifest: read(paths::PATCH_NOTES)?,
            heroes: read(paths::HEROES)?,
            abilities: read(paths::ABILITIES)?,
            items: read(paths::ITEMS)?,
            neutral_items: read(paths::NEUTRAL_ITEMS)?,
            units: read(paths::UNITS)?,
        })
    }
}

/// Run the whole pipeline against `source`
pub async fn run(source: Arc<dyn ArchiveSource>, options: &IngestOptions) -> Result<IngestOutput> {
    let languages = options.effective_languages();
    tracing::info!(
        archive = %source.describe(),
        languages = ?languages.iter().map(|l| l.stem()).collect::<Vec<_>>(),
        "starting ingestion"
    );

    let values = localisation::build(options.request(), Arc::clone(&source), &languages).await?;

    let scripts = {
        let source = Arc::clone(&source);
        tokio::task::spawn_blocking(move || Scripts::read(source.as_ref()))
            .await
            .map_err(Error::Task)??
    };

    let mut patches = PatchListExtractor::new(&scripts.manifest).get_processed();
    sort_descending(&mut patches);

    let roster = HeroRoster::from_document(&scripts.heroes);
    let manifests = parse_manifests(&scripts.manifest);
    let converter = &PatchNoteConverter::new(&values, &roster);
    let patch_notes: Vec<PatchNote> = languages
        .iter()
        .flat_map(|&language| {
            manifests
                .iter()
                .flat_map(move |manifest| converter.convert_manifest(manifest, language))
        })
        .collect();

    let extractor = EntityExtractor::new(&values);
    let mut entities = extractor.heroes(&scripts.heroes);
    entities.extend(extractor.abilities(&scripts.abilities));
    entities.extend(extractor.items(&scripts.items));
    entities.extend(extractor.items(&scripts.neutral_items));
    entities.extend(extractor.units(&scripts.units));

    tracing::info!(
        patches = patches.len(),
        patch_notes = patch_notes.len(),
        entities = entities.len(),
        "ingestion finished"
    );

    Ok(IngestOutput {
        patches,
        patch_notes,
        entities,
    })
}
