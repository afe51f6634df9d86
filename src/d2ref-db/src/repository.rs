//! Repository trait for reference data storage.
//!
//! Every run replaces the stored records wholesale: rows are upserted by key
//! and rows whose key is absent from the new set are removed.

use d2ref::{Entity, IngestOutput, Language, Patch, PatchNote};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for RepoError {
    fn from(e: rusqlite::Error) -> Self {
        RepoError::Database(e.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of one replace call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    pub upserted: usize,
    pub removed: usize,
}

/// Storage sink for ingested records
pub trait ReferenceRepository {
    /// Initialize the database schema
    fn init(&self) -> RepoResult<()>;

    // === Replace ===

    /// Replace all patches, keyed by patch number
    fn replace_patches(&self, patches: &[Patch]) -> RepoResult<ReplaceStats>;

    /// Replace all patch notes, keyed by (patch number, internal name, locale)
    fn replace_patch_notes(&self, notes: &[PatchNote]) -> RepoResult<ReplaceStats>;

    /// Replace all entities, keyed by internal name
    fn replace_entities(&self, entities: &[Entity]) -> RepoResult<ReplaceStats>;

    // === Queries ===

    fn get_patch(&self, patch_number: &str) -> RepoResult<Option<Patch>>;

    /// Newest first; ties keep the order they were stored in
    fn list_patches(&self) -> RepoResult<Vec<Patch>>;

    fn get_patch_note(
        &self,
        patch_number: &str,
        internal_name: &str,
        language: Language,
    ) -> RepoResult<Option<PatchNote>>;

    /// Patch notes in `language` whose text contains `text`, newest patch first
    fn search_patch_notes(&self, text: &str, language: Language) -> RepoResult<Vec<PatchNote>>;

    fn get_entity(&self, internal_name: &str) -> RepoResult<Option<Entity>>;

    /// Replace everything one ingestion run produced
    fn store(&self, output: &IngestOutput) -> RepoResult<[ReplaceStats; 3]> {
        Ok([
            self.replace_patches(&output.patches)?,
            self.replace_patch_notes(&output.patch_notes)?,
            self.replace_entities(&output.entities)?,
        ])
    }
}
