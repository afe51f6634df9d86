//! Ingest command handler
//!
//! Runs the full pipeline against an unpacked archive directory and replaces
//! the database contents with the result.

use anyhow::{bail, Context, Result};
use d2kv::DirectorySource;
use d2ref::ingest::{self, IngestOptions, IngestOutput};
use d2ref::{EntityType, Language};
use d2ref_db::{ReferenceRepository, SqliteDb};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub async fn handle(
    archive: &Path,
    database: &Path,
    languages: Vec<Language>,
    hero_lore: bool,
    dry_run: bool,
) -> Result<()> {
    if !archive.is_dir() {
        bail!("Archive directory not found: {}", archive.display());
    }

    let options = IngestOptions {
        languages,
        include_hero_lore: hero_lore,
    };
    let source = Arc::new(DirectorySource::new(archive));
    let output = ingest::run(source, &options)
        .await
        .with_context(|| format!("Ingestion of {} failed", archive.display()))?;

    print_summary(&output);

    if dry_run {
        println!("Dry run: database not written");
        return Ok(());
    }

    store(&output, database)?;
    println!("Stored in {}", database.display());
    Ok(())
}

fn store(output: &IngestOutput, database: &Path) -> Result<()> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let db = SqliteDb::open(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    db.init().context("Failed to initialize database")?;

    let [patches, notes, entities] = db.store(output).context("Failed to store records")?;
    tracing::info!(
        patches_removed = patches.removed,
        notes_removed = notes.removed,
        entities_removed = entities.removed,
        "database updated"
    );
    Ok(())
}

fn print_summary(output: &IngestOutput) {
    println!("Patches:     {}", output.patches.len());
    if let Some(latest) = output.patches.first() {
        println!("  latest:    {}", latest.patch_number);
    }
    println!("Patch notes: {}", output.patch_notes.len());
    println!("Entities:    {}", output.entities.len());

    for entity_type in [
        EntityType::Hero,
        EntityType::Ability,
        EntityType::Item,
        EntityType::Creep,
        EntityType::Summon,
    ] {
        let count = output
            .entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .count();
        println!("  {:<10} {}", entity_type.label(), count);
    }
}
