//! Patch list command handler

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use chrono::DateTime;
use d2kv::{paths, DirectorySource, DocumentOptions, DocumentProvider};
use d2ref::patch::{sort_descending, Patch, PatchListExtractor};
use std::path::Path;

/// Read the manifest from `archive` and print its patches, newest first
pub fn handle(archive: &Path, format: OutputFormat) -> Result<()> {
    let patches = read_patches(archive)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patches)?),
        OutputFormat::Table => {
            if patches.is_empty() {
                println!("No patches found");
            }
            for patch in &patches {
                println!("{:<12} {}", patch.patch_number, format_timestamp(patch.timestamp));
            }
        }
    }

    Ok(())
}

fn read_patches(archive: &Path) -> Result<Vec<Patch>> {
    let source = DirectorySource::new(archive);
    let mut provider = DocumentProvider::open(&source)
        .with_context(|| format!("Failed to open archive at {}", archive.display()))?;
    let manifest = provider
        .get_document(paths::PATCH_NOTES, DocumentOptions::default())
        .with_context(|| format!("Failed to read {}", paths::PATCH_NOTES))?;

    let mut patches = PatchListExtractor::new(&manifest).get_processed();
    sort_descending(&mut patches);
    Ok(patches)
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_manifest(root: &Path, contents: &str) {
        let path = root.join(paths::PATCH_NOTES);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_read_patches_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            r#""patches" {
                "a" { "patch_name" "patch_7.35" "patch_date" "2023-12-14" }
                "b" { "patch_name" "patch_7.35d" "patch_date" "2024-03-21" }
                "c" { "patch_name" "broken" }
            }"#,
        );

        let patches = read_patches(dir.path()).unwrap();
        let numbers: Vec<_> = patches.iter().map(|p| p.patch_number.as_str()).collect();
        assert_eq!(numbers, vec!["7.35d", "7.35"]);
        assert!(handle(dir.path(), OutputFormat::Table).is_ok());
    }

    #[test]
    fn test_missing_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_patches(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(paths::PATCH_NOTES));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_711_008_000), "2024-03-21 08:00 UTC");
    }
}
