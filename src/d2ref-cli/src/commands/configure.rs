//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up d2ref CLI defaults.

use crate::config::Config;
use anyhow::Result;
use d2ref::Language;
use std::path::PathBuf;

/// Handle the configure command
pub fn handle(
    archive: Option<PathBuf>,
    database: Option<PathBuf>,
    languages: Vec<Language>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if !apply(&mut config, archive, database, languages) {
        show_usage();
        return Ok(());
    }

    config.save()?;
    show_config(&config);
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Copy the given settings into `config`; false when nothing was given
fn apply(
    config: &mut Config,
    archive: Option<PathBuf>,
    database: Option<PathBuf>,
    languages: Vec<Language>,
) -> bool {
    let mut changed = false;

    if let Some(dir) = archive {
        config.archive_dir = Some(dir);
        changed = true;
    }
    if let Some(path) = database {
        config.database = Some(path);
        changed = true;
    }
    if !languages.is_empty() {
        config.languages = languages;
        changed = true;
    }

    changed
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.archive_dir {
        Some(dir) => println!("Archive: {}", dir.display()),
        None => println!("No archive directory configured"),
    }

    match &config.database {
        Some(path) => println!("Database: {}", path.display()),
        None => println!("Database: {} (default)", d2ref_db::DEFAULT_DB_PATH),
    }

    if config.languages.is_empty() {
        println!(
            "Languages: {} (default)",
            language_list(&[d2ref::DEFAULT_LANGUAGE])
        );
    } else {
        println!("Languages: {}", language_list(&config.languages));
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// "Russian (russian), German (german)"
fn language_list(languages: &[Language]) -> String {
    languages
        .iter()
        .map(|l| format!("{} ({})", l.display_name(), l.stem()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Show usage help for the configure command
fn show_usage() {
    println!(
        "Usage: d2ref configure --archive <DIR> [--database <FILE>] [--language <LANGUAGE>...]"
    );
    println!("   or: d2ref configure --show");
    println!();
    println!("Note: the archive directory is the game's unpacked content, the folder");
    println!("      that contains scripts/ and resource/.");
}
