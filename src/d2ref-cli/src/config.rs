//! Configuration management for d2ref CLI

use anyhow::{Context, Result};
use d2ref::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Unpacked game archive directory
    pub archive_dir: Option<PathBuf>,
    /// Database file
    pub database: Option<PathBuf>,
    /// Languages ingested when none are given on the command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<Language>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("d2ref");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Archive directory from the flag, falling back to the configured one
    pub fn resolve_archive(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.archive_dir.clone()).context(
            "No archive directory given. Pass --archive, set D2REF_ARCHIVE, \
             or run: d2ref configure --archive <dir>",
        )
    }

    /// Database file from the flag, the config, or the default location
    pub fn resolve_database(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(d2ref_db::DEFAULT_DB_PATH))
    }

    /// Languages from the command line, else the configured ones
    pub fn resolve_languages(&self, flag: Vec<Language>) -> Vec<Language> {
        if flag.is_empty() {
            self.languages.clone()
        } else {
            flag
        }
    }
}
