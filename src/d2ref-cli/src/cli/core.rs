//! Core CLI definitions

use clap::{Parser, Subcommand, ValueEnum};
use d2ref::Language;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "d2ref")]
#[command(about = "Dota 2 reference data ingestion", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build localized reference data from an unpacked archive and store it
    #[command(visible_alias = "i")]
    Ingest {
        /// Unpacked game archive directory (uses configured default if not provided)
        #[arg(short, long, env = "D2REF_ARCHIVE")]
        archive: Option<PathBuf>,

        /// Database file (uses configured default if not provided)
        #[arg(short, long, env = "D2REF_DATABASE")]
        database: Option<PathBuf>,

        /// Language to ingest, by file stem or locale (repeatable)
        #[arg(short, long = "language", value_name = "LANGUAGE")]
        languages: Vec<Language>,

        /// Also load hero lore strings
        #[arg(long)]
        hero_lore: bool,

        /// Build everything but do not write the database
        #[arg(long)]
        dry_run: bool,
    },

    /// List patches found in the archive, newest first
    #[command(visible_alias = "p")]
    Patches {
        /// Unpacked game archive directory (uses configured default if not provided)
        #[arg(short, long, env = "D2REF_ARCHIVE")]
        archive: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Parse special bonus values such as "+25%", "x2" or "=3"
    #[command(visible_alias = "sv")]
    SpecialValue {
        /// Values to parse
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default archive directory
        #[arg(long)]
        archive: Option<PathBuf>,

        /// Set default database file
        #[arg(long)]
        database: Option<PathBuf>,

        /// Set default languages (repeatable)
        #[arg(long = "language", value_name = "LANGUAGE")]
        languages: Vec<Language>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_languages() {
        let cli = Cli::try_parse_from([
            "d2ref",
            "ingest",
            "--archive",
            "/games/dota",
            "-l",
            "russian",
            "--language",
            "pt-BR",
        ])
        .unwrap();

        match cli.command {
            Commands::Ingest {
                archive, languages, ..
            } => {
                assert_eq!(archive, Some(PathBuf::from("/games/dota")));
                assert_eq!(languages, vec![Language::Russian, Language::Brazilian]);
            }
            _ => panic!("expected ingest"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["d2ref", "ingest", "-l", "klingon"]).is_err());
    }

    #[test]
    fn test_parse_special_values_with_leading_signs() {
        let cli = Cli::try_parse_from(["d2ref", "special-value", "+-5", "-10", "x2"]).unwrap();
        match cli.command {
            Commands::SpecialValue { values, format } => {
                assert_eq!(values, vec!["+-5", "-10", "x2"]);
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected special-value"),
        }
    }
}
