//! KeyValues documents and archive access for Dota 2 game data
//!
//! The game ships its scripts and localization as KeyValues ("KV") text:
//! a recursive, ordered tree of named nodes where every node holds either a
//! string or a list of child nodes.
//!
//! ```text
//! "lang"
//! {
//!     "Language"  "English"
//!     "Tokens"
//!     {
//!         "DOTA_Tooltip_ability_axe_berserkers_call"  "Berserker's Call"
//!     }
//! }
//! ```
//!
//! # Layers
//!
//! - [`Archive`] / [`ArchiveSource`]: resolve archive paths to raw bytes.
//!   Decoding the packed container is left to whatever produced the archive;
//!   [`DirectoryArchive`] reads an unpacked archive tree and [`MemoryArchive`]
//!   serves files held in memory.
//! - [`parse`] / [`parse_bytes`]: KV text into a [`Document`] tree.
//! - [`DocumentProvider`]: one archive handle plus path → document loading.
//! - [`paths`]: the fixed archive paths the ingestion reads.

pub mod archive;
pub mod document;
pub mod parser;
pub mod paths;
pub mod provider;

pub use archive::{
    normalize_path, Archive, ArchiveSource, DirectoryArchive, DirectorySource, MemoryArchive,
    MemorySource,
};
pub use document::{Document, Node, Value};
pub use parser::{parse, parse_bytes, ParseError, ParseOptions};
pub use provider::{DocumentOptions, DocumentProvider};

/// Errors from archive access and document loading
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path not found in archive: {0}")]
    NotFound(String),

    #[error("Invalid KV document {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("Unsupported operation on {path}: {reason}")]
    Unsupported { path: String, reason: String },

    #[error("Archive integrity check failed: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the error means the path does not exist in the archive
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("scripts/npc/npc_heroes.txt".to_string());
        assert!(err.to_string().contains("scripts/npc/npc_heroes.txt"));
        assert!(err.is_not_found());

        let err = Error::Format {
            path: "resource/localization/dota_english.txt".to_string(),
            source: ParseError {
                line: 3,
                column: 7,
                message: "unterminated string".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("dota_english.txt"));
        assert!(msg.contains("line 3"));
        assert!(!err.is_not_found());

        let err = Error::Unsupported {
            path: "x.vdata_c".to_string(),
            reason: "compiled resources".to_string(),
        };
        assert!(err.to_string().contains("Unsupported operation"));
    }
}
