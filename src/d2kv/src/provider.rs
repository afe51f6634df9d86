//! Archive path → parsed document
//!
//! A [`DocumentProvider`] owns exactly one archive handle for its lifetime.
//! Reads take `&mut self`, so a provider cannot be shared between concurrent
//! tasks; each task opens its own from the [`ArchiveSource`].

use sha2::{Digest, Sha256};

use crate::archive::{Archive, ArchiveSource};
use crate::document::Document;
use crate::parser::{parse_bytes, ParseOptions};
use crate::{Error, Result};

/// Per-call loading options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Decode backslash escapes in quoted tokens
    pub escape_sequences: bool,
    /// The path is a compiled resource that must be extracted to KV text first
    pub compiled: bool,
}

impl DocumentOptions {
    /// Options used for localization files, which carry escaped newlines and quotes
    pub fn escaped() -> Self {
        Self {
            escape_sequences: true,
            compiled: false,
        }
    }
}

pub struct DocumentProvider {
    archive: Box<dyn Archive>,
    origin: String,
}

impl DocumentProvider {
    /// Acquire a fresh archive handle
    pub fn open(source: &dyn ArchiveSource) -> Result<Self> {
        let archive = source.open()?;
        let origin = source.describe();
        tracing::trace!(archive = %origin, "opened archive handle");
        Ok(Self { archive, origin })
    }

    /// Whether `path` exists, without reading it
    pub fn contains(&self, path: &str) -> bool {
        self.archive.contains(path)
    }

    /// Load and parse the document at `path`
    pub fn get_document(&mut self, path: &str, options: DocumentOptions) -> Result<Document> {
        let bytes = self.raw(path, options.compiled)?;
        let parse_options = ParseOptions {
            escape_sequences: options.escape_sequences,
        };
        parse_bytes(&bytes, parse_options).map_err(|source| Error::Format {
            path: path.to_string(),
            source,
        })
    }

    /// SHA-256 of the raw entry bytes, hex encoded
    pub fn checksum(&mut self, path: &str) -> Result<String> {
        let bytes = self.archive.read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Run the archive's integrity check
    pub fn verify(&mut self) -> Result<()> {
        self.archive.verify()
    }

    fn raw(&mut self, path: &str, compiled: bool) -> Result<Vec<u8>> {
        if compiled {
            self.archive.extract_compiled(path)
        } else {
            self.archive.read(path)
        }
    }
}

impl Drop for DocumentProvider {
    fn drop(&mut self) {
        tracing::trace!(archive = %self.origin, "released archive handle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemorySource;

    fn source() -> MemorySource {
        MemorySource::new([
            (
                "resource/localization/dota_english.txt",
                "\"lang\" { \"Tokens\" { \"k\" \"a\\\"b\" } }",
            ),
            ("scripts/broken.txt", "\"root\" {"),
        ])
    }

    #[test]
    fn test_get_document() {
        let mut provider = DocumentProvider::open(&source()).unwrap();
        let doc = provider
            .get_document(
                "resource/localization/dota_english.txt",
                DocumentOptions::escaped(),
            )
            .unwrap();
        let tokens = doc.root().unwrap().child("Tokens").unwrap();
        assert_eq!(tokens.child_text("k"), Some("a\"b"));

        assert!(provider.contains("Resource/Localization/dota_english.txt"));
        assert!(!provider.contains("scripts/npc/npc_heroes.txt"));
    }

    #[test]
    fn test_not_found_and_format_errors() {
        let mut provider = DocumentProvider::open(&source()).unwrap();

        let err = provider
            .get_document("scripts/npc/npc_heroes.txt", DocumentOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());

        let err = provider
            .get_document("scripts/broken.txt", DocumentOptions::default())
            .unwrap_err();
        match err {
            Error::Format { path, .. } => assert_eq!(path, "scripts/broken.txt"),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_compiled_option_routes_to_extraction() {
        let mut provider = DocumentProvider::open(&source()).unwrap();
        let options = DocumentOptions {
            escape_sequences: false,
            compiled: true,
        };
        let err = provider
            .get_document("resource/localization/dota_english.txt", options)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_checksum_is_stable() {
        let source = source();
        let mut a = DocumentProvider::open(&source).unwrap();
        let mut b = DocumentProvider::open(&source).unwrap();
        let first = a.checksum("scripts/broken.txt").unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, b.checksum("scripts/broken.txt").unwrap());
        assert_ne!(
            first,
            a.checksum("resource/localization/dota_english.txt").unwrap()
        );
        assert_eq!(source.open_count(), 2);
    }
}
