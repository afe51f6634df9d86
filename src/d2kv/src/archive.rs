//! Archive access
//!
//! Archive paths are `/`-separated and case-insensitive, like the game's own
//! package lookups. An [`ArchiveSource`] hands out independent [`Archive`]
//! handles so concurrent work never shares one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::{Error, Result};

/// One open handle onto an archive
pub trait Archive: Send {
    /// Whether the path exists in the archive
    fn contains(&self, path: &str) -> bool;

    /// Read the raw bytes stored at a path
    fn read(&mut self, path: &str) -> Result<Vec<u8>>;

    /// Check the archive for corruption
    fn verify(&mut self) -> Result<()> {
        Ok(())
    }

    /// Extract a compiled resource to its underlying KV text
    fn extract_compiled(&mut self, path: &str) -> Result<Vec<u8>> {
        Err(Error::Unsupported {
            path: path.to_string(),
            reason: "compiled resource extraction is not available for this archive".to_string(),
        })
    }
}

/// Opens fresh archive handles
pub trait ArchiveSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn Archive>>;

    /// Human-readable origin for log messages
    fn describe(&self) -> String;
}

/// Normalize an archive path: forward slashes, no leading slash, lowercase
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_ascii_lowercase()
}

// ============================================================================
// Unpacked archive on disk
// ============================================================================

/// Normalized path → file map of an unpacked directory tree
#[derive(Debug)]
struct DirectoryIndex {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
}

impl DirectoryIndex {
    fn build(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotFound(root.display().to_string()));
        }

        let mut files = HashMap::new();
        for entry in walkdir::WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let entry_path = entry.path();
            if !entry_path.is_file() {
                continue;
            }
            if let Ok(relative) = entry_path.strip_prefix(root) {
                let key = normalize_path(&relative.to_string_lossy());
                files.insert(key, entry_path.to_path_buf());
            }
        }

        tracing::debug!(root = %root.display(), files = files.len(), "indexed archive directory");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }
}

/// Archive backed by an unpacked directory tree
#[derive(Debug)]
pub struct DirectoryArchive {
    index: Arc<DirectoryIndex>,
}

impl DirectoryArchive {
    /// Open a directory and index every file below it
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            index: Arc::new(DirectoryIndex::build(root.as_ref())?),
        })
    }
}

impl Archive for DirectoryArchive {
    fn contains(&self, path: &str) -> bool {
        self.index.files.contains_key(&normalize_path(path))
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let file = self
            .index
            .files
            .get(&normalize_path(path))
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        std::fs::read(file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
            _ => Error::Io(e),
        })
    }

    fn verify(&mut self) -> Result<()> {
        match self.index.files.iter().find(|(_, file)| !file.is_file()) {
            Some((key, _)) => Err(Error::Corrupt(format!(
                "{} disappeared from {}",
                key,
                self.index.root.display()
            ))),
            None => Ok(()),
        }
    }
}

/// Opens [`DirectoryArchive`] handles over one shared index
///
/// The tree is walked on the first `open`; later handles reuse that index, so
/// files added afterwards are not visible through this source.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    index: OnceCell<Arc<DirectoryIndex>>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index: OnceCell::new(),
        }
    }

    fn index(&self) -> Result<Arc<DirectoryIndex>> {
        self.index
            .get_or_try_init(|| DirectoryIndex::build(&self.root).map(Arc::new))
            .map(Arc::clone)
    }
}

impl ArchiveSource for DirectorySource {
    fn open(&self) -> Result<Box<dyn Archive>> {
        Ok(Box::new(DirectoryArchive {
            index: self.index()?,
        }))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// ============================================================================
// In-memory archive
// ============================================================================

/// Archive over shared in-memory files
pub struct MemoryArchive {
    files: Arc<HashMap<String, Vec<u8>>>,
}

impl Archive for MemoryArchive {
    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }
}

/// Source of [`MemoryArchive`] handles; counts how many were opened
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<HashMap<String, Vec<u8>>>,
    opened: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: AsRef<str>,
        B: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(path, bytes)| (normalize_path(path.as_ref()), bytes.into()))
            .collect();
        Self {
            files: Arc::new(files),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handles opened so far
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl ArchiveSource for MemorySource {
    fn open(&self) -> Result<Box<dyn Archive>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryArchive {
            files: Arc::clone(&self.files),
        }))
    }

    fn describe(&self) -> String {
        format!("memory archive ({} files)", self.files.len())
    }
}
