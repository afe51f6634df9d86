//! Storage for Dota 2 reference data
//!
//! A trait-based sink for the records an ingestion run produces, with a
//! SQLite implementation.
//!
//! # Example
//!
//! ```no_run
//! use d2ref_db::{ReferenceRepository, SqliteDb};
//! use d2ref::Language;
//!
//! let db = SqliteDb::open("d2ref.db").unwrap();
//! db.init().unwrap();
//!
//! for patch in db.list_patches().unwrap() {
//!     println!("{} {}", patch.patch_number, patch.timestamp);
//! }
//! let hits = db.search_patch_notes("Roshan", Language::English).unwrap();
//! ```

pub mod repository;
pub mod sqlite;

pub use repository::{ReferenceRepository, RepoError, RepoResult, ReplaceStats};
pub use sqlite::{SqliteDb, DEFAULT_DB_PATH};
