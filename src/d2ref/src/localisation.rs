//! Localised value table
//!
//! [`build`] loads every requested (category, language) file concurrently and
//! merges them into one immutable [`LocalisedValues`]. A (language, key) pair
//! may only ever be inserted once: a second insertion aborts the whole build.
//!
//! ```no_run
//! # async fn example() -> d2ref::Result<()> {
//! use std::sync::Arc;
//! use d2kv::DirectorySource;
//! use d2ref::localisation::{self, Category, LocalisationRequest};
//! use d2ref::{text, Language};
//!
//! let request = LocalisationRequest::new()
//!     .with_category(Category::Abilities, Some(text::clean_markup))
//!     .with_category(Category::PatchNotes, Some(text::clean_markup));
//!
//! let source = Arc::new(DirectorySource::new("game/dota"));
//! let languages = [Language::English, Language::Russian];
//! let values = localisation::build(request, source, &languages).await?;
//! let name = values.get_or_default(Language::Russian, "DOTA_Tooltip_ability_item_blink");
//! # Ok(())
//! # }
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use d2kv::{paths, ArchiveSource, Document, DocumentOptions, DocumentProvider, Node};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::language::{Language, DEFAULT_LANGUAGE};
use crate::{Error, Result};

/// Child node holding the strings in a tokens-shaped file
const TOKENS_NODE: &str = "Tokens";

/// Prefix of the English reference copies embedded in translated files
const ENGLISH_REFERENCE_PREFIX: &str = "[english]";

/// Raw string → display string
pub type Transform = fn(&str) -> String;

/// Where the strings sit inside a localization document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Strings are children of a `Tokens` node under the root
    Tokens,
    /// Strings are the root's own children
    FlatChildren,
}

/// A family of per-language localization files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Abilities,
    Dota,
    HeroLore,
    PatchNotes,
}

struct CategoryInfo {
    category: Category,
    template: &'static str,
    shape: Shape,
}

const CATEGORIES: &[CategoryInfo] = &[
    CategoryInfo {
        category: Category::Abilities,
        template: paths::LOCALIZATION_ABILITIES,
        shape: Shape::Tokens,
    },
    CategoryInfo {
        category: Category::Dota,
        template: paths::LOCALIZATION_DOTA,
        shape: Shape::Tokens,
    },
    CategoryInfo {
        category: Category::HeroLore,
        template: paths::LOCALIZATION_HERO_LORE,
        shape: Shape::Tokens,
    },
    CategoryInfo {
        category: Category::PatchNotes,
        template: paths::LOCALIZATION_PATCH_NOTES,
        shape: Shape::FlatChildren,
    },
];

impl Category {
    fn info(self) -> &'static CategoryInfo {
        CATEGORIES
            .iter()
            .find(|c| c.category == self)
            .unwrap_or(&CATEGORIES[0])
    }

    /// Archive path of this category's file for a language
    pub fn path(self, language: Language) -> String {
        paths::expand(self.info().template, language.stem())
    }

    pub fn shape(self) -> Shape {
        self.info().shape
    }
}

/// One requested category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRequest {
    pub category: Category,
    pub transform: Option<Transform>,
}

/// Categories to load, built up before a single call to [`build`]
#[derive(Debug, Clone, Default)]
pub struct LocalisationRequest {
    categories: Vec<CategoryRequest>,
}

impl LocalisationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a category. Requesting the same category again is a no-op;
    /// the first transform wins.
    pub fn with_category(mut self, category: Category, transform: Option<Transform>) -> Self {
        if !self.categories.iter().any(|c| c.category == category) {
            self.categories.push(CategoryRequest {
                category,
                transform,
            });
        }
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().map(|c| c.category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Immutable (language, key) → string table
#[derive(Debug, Clone, Default)]
pub struct LocalisedValues {
    entries: HashMap<Language, HashMap<String, String>>,
}

impl LocalisedValues {
    /// Build a table from explicit entries, applying the same duplicate rule as [`build`]
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Language, K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let accumulator = Accumulator::default();
        let mut grouped: HashMap<Language, Vec<(String, String)>> = HashMap::new();
        for (language, key, value) in entries {
            grouped
                .entry(language)
                .or_default()
                .push((key.into(), value.into()));
        }
        for (language, pairs) in grouped {
            accumulator.insert_all(language, pairs, "<memory>")?;
        }
        Ok(accumulator.finish())
    }

    /// Exact lookup
    pub fn get(&self, language: Language, key: &str) -> Option<&str> {
        self.entries
            .get(&language)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// Lookup falling back to the default language when `language` lacks the key
    pub fn get_or_default(&self, language: Language, key: &str) -> Option<&str> {
        self.get(language, key)
            .or_else(|| self.get(DEFAULT_LANGUAGE, key))
    }

    /// Total number of (language, key) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Languages with at least one entry, sorted
    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(l, _)| *l)
            .collect();
        languages.sort();
        languages
    }
}

/// Shared insertion target for concurrent loads
#[derive(Default)]
struct Accumulator {
    entries: Mutex<HashMap<Language, HashMap<String, String>>>,
    aborted: AtomicBool,
}

impl Accumulator {
    /// Insert every pair or fail on the first (language, key) already present
    fn insert_all(
        &self,
        language: Language,
        pairs: Vec<(String, String)>,
        path: &str,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let table = entries.entry(language).or_default();

        for (key, value) in pairs {
            match table.entry(key) {
                Entry::Occupied(existing) => {
                    return Err(Error::DuplicateKey {
                        language,
                        key: existing.key().clone(),
                        path: path.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }

        Ok(())
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn finish(&self) -> LocalisedValues {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        LocalisedValues {
            entries: std::mem::take(&mut *entries),
        }
    }
}

/// Load every requested (category, language) pair and merge the results
///
/// One blocking task per pair, each with its own archive handle. The first
/// failure aborts the build and is returned; nothing partial escapes.
pub async fn build(
    request: LocalisationRequest,
    source: Arc<dyn ArchiveSource>,
    languages: &[Language],
) -> Result<LocalisedValues> {
    let mut unique_languages: Vec<Language> = Vec::with_capacity(languages.len());
    for &language in languages {
        if !unique_languages.contains(&language) {
            unique_languages.push(language);
        }
    }

    let accumulator = Arc::new(Accumulator::default());
    let mut tasks = JoinSet::new();

    for &category in &request.categories {
        for &language in &unique_languages {
            let source = Arc::clone(&source);
            let accumulator = Arc::clone(&accumulator);
            tasks.spawn_blocking(move || load(source.as_ref(), category, language, &accumulator));
        }
    }

    tracing::info!(
        archive = %source.describe(),
        categories = request.categories.len(),
        languages = unique_languages.len(),
        tasks = tasks.len(),
        "loading localization"
    );

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(Error::Task).and_then(|r| r);
        if let Err(e) = outcome {
            accumulator.abort();
            tasks.abort_all();
            tracing::error!(error = %e, "localization build aborted");
            return Err(e);
        }
    }

    let values = accumulator.finish();
    tracing::info!(entries = values.len(), "localization table built");
    Ok(values)
}

fn load(
    source: &dyn ArchiveSource,
    request: CategoryRequest,
    language: Language,
    accumulator: &Accumulator,
) -> Result<()> {
    if accumulator.is_aborted() {
        return Ok(());
    }

    let path = request.category.path(language);
    let document = DocumentProvider::open(source)
        .and_then(|mut provider| provider.get_document(&path, DocumentOptions::escaped()))
        .map_err(|source| Error::Load {
            path: path.clone(),
            language,
            source,
        })?;

    let pairs = collect_pairs(&document, request.category.shape(), request.transform);
    if pairs.is_empty() {
        tracing::warn!(path = %path, language = %language, "localization file has no strings");
    }

    if accumulator.is_aborted() {
        return Ok(());
    }

    let count = pairs.len();
    accumulator.insert_all(language, pairs, &path)?;
    tracing::debug!(path = %path, language = %language, count, "loaded localization file");
    Ok(())
}

fn collect_pairs(
    document: &Document,
    shape: Shape,
    transform: Option<Transform>,
) -> Vec<(String, String)> {
    let nodes: &[Node] = match shape {
        Shape::Tokens => document
            .root()
            .and_then(|root| root.child(TOKENS_NODE))
            .map(Node::children)
            .unwrap_or(&[]),
        Shape::FlatChildren => document.root_children(),
    };

    nodes
        .iter()
        .filter(|node| !node.name.starts_with(ENGLISH_REFERENCE_PREFIX))
        .filter_map(|node| {
            let raw = node.as_text()?;
            let value = match transform {
                Some(f) => f(raw),
                None => raw.to_string(),
            };
            Some((node.name.clone(), value))
        })
        .collect()
}
