//! SQLite implementation using rusqlite.
//!
//! Records are stored as JSON alongside the columns needed to key, order
//! and search them.

use std::collections::HashSet;
use std::path::Path;

use d2ref::text::collapse_whitespace;
use d2ref::{Entity, Language, Patch, PatchNote};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::repository::*;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "share/d2ref.db";

/// SQLite-backed reference database
pub struct SqliteDb {
    conn: Connection,
}

impl SqliteDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Check if a migration has been applied
    fn is_migration_applied(&self, version: &str) -> RepoResult<bool> {
        let result: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result.is_some())
    }

    /// Mark a migration as applied
    fn mark_migration_applied(&self, version: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![version],
        )?;
        Ok(())
    }

    /// Run pending migrations
    fn run_migrations(&self) -> RepoResult<()> {
        if !self.is_migration_applied("0001_base_schema")? {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS patches (
                    patch_number TEXT PRIMARY KEY NOT NULL,
                    timestamp INTEGER NOT NULL,
                    position INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS patch_notes (
                    patch_number TEXT NOT NULL,
                    internal_name TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    category TEXT NOT NULL,
                    timestamp INTEGER NOT NULL,
                    search_text TEXT NOT NULL,
                    data TEXT NOT NULL,
                    PRIMARY KEY (patch_number, internal_name, locale)
                );

                CREATE INDEX IF NOT EXISTS idx_patch_notes_locale
                    ON patch_notes(locale, timestamp);

                CREATE TABLE IF NOT EXISTS entities (
                    internal_name TEXT PRIMARY KEY NOT NULL,
                    entity_id INTEGER NOT NULL,
                    entity_type TEXT NOT NULL,
                    data TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type);
                "#,
            )?;
            self.mark_migration_applied("0001_base_schema")?;
        }

        Ok(())
    }

    /// Row counts of (patches, patch notes, entities)
    pub fn stats(&self) -> RepoResult<(usize, usize, usize)> {
        let count = |table: &str| -> RepoResult<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok((count("patches")?, count("patch_notes")?, count("entities")?))
    }
}

/// Delete rows of `table` whose single-column key is not in `keep`
fn delete_absent(
    tx: &Transaction<'_>,
    table: &str,
    key_column: &str,
    keep: &HashSet<String>,
) -> RepoResult<usize> {
    let existing: Vec<String> = {
        let mut stmt = tx.prepare(&format!("SELECT {} FROM {}", key_column, table))?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };

    let mut removed = 0;
    for key in existing.iter().filter(|k| !keep.contains(*k)) {
        removed += tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", table, key_column),
            params![key],
        )?;
    }
    Ok(removed)
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ReferenceRepository for SqliteDb {
    fn init(&self) -> RepoResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )?;
        self.run_migrations()
    }

    fn replace_patches(&self, patches: &[Patch]) -> RepoResult<ReplaceStats> {
        let tx = self.conn.unchecked_transaction()?;
        let mut keep = HashSet::with_capacity(patches.len());

        for (position, patch) in patches.iter().enumerate() {
            tx.execute(
                "INSERT INTO patches (patch_number, timestamp, position) VALUES (?1, ?2, ?3)
                 ON CONFLICT(patch_number) DO UPDATE SET
                    timestamp = excluded.timestamp,
                    position = excluded.position",
                params![patch.patch_number, patch.timestamp, position as i64],
            )?;
            keep.insert(patch.patch_number.clone());
        }

        let removed = delete_absent(&tx, "patches", "patch_number", &keep)?;
        tx.commit()?;

        tracing::info!(upserted = patches.len(), removed, "stored patches");
        Ok(ReplaceStats {
            upserted: patches.len(),
            removed,
        })
    }

    fn replace_patch_notes(&self, notes: &[PatchNote]) -> RepoResult<ReplaceStats> {
        let tx = self.conn.unchecked_transaction()?;
        let mut keep = HashSet::with_capacity(notes.len());

        for note in notes {
            let key = note.key();
            tx.execute(
                "INSERT INTO patch_notes
                    (patch_number, internal_name, locale, category, timestamp, search_text, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(patch_number, internal_name, locale) DO UPDATE SET
                    category = excluded.category,
                    timestamp = excluded.timestamp,
                    search_text = excluded.search_text,
                    data = excluded.data",
                params![
                    key.patch_number,
                    key.internal_name,
                    key.locale,
                    note.body.category().section(),
                    note.timestamp,
                    note.body.search_text(),
                    serde_json::to_string(note)?,
                ],
            )?;
            keep.insert((key.patch_number, key.internal_name, key.locale));
        }

        let existing: Vec<(String, String, String)> = {
            let mut stmt =
                tx.prepare("SELECT patch_number, internal_name, locale FROM patch_notes")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
            rows.collect::<Result<_, _>>()?
        };
        let mut removed = 0;
        for (patch_number, internal_name, locale) in existing.iter().filter(|k| !keep.contains(*k))
        {
            removed += tx.execute(
                "DELETE FROM patch_notes
                 WHERE patch_number = ?1 AND internal_name = ?2 AND locale = ?3",
                params![patch_number, internal_name, locale],
            )?;
        }
        tx.commit()?;

        tracing::info!(upserted = notes.len(), removed, "stored patch notes");
        Ok(ReplaceStats {
            upserted: notes.len(),
            removed,
        })
    }

    fn replace_entities(&self, entities: &[Entity]) -> RepoResult<ReplaceStats> {
        let tx = self.conn.unchecked_transaction()?;
        let mut keep = HashSet::with_capacity(entities.len());

        for entity in entities {
            tx.execute(
                "INSERT INTO entities (internal_name, entity_id, entity_type, data)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(internal_name) DO UPDATE SET
                    entity_id = excluded.entity_id,
                    entity_type = excluded.entity_type,
                    data = excluded.data",
                params![
                    entity.internal_name,
                    entity.entity_id,
                    entity.entity_type.label(),
                    serde_json::to_string(entity)?,
                ],
            )?;
            keep.insert(entity.internal_name.clone());
        }

        let removed = delete_absent(&tx, "entities", "internal_name", &keep)?;
        tx.commit()?;

        tracing::info!(upserted = entities.len(), removed, "stored entities");
        Ok(ReplaceStats {
            upserted: entities.len(),
            removed,
        })
    }

    fn get_patch(&self, patch_number: &str) -> RepoResult<Option<Patch>> {
        let patch = self
            .conn
            .query_row(
                "SELECT patch_number, timestamp FROM patches WHERE patch_number = ?1",
                params![patch_number],
                |row| {
                    Ok(Patch {
                        patch_number: row.get(0)?,
                        timestamp: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(patch)
    }

    fn list_patches(&self) -> RepoResult<Vec<Patch>> {
        let mut stmt = self.conn.prepare(
            "SELECT patch_number, timestamp FROM patches ORDER BY timestamp DESC, position ASC",
        )?;
        let patches = stmt
            .query_map([], |row| {
                Ok(Patch {
                    patch_number: row.get(0)?,
                    timestamp: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patches)
    }

    fn get_patch_note(
        &self,
        patch_number: &str,
        internal_name: &str,
        language: Language,
    ) -> RepoResult<Option<PatchNote>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM patch_notes
                 WHERE patch_number = ?1 AND internal_name = ?2 AND locale = ?3",
                params![patch_number, internal_name, language.locale()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(RepoError::from)
    }

    fn search_patch_notes(&self, text: &str, language: Language) -> RepoResult<Vec<PatchNote>> {
        let pattern = format!("%{}%", escape_like(&collapse_whitespace(text)));
        let mut stmt = self.conn.prepare(
            "SELECT data FROM patch_notes
             WHERE locale = ?1 AND search_text LIKE ?2 ESCAPE '\\'
             ORDER BY timestamp DESC, patch_number, internal_name",
        )?;
        let rows = stmt
            .query_map(params![language.locale(), pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(RepoError::from))
            .collect()
    }

    fn get_entity(&self, internal_name: &str) -> RepoResult<Option<Entity>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM entities WHERE internal_name = ?1",
                params![internal_name],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(RepoError::from)
    }
}
