//! SQLite-backed local persistence for labels and the bookmark slot.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::app_dirs;
use crate::bookmark::{Bookmark, BookmarkBackend, BookmarkError};
use crate::catalog::VideoId;

use super::{Label, LabelBackend, LabelMap, LabelStoreError};

/// Filename of the local review database.
pub const DB_FILE_NAME: &str = "review.db";

/// SQLite wrapper storing scoped labels plus the single bookmark slot.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Open (or create) the review database inside the given directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LabelStoreError> {
        let path = dir.as_ref().join(DB_FILE_NAME);
        let connection = Connection::open(path)?;
        let store = Self { connection };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self, OpenError> {
        let dir = app_dirs::data_dir()?;
        Ok(Self::open(dir)?)
    }

    fn apply_pragmas(&self) -> Result<(), LabelStoreError> {
        self.connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
        )?;
        Ok(())
    }

    fn apply_schema(&self) -> Result<(), LabelStoreError> {
        self.connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS labels (
                scope TEXT NOT NULL,
                video_id TEXT NOT NULL,
                label TEXT NOT NULL,
                PRIMARY KEY (scope, video_id)
            );
             CREATE TABLE IF NOT EXISTS bookmark (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                payload TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

/// Errors opening the default database location.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    AppDir(#[from] app_dirs::AppDirError),
    #[error(transparent)]
    Store(#[from] LabelStoreError),
}

impl LabelBackend for SqliteStore {
    fn scope_labels(&self, key: &str) -> Result<LabelMap, LabelStoreError> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT video_id, label FROM labels WHERE scope = ?1")?;
        let rows = stmt.query_map(params![key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut labels = LabelMap::new();
        for row in rows {
            let (id, raw) = row?;
            // Malformed values read as unlabeled.
            if let Some(label) = Label::parse(&raw) {
                labels.insert(VideoId::new(id), label);
            }
        }
        Ok(labels)
    }

    fn get_label(&self, key: &str, id: &VideoId) -> Result<Option<Label>, LabelStoreError> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT label FROM labels WHERE scope = ?1 AND video_id = ?2")?;
        let raw: Option<String> = stmt
            .query_row(params![key, id.as_str()], |row| row.get(0))
            .optional()?;
        Ok(raw.as_deref().and_then(Label::parse))
    }

    fn set_label(&self, key: &str, id: &VideoId, label: Label) -> Result<(), LabelStoreError> {
        let mut stmt = self.connection.prepare_cached(
            "INSERT INTO labels (scope, video_id, label) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope, video_id) DO UPDATE SET label = excluded.label",
        )?;
        stmt.execute(params![key, id.as_str(), label.as_str()])?;
        Ok(())
    }

    fn replace_scope(&self, key: &str, labels: &LabelMap) -> Result<(), LabelStoreError> {
        let tx = self.connection.unchecked_transaction()?;
        tx.execute("DELETE FROM labels WHERE scope = ?1", params![key])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO labels (scope, video_id, label) VALUES (?1, ?2, ?3)",
            )?;
            for (id, label) in labels {
                stmt.execute(params![key, id.as_str(), label.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_scope(&self, key: &str) -> Result<(), LabelStoreError> {
        self.connection
            .execute("DELETE FROM labels WHERE scope = ?1", params![key])?;
        Ok(())
    }

    fn scope_keys(&self) -> Result<Vec<String>, LabelStoreError> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT DISTINCT scope FROM labels ORDER BY scope")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl BookmarkBackend for SqliteStore {
    fn read(&self) -> Result<Option<Bookmark>, BookmarkError> {
        let mut stmt = self
            .connection
            .prepare_cached("SELECT payload FROM bookmark WHERE slot = 0")
            .map_err(LabelStoreError::from)?;
        let payload: Option<String> = stmt
            .query_row([], |row| row.get(0))
            .optional()
            .map_err(LabelStoreError::from)?;
        // A corrupt payload reads as no bookmark.
        Ok(payload.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    fn write(&self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        let payload = serde_json::to_string(bookmark)?;
        self.connection
            .execute(
                "INSERT INTO bookmark (slot, payload) VALUES (0, ?1)
                 ON CONFLICT(slot) DO UPDATE SET payload = excluded.payload",
                params![payload],
            )
            .map_err(LabelStoreError::from)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), BookmarkError> {
        self.connection
            .execute("DELETE FROM bookmark WHERE slot = 0", [])
            .map_err(LabelStoreError::from)?;
        Ok(())
    }
}
