//! Local persistence for placement records.
//!
//! Records live as one pretty-printed JSON array under a single key of a
//! `SQLite` key/value table. Every save rewrites the whole collection in one
//! statement, so a reader never sees a half-written list.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{PlacementRecord, RecordId};

/// Key holding the serialized record collection.
pub const RECORDS_KEY: &str = "carnet_stages";

/// What a save did to the stored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record id was new and the record was appended.
    Inserted,
    /// A record with the same id was overwritten in place.
    Replaced,
}

/// Store for the saved placement records.
#[derive(Debug)]
pub struct RecordStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl RecordStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening record store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        debug!("Record store ready at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every saved record.
    ///
    /// A stored value that does not parse is logged and treated as an empty
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database itself cannot be read.
    pub fn load_all(&self) -> Result<Vec<PlacementRecord>> {
        let Some(raw) = self.read_raw(RECORDS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<PlacementRecord>>(&raw) {
            Ok(records) => {
                debug!("Loaded {} saved records", records.len());
                Ok(records)
            }
            Err(e) => {
                warn!("Error loading saved records, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Insert or replace `record` in the saved collection, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized or written.
    pub fn save(&self, record: &PlacementRecord) -> Result<SaveOutcome> {
        let mut records = self.load_all()?;

        let outcome = if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            existing.clone_from(record);
            SaveOutcome::Replaced
        } else {
            records.push(record.clone());
            SaveOutcome::Inserted
        };

        let raw = serde_json::to_string_pretty(&records)?;
        self.write_raw(RECORDS_KEY, &raw)?;

        debug!(
            "Saved record {} ({:?}, {} in collection)",
            record.id,
            outcome,
            records.len()
        );
        Ok(outcome)
    }

    /// Get a saved record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no saved record has this id.
    pub fn get(&self, id: &RecordId) -> Result<PlacementRecord> {
        self.load_all()?
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })
    }

    /// Number of saved records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub fn count(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let records = self.load_all()?;

        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT length(value), updated_at FROM local_store WHERE key = ?1",
                [RECORDS_KEY],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (payload_bytes, last_saved) = match row {
            Some((len, updated_at)) => (
                u64::try_from(len).unwrap_or(0),
                NaiveDateTime::parse_from_str(&updated_at, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.and_utc()),
            ),
            None => (0, None),
        };

        Ok(StoreStats {
            total_records: records.len(),
            total_photos: records.iter().map(PlacementRecord::photo_count).sum(),
            payload_bytes,
            last_saved,
        })
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_store WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO local_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            ",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Statistics about the saved collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of saved records.
    pub total_records: usize,
    /// Photos across all saved records.
    pub total_photos: usize,
    /// Size of the serialized collection in bytes.
    pub payload_bytes: u64,
    /// When the collection was last written.
    pub last_saved: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> RecordStore {
        RecordStore::open_in_memory().expect("failed to create test store")
    }

    fn create_test_record(id: &str, surname: &str) -> PlacementRecord {
        let mut record = PlacementRecord::with_id(RecordId::from(id));
        record.surname = surname.to_string();
        record
    }

    #[test]
    fn test_open_in_memory() {
        assert!(RecordStore::open_in_memory().is_ok());
    }

    #[test]
    fn test_load_all_empty() {
        let store = create_test_store();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_get() {
        let store = create_test_store();
        let record = create_test_record("1000", "Dupont");

        assert_eq!(store.save(&record).unwrap(), SaveOutcome::Inserted);

        let loaded = store.get(&RecordId::from("1000")).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_save_same_id_replaces() {
        let store = create_test_store();
        store.save(&create_test_record("1000", "Dupont")).unwrap();
        store.save(&create_test_record("2000", "Martin")).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let mut edited = create_test_record("1000", "Dupont");
        edited.location = "Atelier Bois".to_string();
        assert_eq!(store.save(&edited).unwrap(), SaveOutcome::Replaced);

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        // Replaced in place, order preserved
        assert_eq!(records[0].location, "Atelier Bois");
        assert_eq!(records[1].surname, "Martin");
    }

    #[test]
    fn test_get_nonexistent() {
        let store = create_test_store();
        let err = store.get(&RecordId::from("404")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_corrupt_collection_loads_empty() {
        let store = create_test_store();
        store.write_raw(RECORDS_KEY, "{not json").unwrap();

        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_save_over_corrupt_collection() {
        let store = create_test_store();
        store.write_raw(RECORDS_KEY, "[1, 2, 3]").unwrap();

        assert_eq!(
            store.save(&create_test_record("1", "Roux")).unwrap(),
            SaveOutcome::Inserted
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_stored_value_is_pretty_json_array() {
        let store = create_test_store();
        store.save(&create_test_record("7", "Petit")).unwrap();

        let raw = store.read_raw(RECORDS_KEY).unwrap().unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains('\n'));
        assert!(raw.contains("\"nom\": \"Petit\""));
    }

    #[test]
    fn test_stats() {
        let store = create_test_store();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_records, 0);
        assert_eq!(empty.payload_bytes, 0);
        assert!(empty.last_saved.is_none());

        store.save(&create_test_record("1", "A")).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.total_photos, 0);
        assert!(stats.payload_bytes > 0);
        assert!(stats.last_saved.is_some());
    }

    #[test]
    fn test_path() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("carnet.db");

        {
            let store = RecordStore::open(&db_path).unwrap();
            store.save(&create_test_record("42", "Durand")).unwrap();
            assert_eq!(store.path(), db_path);
        }

        let reopened = RecordStore::open(&db_path).unwrap();
        let records = reopened.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].surname, "Durand");
    }

    #[test]
    fn test_unicode_content_round_trips() {
        let store = create_test_store();
        let mut record = create_test_record("9", "Lefèvre");
        record.entries[0].description = "Assemblage à queue d’aronde".to_string();
        store.save(&record).unwrap();

        let loaded = store.get(&record.id).unwrap();
        assert_eq!(loaded.entries[0].description, "Assemblage à queue d’aronde");
    }
}
