//! `SQLite` schema definitions for carnet.
//!
//! The store mirrors a browser's local storage: a single key/value table
//! whose values are serialized documents, plus a metadata table for the
//! schema version.

/// SQL statement to create the key/value table.
pub const CREATE_LOCAL_STORE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS local_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_LOCAL_STORE_TABLE, CREATE_METADATA_TABLE];
