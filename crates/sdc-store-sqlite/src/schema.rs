//! SQL schema for the SD Connect SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (store, key). Each row holds a whole JSON document and is
-- overwritten in full on every write.
CREATE TABLE IF NOT EXISTS documents (
    store       TEXT NOT NULL,
    key         TEXT NOT NULL,
    value_json  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,   -- ISO 8601 UTC
    PRIMARY KEY (store, key)
);

PRAGMA user_version = 1;
";
