//! [`SqliteStore`]: the SQLite implementation of [`KvStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use sdc_core::kv::KvStore;
use serde_json::Value;

use crate::{Error, Result, schema::SCHEMA};

/// A durable document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl KvStore for SqliteStore {
  type Error = Error;

  async fn get<'a>(&'a self, store: &'a str, key: &'a str) -> Result<Option<Value>> {
    let (store_owned, key_owned) = (store.to_owned(), key.to_owned());
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT value_json FROM documents WHERE store = ?1 AND key = ?2",
            rusqlite::params![store_owned, key_owned],
            |r| r.get(0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|s| serde_json::from_str(&s))
      .transpose()
      .map_err(|source| Error::Json {
        store: store.to_owned(),
        key: key.to_owned(),
        source,
      })
  }

  async fn set<'a>(&'a self, store: &'a str, key: &'a str, value: Value) -> Result<()> {
    let value_json = value.to_string();
    let updated_at = Utc::now().to_rfc3339();
    let (store_owned, key_owned) = (store.to_owned(), key.to_owned());

    tracing::debug!(store, key, bytes = value_json.len(), "writing document");
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (store, key, value_json, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (store, key)
           DO UPDATE SET value_json = excluded.value_json,
                         updated_at = excluded.updated_at",
          rusqlite::params![store_owned, key_owned, value_json, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
