//! The `KvStore` trait and the in-memory backend.
//!
//! A key-value store holds whole JSON documents addressed by
//! `(store_name, key)`. It is the only persistence primitive the repositories
//! use. Writes are last-writer-wins at the granularity of one key; there is no
//! transaction across keys or across callers.

use std::{collections::HashMap, convert::Infallible, future::Future};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{Error, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a JSON document store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait KvStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the document stored under `(store, key)`, or `None` if absent.
  fn get<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Unconditionally overwrite the document stored under `(store, key)`.
  fn set<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Read and deserialize a document. Backend failures become
/// [`Error::Store`].
pub(crate) async fn load_json<S, T>(
  kv: &S,
  store: &str,
  key: &str,
) -> Result<Option<T>>
where
  S: KvStore,
  T: DeserializeOwned,
{
  match kv.get(store, key).await.map_err(Error::store)? {
    Some(value) => Ok(Some(serde_json::from_value(value)?)),
    None => Ok(None),
  }
}

/// Serialize and write a document.
pub(crate) async fn save_json<S, T>(
  kv: &S,
  store: &str,
  key: &str,
  value: &T,
) -> Result<()>
where
  S: KvStore,
  T: Serialize + ?Sized,
{
  let value = serde_json::to_value(value)?;
  kv.set(store, key, value).await.map_err(Error::store)
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local store, used when no durable backend is configured.
///
/// Documents are cloned on every read and write, so a caller mutating a
/// document it fetched never changes what the store holds.
#[derive(Debug, Default)]
pub struct MemoryStore {
  stores: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KvStore for MemoryStore {
  type Error = Infallible;

  async fn get<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
  ) -> Result<Option<Value>, Infallible> {
    let stores = self.stores.read().await;
    Ok(stores.get(store).and_then(|docs| docs.get(key)).cloned())
  }

  async fn set<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
    value: Value,
  ) -> Result<(), Infallible> {
    tracing::debug!(store, key, "writing document");
    let mut stores = self.stores.write().await;
    stores
      .entry(store.to_owned())
      .or_default()
      .insert(key.to_owned(), value);
    Ok(())
  }
}

/// A [`MemoryStore`] whose first `get` returns its read only after a delay,
/// so a concurrent caller can act on the same key in between.
#[cfg(test)]
pub(crate) struct SlowFirstGet {
  inner:   MemoryStore,
  delayed: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl SlowFirstGet {
  pub(crate) fn new() -> Self {
    Self {
      inner:   MemoryStore::new(),
      delayed: std::sync::atomic::AtomicBool::new(false),
    }
  }
}

#[cfg(test)]
impl KvStore for SlowFirstGet {
  type Error = Infallible;

  async fn get<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
  ) -> Result<Option<Value>, Infallible> {
    let value = self.inner.get(store, key).await;
    if !self.delayed.swap(true, std::sync::atomic::Ordering::SeqCst) {
      tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    value
  }

  async fn set<'a>(
    &'a self,
    store: &'a str,
    key: &'a str,
    value: Value,
  ) -> Result<(), Infallible> {
    self.inner.set(store, key, value).await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn missing_key_is_none() {
    let kv = MemoryStore::new();
    assert!(kv.get("profiles_data", "all_profiles").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn stores_are_independent_namespaces() {
    let kv = MemoryStore::new();
    kv.set("a", "k", json!(1)).await.unwrap();
    kv.set("b", "k", json!(2)).await.unwrap();
    assert_eq!(kv.get("a", "k").await.unwrap(), Some(json!(1)));
    assert_eq!(kv.get("b", "k").await.unwrap(), Some(json!(2)));
  }

  #[tokio::test]
  async fn mutating_a_read_does_not_alias_the_store() {
    let kv = MemoryStore::new();
    kv.set("s", "k", json!([1, 2])).await.unwrap();

    let mut doc = kv.get("s", "k").await.unwrap().unwrap();
    doc.as_array_mut().unwrap().push(json!(3));

    assert_eq!(kv.get("s", "k").await.unwrap(), Some(json!([1, 2])));
  }

  #[tokio::test]
  async fn set_overwrites() {
    let kv = MemoryStore::new();
    kv.set("s", "k", json!({"v": 1})).await.unwrap();
    kv.set("s", "k", json!({"v": 2})).await.unwrap();
    assert_eq!(kv.get("s", "k").await.unwrap(), Some(json!({"v": 2})));
  }
}
