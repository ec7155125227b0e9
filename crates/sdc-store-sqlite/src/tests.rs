//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use sdc_core::{
  conversation::{ConversationRepository, Message},
  credit::CreditLedger,
  kv::KvStore,
  profile::ProfileRepository,
  vote::{VoteChoice, cast_vote},
};
use serde_json::json;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Raw documents ───────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_document_is_none() {
  let s = store().await;
  assert!(s.get("profiles_data", "all_profiles").await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get() {
  let s = store().await;
  s.set("credits_data", "42", json!(10)).await.unwrap();
  assert_eq!(s.get("credits_data", "42").await.unwrap(), Some(json!(10)));
}

#[tokio::test]
async fn set_overwrites_whole_document() {
  let s = store().await;
  s.set("s", "k", json!({"a": 1, "b": 2})).await.unwrap();
  s.set("s", "k", json!({"a": 3})).await.unwrap();
  assert_eq!(s.get("s", "k").await.unwrap(), Some(json!({"a": 3})));
}

#[tokio::test]
async fn same_key_in_different_stores() {
  let s = store().await;
  s.set("one", "k", json!("first")).await.unwrap();
  s.set("two", "k", json!("second")).await.unwrap();
  assert_eq!(s.get("one", "k").await.unwrap(), Some(json!("first")));
  assert_eq!(s.get("two", "k").await.unwrap(), Some(json!("second")));
}

#[tokio::test]
async fn documents_survive_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("sdc.sqlite3");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set("credits_data", "7", json!(3)).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get("credits_data", "7").await.unwrap(), Some(json!(3)));
}

// ─── Repositories on SQLite ──────────────────────────────────────────────────

#[tokio::test]
async fn profiles_seed_once_and_vote_persists() {
  let kv = Arc::new(store().await);
  let profiles = ProfileRepository::new(kv.clone());

  let seeded = profiles.list().await.unwrap();
  assert!(!seeded.is_empty());
  assert_eq!(profiles.list().await.unwrap().len(), seeded.len());

  cast_vote(&profiles, 5, 3, VoteChoice::NotMet).await.unwrap();
  let reread = ProfileRepository::new(kv).get(3).await.unwrap().unwrap();
  assert_eq!(reread.not_met_count, 1);
  assert_eq!(reread.votes.len(), 1);
}

#[tokio::test]
async fn credits_on_sqlite() {
  let kv = Arc::new(store().await);
  let ledger = CreditLedger::new(kv);
  assert_eq!(ledger.balance(42).await.unwrap(), 10);
  assert_eq!(ledger.spend(42, 1).await.unwrap(), 9);
  assert_eq!(ledger.spend(42, 20).await.unwrap(), 0);
}

#[tokio::test]
async fn appended_message_is_stored() {
  let kv = Arc::new(store().await);
  let conversations = ConversationRepository::new(kv);
  let message = Message::new(1, "hello from sqlite");
  conversations.append_message(2, message.clone()).await.unwrap();

  let convo = conversations
    .list()
    .await
    .unwrap()
    .into_iter()
    .find(|c| c.id == 2)
    .unwrap();
  assert_eq!(convo.messages.last(), Some(&message));
}
