//! Conversations, messages and the conversation repository.
//!
//! All conversations live in a single JSON array under
//! `(`[`CONVERSATIONS_STORE`]`, `[`CONVERSATIONS_KEY`]`)`. Messages within a
//! conversation are append-only; their order is chronological order.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  kv::{KvStore, load_json, save_json},
  profile::{Profile, ProfileId},
  seed,
};

pub const CONVERSATIONS_STORE: &str = "conversations_data";
pub const CONVERSATIONS_KEY: &str = "all_conversations";

/// Conversation ids `<= 0` denote conversations that exist only on a client
/// and have never been persisted.
pub type ConversationId = i64;

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub id:        Uuid,
  pub sender_id: ProfileId,
  pub text:      String,
  pub timestamp: DateTime<Utc>,
}

impl Message {
  /// A new message with a fresh random id, stamped now.
  pub fn new(sender_id: ProfileId, text: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      sender_id,
      text: text.into(),
      timestamp: Utc::now(),
    }
  }
}

/// A conversation as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
  pub id:             ConversationId,
  pub participant_id: ProfileId,
  #[serde(default)]
  pub messages:       Vec<Message>,
  #[serde(default)]
  pub unread_count:   u32,
}

impl Conversation {
  pub fn is_persisted(&self) -> bool { self.id > 0 }
}

/// A conversation with its participant's profile embedded, as served to
/// clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedConversation {
  pub id:           ConversationId,
  pub participant:  Profile,
  pub messages:     Vec<Message>,
  pub unread_count: u32,
}

impl From<JoinedConversation> for Conversation {
  fn from(j: JoinedConversation) -> Self {
    Conversation {
      id:             j.id,
      participant_id: j.participant.id,
      messages:       j.messages,
      unread_count:   j.unread_count,
    }
  }
}

// ─── Repository ──────────────────────────────────────────────────────────────

pub struct ConversationRepository<S> {
  kv:         Arc<S>,
  write_lock: Mutex<()>,
}

impl<S: KvStore> ConversationRepository<S> {
  pub fn new(kv: Arc<S>) -> Self {
    Self {
      kv,
      write_lock: Mutex::new(()),
    }
  }

  /// Return all conversations, seeding the default set if the store is empty.
  pub async fn list(&self) -> Result<Vec<Conversation>> {
    match self.load().await? {
      Some(conversations) => Ok(conversations),
      None => {
        let _guard = self.write_lock.lock().await;
        self.load_or_seed().await
      }
    }
  }

  async fn load(&self) -> Result<Option<Vec<Conversation>>> {
    load_json(&*self.kv, CONVERSATIONS_STORE, CONVERSATIONS_KEY).await
  }

  /// Caller holds `write_lock`.
  async fn load_or_seed(&self) -> Result<Vec<Conversation>> {
    match self.load().await? {
      Some(conversations) => Ok(conversations),
      None => {
        tracing::info!("seeding conversations data");
        let seeded = seed::conversations()?;
        self.save_all(&seeded).await?;
        Ok(seeded)
      }
    }
  }

  /// Overwrite the whole collection.
  pub async fn save_all(&self, conversations: &[Conversation]) -> Result<()> {
    save_json(&*self.kv, CONVERSATIONS_STORE, CONVERSATIONS_KEY, conversations).await
  }

  /// Append `message` to conversation `id`.
  ///
  /// Fails with [`Error::ConversationNotFound`] if no such conversation is
  /// stored, and with [`Error::Validation`] for client-only conversation ids,
  /// blank text or a message id already present in the conversation.
  pub async fn append_message(&self, id: ConversationId, message: Message) -> Result<()> {
    if id <= 0 {
      return Err(Error::Validation(format!(
        "conversation {id} has not been persisted"
      )));
    }
    if message.text.trim().is_empty() {
      return Err(Error::Validation("message text must not be empty".into()));
    }

    let _guard = self.write_lock.lock().await;
    let mut conversations = self.load_or_seed().await?;
    let conversation = conversations
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or(Error::ConversationNotFound(id))?;
    if conversation.messages.iter().any(|m| m.id == message.id) {
      return Err(Error::Validation(format!(
        "message {} already exists in conversation {id}",
        message.id
      )));
    }

    tracing::debug!(conversation_id = id, message_id = %message.id, "appending message");
    conversation.messages.push(message);
    self.save_all(&conversations).await
  }

  /// All conversations joined with their participant's profile. Conversations
  /// whose participant does not exist are skipped; participant credentials are
  /// stripped.
  pub async fn list_joined(&self, profiles: Vec<Profile>) -> Result<Vec<JoinedConversation>> {
    let by_id: HashMap<ProfileId, Profile> =
      profiles.into_iter().map(|p| (p.id, p)).collect();

    Ok(
      self
        .list()
        .await?
        .into_iter()
        .filter_map(|c| {
          let participant = by_id.get(&c.participant_id)?.clone().redacted();
          Some(JoinedConversation {
            id: c.id,
            participant,
            messages: c.messages,
            unread_count: c.unread_count,
          })
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    kv::{MemoryStore, SlowFirstGet},
    profile::ProfileRepository,
  };

  fn repo() -> ConversationRepository<MemoryStore> {
    ConversationRepository::new(Arc::new(MemoryStore::new()))
  }

  #[tokio::test]
  async fn list_seeds_once() {
    let repo = repo();
    let first = repo.list().await.unwrap();
    assert!(!first.is_empty());

    repo.save_all(&first[1..]).await.unwrap();
    let second = repo.list().await.unwrap();
    assert_eq!(second.len(), first.len() - 1);
  }

  #[tokio::test]
  async fn append_preserves_order() {
    let repo = repo();
    let a = Message::new(1, "first");
    let b = Message::new(1, "second");
    repo.append_message(2, a.clone()).await.unwrap();
    repo.append_message(2, b.clone()).await.unwrap();

    let convo = repo.list().await.unwrap().into_iter().find(|c| c.id == 2).unwrap();
    let tail: Vec<_> = convo.messages.iter().rev().take(2).rev().cloned().collect();
    assert_eq!(tail, vec![a, b]);
  }

  #[tokio::test]
  async fn append_to_unknown_conversation_is_not_found() {
    let repo = repo();
    let before = repo.list().await.unwrap();
    let err = repo.append_message(999, Message::new(1, "hello")).await.unwrap_err();
    assert!(matches!(err, Error::ConversationNotFound(999)));
    assert_eq!(repo.list().await.unwrap(), before);
  }

  #[tokio::test]
  async fn append_rejects_client_only_ids_and_blank_text() {
    let repo = repo();
    assert!(matches!(
      repo.append_message(-3, Message::new(1, "hi")).await.unwrap_err(),
      Error::Validation(_)
    ));
    assert!(matches!(
      repo.append_message(1, Message::new(1, "   ")).await.unwrap_err(),
      Error::Validation(_)
    ));
  }

  #[tokio::test]
  async fn append_rejects_duplicate_message_id() {
    let repo = repo();
    let msg = Message::new(1, "once");
    repo.append_message(1, msg.clone()).await.unwrap();
    assert!(matches!(
      repo.append_message(1, msg).await.unwrap_err(),
      Error::Validation(_)
    ));
  }

  #[tokio::test]
  async fn joined_embeds_participant_and_skips_orphans() {
    let kv = Arc::new(MemoryStore::new());
    let conversations = ConversationRepository::new(kv.clone());
    let profiles = ProfileRepository::new(kv);

    let mut all = conversations.list().await.unwrap();
    all.push(Conversation {
      id:             50,
      participant_id: 9_999,
      messages:       vec![],
      unread_count:   0,
    });
    conversations.save_all(&all).await.unwrap();

    let joined = conversations
      .list_joined(profiles.list().await.unwrap())
      .await
      .unwrap();
    assert_eq!(joined.len(), all.len() - 1);
    assert!(joined.iter().all(|j| j.participant.password.is_none()));
    let first = joined.iter().find(|j| j.id == 1).unwrap();
    assert_eq!(first.participant.id, 2);
  }

  #[tokio::test]
  async fn concurrent_first_list_does_not_reseed_over_append() {
    let repo = ConversationRepository::new(Arc::new(SlowFirstGet::new()));
    let msg = Message::new(2, "made it");

    let (listed, appended) = tokio::join!(repo.list(), repo.append_message(1, msg.clone()));
    appended.unwrap();
    listed.unwrap();

    let convo = repo.list().await.unwrap().into_iter().find(|c| c.id == 1).unwrap();
    assert_eq!(convo.messages.last(), Some(&msg));
  }
}
