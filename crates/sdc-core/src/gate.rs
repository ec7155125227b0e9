//! The messaging gate: client-side orchestration of a single send.
//!
//! A send attempt moves through these states:
//!
//! | From | Condition | To |
//! |------|-----------|----|
//! | `Draft` | blank draft | `Draft` ([`SendOutcome::Ignored`]) |
//! | `Draft` | paying sender with no credits | `Blocked` |
//! | `Draft` | otherwise, optimistic local append | `Sending` |
//! | `Sending` | client-only conversation | `Sent` |
//! | `Sending` | repository append succeeded, sender charged | `Sent` |
//! | `Sending` | repository append failed, local append rolled back | `Failed` |
//!
//! The gate never retries. Credits are only spent after the repository
//! accepted the message. Taking the [`ChatView`] by `&mut` keeps at most one
//! send in flight per view.

use std::{future::Future, sync::Arc};

use crate::{
  Error,
  conversation::{Conversation, ConversationId, ConversationRepository, Message},
  credit::CreditLedger,
  kv::KvStore,
  profile::{Profile, ProfileId},
};

// ─── Backend seam ────────────────────────────────────────────────────────────

/// The repository and ledger operations the gate depends on.
///
/// Implemented in-process by [`LocalBackend`] and over HTTP by the CLI client.
pub trait GateBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn balance(
    &self,
    user_id: ProfileId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn append_message(
    &self,
    conversation_id: ConversationId,
    message: Message,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn spend(
    &self,
    user_id: ProfileId,
    amount: u64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

/// A [`GateBackend`] that calls the repositories directly.
pub struct LocalBackend<S> {
  pub conversations: Arc<ConversationRepository<S>>,
  pub credits:       Arc<CreditLedger<S>>,
}

impl<S: KvStore> GateBackend for LocalBackend<S> {
  type Error = Error;

  async fn balance(&self, user_id: ProfileId) -> Result<u64, Error> {
    self.credits.balance(user_id).await
  }

  async fn append_message(
    &self,
    conversation_id: ConversationId,
    message: Message,
  ) -> Result<(), Error> {
    self.conversations.append_message(conversation_id, message).await
  }

  async fn spend(&self, user_id: ProfileId, amount: u64) -> Result<u64, Error> {
    self.credits.spend(user_id, amount).await
  }
}

// ─── Local view and outcomes ─────────────────────────────────────────────────

/// The client's local copy of one conversation plus the unsent input text.
#[derive(Debug, Clone)]
pub struct ChatView {
  pub conversation: Conversation,
  pub draft:        String,
}

impl ChatView {
  pub fn new(conversation: Conversation) -> Self {
    Self {
      conversation,
      draft: String::new(),
    }
  }
}

/// The terminal state of one send attempt.
#[derive(Debug)]
pub enum SendOutcome<E> {
  /// The draft was blank; nothing happened.
  Ignored,
  /// The sender is out of credits. Nothing was sent and no credit was touched.
  /// `auto_reply` holds the counterpart's low-credit notice if one was posted.
  Blocked { auto_reply: Option<Message> },
  /// The message is in the local view and, for persisted conversations, in
  /// the repository. `remaining_credits` is set when the sender was charged.
  Sent {
    message:           Message,
    remaining_credits: Option<u64>,
  },
  /// The send failed. The local view is unchanged and the draft restored.
  Failed { error: E },
}

// ─── Gate ────────────────────────────────────────────────────────────────────

pub struct MessagingGate<B> {
  backend:          B,
  low_credit_reply: Option<String>,
}

impl<B: GateBackend> MessagingGate<B> {
  pub fn new(backend: B) -> Self {
    Self {
      backend,
      low_credit_reply: None,
    }
  }

  /// When a send is blocked for lack of credits, post `text` into the
  /// conversation on behalf of the counterpart.
  pub fn with_low_credit_reply(mut self, text: impl Into<String>) -> Self {
    self.low_credit_reply = Some(text.into());
    self
  }

  pub fn backend(&self) -> &B { &self.backend }

  /// Attempt to send `chat.draft` as `sender`.
  pub async fn submit(&self, sender: &Profile, chat: &mut ChatView) -> SendOutcome<B::Error> {
    let text = chat.draft.trim();
    if text.is_empty() {
      return SendOutcome::Ignored;
    }
    let text = text.to_owned();

    if sender.pays_for_messages() {
      match self.backend.balance(sender.id).await {
        Ok(0) => return self.block(chat).await,
        Ok(_) => {}
        Err(error) => {
          tracing::warn!(sender_id = sender.id, %error, "credit lookup failed");
          return SendOutcome::Failed { error };
        }
      }
    }

    let message = Message::new(sender.id, text);
    chat.conversation.messages.push(message.clone());
    chat.draft.clear();

    if !chat.conversation.is_persisted() {
      return SendOutcome::Sent {
        message,
        remaining_credits: None,
      };
    }

    let conversation_id = chat.conversation.id;
    if let Err(error) = self
      .backend
      .append_message(conversation_id, message.clone())
      .await
    {
      tracing::warn!(conversation_id, message_id = %message.id, %error, "message not sent");
      chat.conversation.messages.retain(|m| m.id != message.id);
      chat.draft = message.text;
      return SendOutcome::Failed { error };
    }

    let remaining_credits = if sender.pays_for_messages() {
      match self.backend.spend(sender.id, 1).await {
        Ok(credits) => Some(credits),
        Err(error) => {
          // The message is already stored; report it as sent.
          tracing::warn!(sender_id = sender.id, %error, "charging for sent message failed");
          None
        }
      }
    } else {
      None
    };

    SendOutcome::Sent {
      message,
      remaining_credits,
    }
  }

  async fn block(&self, chat: &mut ChatView) -> SendOutcome<B::Error> {
    chat.draft.clear();

    let Some(text) = &self.low_credit_reply else {
      return SendOutcome::Blocked { auto_reply: None };
    };
    if !chat.conversation.is_persisted() {
      return SendOutcome::Blocked { auto_reply: None };
    }

    // Authored by the counterpart, so the credit guard does not apply.
    let reply = Message::new(chat.conversation.participant_id, text.clone());
    match self
      .backend
      .append_message(chat.conversation.id, reply.clone())
      .await
    {
      Ok(()) => {
        chat.conversation.messages.push(reply.clone());
        SendOutcome::Blocked {
          auto_reply: Some(reply),
        }
      }
      Err(error) => {
        tracing::warn!(conversation_id = chat.conversation.id, %error, "low-credit reply not posted");
        SendOutcome::Blocked { auto_reply: None }
      }
    }
  }
}
