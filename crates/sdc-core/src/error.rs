//! Error types for `sdc-core`.

use thiserror::Error;

use crate::{conversation::ConversationId, profile::ProfileId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("profile not found: {0}")]
  ProfileNotFound(ProfileId),

  #[error("conversation not found: {0}")]
  ConversationNotFound(ConversationId),

  #[error("a user with the email address {0:?} already exists")]
  DuplicateEmail(String),

  #[error("voter {voter_id} already confirmed meeting profile {target_id}")]
  AlreadyConfirmed {
    voter_id:  ProfileId,
    target_id: ProfileId,
  },

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], used by callers that translate
/// failures into transport-level responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Unauthorized,
  Internal,
}

impl Error {
  /// Wrap a backend error from a [`KvStore`](crate::kv::KvStore).
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::ProfileNotFound(_) | Self::ConversationNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::DuplicateEmail(_) | Self::AlreadyConfirmed { .. } => {
        ErrorKind::Conflict
      }
      Self::InvalidCredentials => ErrorKind::Unauthorized,
      Self::Store(_) | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
