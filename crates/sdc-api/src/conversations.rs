//! Handlers for `/conversations`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/conversations` | Conversations with their participant profile embedded |
//! | `POST` | `/conversations` | Body: `{"conversationId":..,"message":{..}}`; appends one message |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use sdc_core::{
  conversation::{ConversationId, JoinedConversation, Message},
  kv::KvStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// `GET /conversations`
pub async fn list<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<JoinedConversation>>, ApiError> {
  let profiles = state.profiles.list().await?;
  Ok(Json(state.conversations.list_joined(profiles).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendBody {
  pub conversation_id: Option<ConversationId>,
  pub message:         Option<Message>,
}

/// `POST /conversations`
pub async fn append<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  body: Result<Json<AppendBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(body) = body?;
  let (Some(conversation_id), Some(message)) = (body.conversation_id, body.message) else {
    return Err(ApiError::BadRequest("missing conversationId or message".into()));
  };
  state
    .conversations
    .append_message(conversation_id, message)
    .await?;
  Ok(Json(json!({ "success": true })))
}
