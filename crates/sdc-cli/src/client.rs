//! Async HTTP client wrapping the SD Connect JSON API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use sdc_core::{
  conversation::{ConversationId, JoinedConversation, Message},
  gate::GateBackend,
  profile::{Profile, ProfileId},
  vote::VoteChoice,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("server returned {status}: {message}")]
  Status { status: StatusCode, message: String },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct UserBody {
  user: Profile,
}

#[derive(Deserialize)]
struct CreditsBody {
  credits: u64,
}

/// Async HTTP client for the SD Connect REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp.json().await?);
    }
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_else(|_| status.to_string());
    Err(ClientError::Status { status, message })
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  /// `POST /api/auth`
  pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
    let resp = self
      .client
      .post(self.url("/auth"))
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    Ok(Self::decode::<UserBody>(resp).await?.user)
  }

  /// `GET /api/profiles`
  pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let resp = self.client.get(self.url("/profiles")).send().await?;
    Self::decode(resp).await
  }

  /// `GET /api/profiles?id=<id>`
  pub async fn get_profile(&self, id: ProfileId) -> Result<Profile> {
    let resp = self
      .client
      .get(self.url("/profiles"))
      .query(&[("id", id)])
      .send()
      .await?;
    Self::decode(resp).await
  }

  /// `POST /api/vote`
  pub async fn vote(
    &self,
    voter_id: ProfileId,
    target_id: ProfileId,
    choice: VoteChoice,
  ) -> Result<Profile> {
    let resp = self
      .client
      .post(self.url("/vote"))
      .json(&json!({ "voterId": voter_id, "targetId": target_id, "choice": choice }))
      .send()
      .await?;
    Self::decode(resp).await
  }

  // ── Conversations ─────────────────────────────────────────────────────────

  /// `GET /api/conversations`
  pub async fn list_conversations(&self) -> Result<Vec<JoinedConversation>> {
    let resp = self.client.get(self.url("/conversations")).send().await?;
    Self::decode(resp).await
  }

  /// `POST /api/conversations`
  pub async fn post_message(&self, conversation_id: ConversationId, message: &Message) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/conversations"))
      .json(&json!({ "conversationId": conversation_id, "message": message }))
      .send()
      .await?;
    Self::decode::<serde_json::Value>(resp).await.map(drop)
  }

  // ── Credits ───────────────────────────────────────────────────────────────

  /// `GET /api/credits?userId=<id>`
  pub async fn credits(&self, user_id: ProfileId) -> Result<u64> {
    let resp = self
      .client
      .get(self.url("/credits"))
      .query(&[("userId", user_id)])
      .send()
      .await?;
    Ok(Self::decode::<CreditsBody>(resp).await?.credits)
  }

  /// `POST /api/credits?userId=<id>` with `action` of `add` or `spend`.
  pub async fn update_credits(&self, user_id: ProfileId, action: &str, amount: u64) -> Result<u64> {
    let resp = self
      .client
      .post(self.url("/credits"))
      .query(&[("userId", user_id)])
      .json(&json!({ "amount": amount, "action": action }))
      .send()
      .await?;
    Ok(Self::decode::<CreditsBody>(resp).await?.credits)
  }
}

impl GateBackend for ApiClient {
  type Error = ClientError;

  async fn balance(&self, user_id: ProfileId) -> Result<u64> { self.credits(user_id).await }

  async fn append_message(&self, conversation_id: ConversationId, message: Message) -> Result<()> {
    self.post_message(conversation_id, &message).await
  }

  async fn spend(&self, user_id: ProfileId, amount: u64) -> Result<u64> {
    self.update_credits(user_id, "spend", amount).await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use sdc_api::{AppState, Settings, api_router};
  use sdc_core::{
    gate::{ChatView, MessagingGate, SendOutcome},
    kv::MemoryStore,
  };
  use tokio::net::TcpListener;

  use super::*;

  /// Serve the API on an ephemeral port and return a client pointed at it.
  async fn spawn_server(settings: Settings) -> ApiClient {
    let state = Arc::new(AppState::new(Arc::new(MemoryStore::new()), settings));
    let app = axum::Router::new().nest("/api", api_router(state));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    ApiClient::new(format!("http://{addr}/")).unwrap()
  }

  async fn chat_with(client: &ApiClient, conversation_id: ConversationId) -> ChatView {
    let joined = client
      .list_conversations()
      .await
      .unwrap()
      .into_iter()
      .find(|c| c.id == conversation_id)
      .unwrap();
    ChatView::new(joined.into())
  }

  #[test]
  fn url_joins_base_and_path() {
    let client = ApiClient::new("http://localhost:8787/").unwrap();
    assert_eq!(client.url("/credits"), "http://localhost:8787/api/credits");
  }

  #[tokio::test]
  async fn error_body_is_surfaced() {
    let client = spawn_server(Settings::default()).await;
    match client.get_profile(999).await {
      Err(ClientError::Status { status, message }) => {
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("999"));
      }
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[tokio::test]
  async fn paying_sender_is_charged_over_http() {
    let client = spawn_server(Settings::default()).await;
    let sender = client.get_profile(4).await.unwrap();
    assert!(sender.pays_for_messages());

    let mut chat = chat_with(&client, 1).await;
    chat.draft = "hi there".into();
    let gate = MessagingGate::new(client.clone());

    match gate.submit(&sender, &mut chat).await {
      SendOutcome::Sent {
        remaining_credits, ..
      } => assert_eq!(remaining_credits, Some(9)),
      other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(client.credits(4).await.unwrap(), 9);

    let stored = chat_with(&client, 1).await;
    assert_eq!(stored.conversation.messages.last().unwrap().text, "hi there");
  }

  #[tokio::test]
  async fn broke_sender_gets_low_credit_reply() {
    let client = spawn_server(Settings {
      starting_credits: 0,
      ..Settings::default()
    })
    .await;
    let sender = client.get_profile(4).await.unwrap();
    let before = chat_with(&client, 2).await.conversation.messages.len();

    let mut chat = chat_with(&client, 2).await;
    chat.draft = "hello?".into();
    let gate = MessagingGate::new(client.clone()).with_low_credit_reply("top up to keep chatting");

    match gate.submit(&sender, &mut chat).await {
      SendOutcome::Blocked {
        auto_reply: Some(reply),
      } => assert_eq!(reply.sender_id, chat.conversation.participant_id),
      other => panic!("unexpected: {other:?}"),
    }

    let stored = chat_with(&client, 2).await.conversation.messages;
    assert_eq!(stored.len(), before + 1);
    assert_eq!(stored.last().unwrap().text, "top up to keep chatting");
    assert_eq!(client.credits(4).await.unwrap(), 0);
  }
}
