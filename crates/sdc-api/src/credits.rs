//! Handlers for `/credits`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/credits?userId=` | First lookup grants the starting balance |
//! | `POST` | `/credits?userId=` | Body: `{"amount":N,"action":"add"\|"spend"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
};
use sdc_core::{kv::KvStore, profile::ProfileId};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditParams {
  pub user_id: Option<ProfileId>,
}

impl CreditParams {
  fn require_user(self) -> Result<ProfileId, ApiError> {
    self
      .user_id
      .ok_or_else(|| ApiError::BadRequest("userId is required".into()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditAction {
  Add,
  Spend,
}

#[derive(Debug, Deserialize)]
pub struct CreditBody {
  pub amount: u64,
  pub action: CreditAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditsResponse {
  pub credits: u64,
}

/// `GET /credits?userId=<id>`
pub async fn get<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  params: Result<Query<CreditParams>, QueryRejection>,
) -> Result<Json<CreditsResponse>, ApiError> {
  let Query(params) = params?;
  let user_id = params.require_user()?;
  let credits = state.credits.balance(user_id).await?;
  Ok(Json(CreditsResponse { credits }))
}

/// `POST /credits?userId=<id>`
pub async fn update<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  params: Result<Query<CreditParams>, QueryRejection>,
  body: Result<Json<CreditBody>, JsonRejection>,
) -> Result<Json<CreditsResponse>, ApiError> {
  let Query(params) = params?;
  let user_id = params.require_user()?;
  let Json(body) = body?;

  let credits = match body.action {
    CreditAction::Add => state.credits.add(user_id, body.amount).await?,
    CreditAction::Spend => state.credits.spend(user_id, body.amount).await?,
  };
  Ok(Json(CreditsResponse { credits }))
}
