//! Handler for `POST /auth`.
//!
//! Body: `{"email":..,"password":..}`. Returns `{"user":{..}}` with the
//! credential stripped, 400 if either field is missing and 401 if nothing
//! matches.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use sdc_core::{kv::KvStore, profile::Profile};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub user: Profile,
}

/// `POST /auth`
pub async fn login<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
  let Json(body) = body?;
  let user = state
    .profiles
    .authenticate(body.email.trim(), &body.password)
    .await?;
  tracing::info!(user_id = user.id, "login");
  Ok(Json(LoginResponse { user }))
}
