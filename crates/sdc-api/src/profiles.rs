//! Handlers for `/profiles`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles` | Optional `?id=`; 404 if the id is unknown |
//! | `POST` | `/profiles` | Signup, body: [`NewProfile`]; returns 201 + `{user, profiles}` |
//! | `PUT`  | `/profiles` | Body: full profile; 404 if the id is unknown |
//!
//! Credentials are stripped from every profile returned.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sdc_core::{
  kv::KvStore,
  profile::{NewProfile, Profile, ProfileId},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Get ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub id: Option<ProfileId>,
}

/// `GET /profiles[?id=<id>]`
pub async fn get<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<Response, ApiError> {
  let Query(params) = params?;
  match params.id {
    Some(id) => {
      let profile = state
        .profiles
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
      Ok(Json(profile.redacted()).into_response())
    }
    None => {
      let profiles: Vec<Profile> = state
        .profiles
        .list()
        .await?
        .into_iter()
        .map(Profile::redacted)
        .collect();
      Ok(Json(profiles).into_response())
    }
  }
}

// ─── Signup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
  pub user:     Profile,
  pub profiles: Vec<Profile>,
}

/// `POST /profiles`, body: `{"email":..., "password":..., "role":"daddy"|"baby"}`
pub async fn create<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  body: Result<Json<NewProfile>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let (user, profiles) = state.profiles.create(input).await?;
  Ok((StatusCode::CREATED, Json(SignupResponse { user, profiles })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /profiles`, body: the full profile, matched by `id`.
pub async fn update<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  body: Result<Json<Profile>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
  let Json(profile) = body?;
  Ok(Json(state.profiles.update(profile).await?))
}
