//! Handler for `POST /vote`.
//!
//! Body: `{"voterId":..,"targetId":..,"choice":"met"|"notMet"}`. Returns the
//! updated target profile; 403 once the voter has already confirmed a
//! meeting.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use sdc_core::{
  kv::KvStore,
  profile::{Profile, ProfileId},
  vote::{VoteChoice, cast_vote},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub voter_id:  ProfileId,
  pub target_id: ProfileId,
  pub choice:    VoteChoice,
}

/// `POST /vote`
pub async fn handler<S: KvStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
  let Json(body) = body?;
  if body.voter_id == 0 || body.target_id == 0 {
    return Err(ApiError::BadRequest(
      "missing required fields: voterId, targetId, choice".into(),
    ));
  }
  let profile =
    cast_vote(&state.profiles, body.voter_id, body.target_id, body.choice).await?;
  Ok(Json(profile))
}
