//! JSON REST API for SD Connect.
//!
//! Exposes an axum [`Router`] backed by any [`sdc_core::kv::KvStore`].
//! TLS, sessions and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sdc_api::api_router(state.clone()))
//! ```

pub mod auth;
pub mod conversations;
pub mod credits;
pub mod error;
pub mod profiles;
pub mod vote;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use sdc_core::{
  conversation::ConversationRepository,
  credit::{CreditLedger, DEFAULT_STARTING_CREDITS},
  kv::KvStore,
  profile::{DEFAULT_EXEMPT_PROFILE_ID, ProfileId, ProfileRepository},
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Tunables for the repositories behind the API.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
  pub starting_credits:  u64,
  pub exempt_profile_id: ProfileId,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      starting_credits:  DEFAULT_STARTING_CREDITS,
      exempt_profile_id: DEFAULT_EXEMPT_PROFILE_ID,
    }
  }
}

/// Repositories shared by all handlers. All of them sit on the same store.
pub struct AppState<S> {
  pub profiles:      ProfileRepository<S>,
  pub conversations: ConversationRepository<S>,
  pub credits:       CreditLedger<S>,
}

impl<S: KvStore> AppState<S> {
  pub fn new(kv: Arc<S>, settings: Settings) -> Self {
    Self {
      profiles:      ProfileRepository::new(kv.clone())
        .with_exempt_id(settings.exempt_profile_id),
      conversations: ConversationRepository::new(kv.clone()),
      credits:       CreditLedger::new(kv)
        .with_starting_balance(settings.starting_credits),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: KvStore + 'static>(state: Arc<AppState<S>>) -> Router<()> {
  Router::new()
    .route(
      "/profiles",
      get(profiles::get::<S>)
        .post(profiles::create::<S>)
        .put(profiles::update::<S>),
    )
    .route(
      "/conversations",
      get(conversations::list::<S>).post(conversations::append::<S>),
    )
    .route("/credits", get(credits::get::<S>).post(credits::update::<S>))
    .route("/vote", post(vote::handler::<S>))
    .route("/auth", post(auth::login::<S>))
    .with_state(state)
}
