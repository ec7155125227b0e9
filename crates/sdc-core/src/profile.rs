//! Profiles and the profile repository.
//!
//! All profiles live in a single JSON array under
//! `(`[`PROFILES_STORE`]`, `[`PROFILES_KEY`]`)`. Every mutation reads the full
//! collection, changes it in memory and writes the full collection back.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  kv::{KvStore, load_json, save_json},
  seed,
  vote::Vote,
};

pub const PROFILES_STORE: &str = "profiles_data";
pub const PROFILES_KEY: &str = "all_profiles";

/// The profile id that is exempt from credit gating when it has the
/// [`Role::Patron`] role.
pub const DEFAULT_EXEMPT_PROFILE_ID: ProfileId = 1;

pub type ProfileId = u64;

// ─── Types ───────────────────────────────────────────────────────────────────

/// The two mutually exclusive profile categories.
///
/// Patrons pay one credit per message they send; companions message freely.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Role {
  #[serde(rename = "daddy")]
  #[strum(to_string = "daddy", serialize = "patron")]
  Patron,
  #[serde(rename = "baby")]
  #[strum(to_string = "baby", serialize = "companion")]
  Companion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub id:            ProfileId,
  pub name:          String,
  pub email:         String,
  /// The login credential. Stripped by [`Profile::redacted`] before a profile
  /// leaves the server.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password:      Option<String>,
  pub role:          Role,
  #[serde(default)]
  pub age:           u32,
  #[serde(default)]
  pub location:      String,
  #[serde(default)]
  pub image_url:     String,
  #[serde(default)]
  pub hint:          String,
  #[serde(default)]
  pub online:        bool,
  #[serde(default)]
  pub verified:      bool,
  #[serde(default)]
  pub bio:           String,
  #[serde(default)]
  pub wants:         Vec<String>,
  #[serde(default)]
  pub interests:     Vec<String>,
  #[serde(default)]
  pub gallery:       Vec<String>,
  #[serde(default)]
  pub attributes:    BTreeMap<String, String>,
  #[serde(default)]
  pub met_count:     u32,
  #[serde(default)]
  pub not_met_count: u32,
  #[serde(default)]
  pub votes:         Vec<Vote>,
  /// Whether this profile may message without spending credits. Computed by
  /// the repository on every load; any stored or submitted value is ignored.
  #[serde(default, rename = "isExempt")]
  pub messaging_exempt: bool,
}

impl Profile {
  /// Drop the credential so the profile can be returned to a client.
  pub fn redacted(mut self) -> Self {
    self.password = None;
    self
  }

  /// Whether sending a message costs this profile a credit.
  pub fn pays_for_messages(&self) -> bool {
    self.role == Role::Patron && !self.messaging_exempt
  }
}

/// Signup input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
  pub email:    String,
  pub password: String,
  pub role:     Role,
}

/// Derive a display name from the local part of an email address:
/// non-alphanumeric characters become spaces and each word is capitalised.
pub fn display_name_from_email(email: &str) -> String {
  let local = email.split('@').next().unwrap_or_default();
  let mut name = String::with_capacity(local.len());
  let mut at_word_start = true;
  for c in local.chars() {
    if c.is_ascii_alphanumeric() {
      if at_word_start {
        name.push(c.to_ascii_uppercase());
      } else {
        name.push(c);
      }
      at_word_start = false;
    } else {
      name.push(' ');
      at_word_start = true;
    }
  }
  name
}

/// Emails compare case-insensitively, using full Unicode lowercasing.
fn same_email(a: &str, b: &str) -> bool { a.to_lowercase() == b.to_lowercase() }

// ─── Repository ──────────────────────────────────────────────────────────────

/// CRUD over the profile collection.
///
/// Read-modify-write sequences issued through one repository are serialised
/// by an async mutex. Writers in other processes sharing the same backend are
/// not coordinated and remain last-writer-wins.
pub struct ProfileRepository<S> {
  kv:         Arc<S>,
  exempt_id:  ProfileId,
  write_lock: Mutex<()>,
}

impl<S: KvStore> ProfileRepository<S> {
  pub fn new(kv: Arc<S>) -> Self {
    Self {
      kv,
      exempt_id: DEFAULT_EXEMPT_PROFILE_ID,
      write_lock: Mutex::new(()),
    }
  }

  /// Override which profile id is exempt from credit gating.
  pub fn with_exempt_id(mut self, id: ProfileId) -> Self {
    self.exempt_id = id;
    self
  }

  fn hydrate(&self, profile: &mut Profile) {
    profile.messaging_exempt =
      profile.role == Role::Patron && profile.id == self.exempt_id;
  }

  /// Return all profiles, seeding the default set if the store is empty.
  pub async fn list(&self) -> Result<Vec<Profile>> {
    let profiles = match self.load().await? {
      Some(profiles) => profiles,
      None => {
        let _guard = self.write_lock.lock().await;
        self.load_or_seed().await?
      }
    };
    Ok(self.hydrated(profiles))
  }

  async fn load(&self) -> Result<Option<Vec<Profile>>> {
    load_json(&*self.kv, PROFILES_STORE, PROFILES_KEY).await
  }

  /// Caller holds `write_lock`.
  async fn load_or_seed(&self) -> Result<Vec<Profile>> {
    match self.load().await? {
      Some(profiles) => Ok(profiles),
      None => {
        tracing::info!("seeding profiles data");
        let seeded = seed::profiles()?;
        save_json(&*self.kv, PROFILES_STORE, PROFILES_KEY, &seeded).await?;
        Ok(seeded)
      }
    }
  }

  fn hydrated(&self, mut profiles: Vec<Profile>) -> Vec<Profile> {
    profiles.iter_mut().for_each(|p| self.hydrate(p));
    profiles
  }

  /// Retrieve a profile by id. Returns `None` if not found.
  pub async fn get(&self, id: ProfileId) -> Result<Option<Profile>> {
    Ok(self.list().await?.into_iter().find(|p| p.id == id))
  }

  /// Overwrite the whole collection.
  pub async fn save_all(&self, profiles: &[Profile]) -> Result<()> {
    save_json(&*self.kv, PROFILES_STORE, PROFILES_KEY, profiles).await
  }

  /// `max(existing ids) + 1`, or 1 for an empty collection.
  pub fn next_id(profiles: &[Profile]) -> ProfileId {
    profiles.iter().map(|p| p.id).max().map_or(1, |max| max + 1)
  }

  /// Run `f` over the full collection under the write lock. The collection is
  /// written back only when `f` reports a change.
  pub(crate) async fn modify<T>(
    &self,
    f: impl FnOnce(&mut Vec<Profile>) -> Result<(T, bool)>,
  ) -> Result<T> {
    let _guard = self.write_lock.lock().await;
    let mut profiles = self.hydrated(self.load_or_seed().await?);
    let (out, changed) = f(&mut profiles)?;
    if changed {
      self.save_all(&profiles).await?;
    }
    Ok(out)
  }

  /// Sign up a new profile.
  ///
  /// Returns the new profile and the full updated collection, both with
  /// credentials stripped.
  pub async fn create(&self, input: NewProfile) -> Result<(Profile, Vec<Profile>)> {
    let email = input.email.trim().to_owned();
    if email.is_empty() || input.password.is_empty() {
      return Err(Error::Validation("email and password are required".into()));
    }

    let exempt_id = self.exempt_id;
    self
      .modify(|profiles| {
        if profiles.iter().any(|p| same_email(&p.email, &email)) {
          return Err(Error::DuplicateEmail(email.clone()));
        }

        let id = Self::next_id(profiles);
        let size = 600 + id;
        let profile = Profile {
          id,
          name: display_name_from_email(&email),
          email: email.clone(),
          password: Some(input.password),
          role: input.role,
          age: 18,
          location: String::new(),
          image_url: format!("https://placehold.co/{size}x{size}.png"),
          hint: match input.role {
            Role::Companion => "woman smiling".into(),
            Role::Patron => "man suit".into(),
          },
          online: true,
          verified: false,
          bio: String::new(),
          wants: Vec::new(),
          interests: Vec::new(),
          gallery: Vec::new(),
          attributes: BTreeMap::new(),
          met_count: 0,
          not_met_count: 0,
          votes: Vec::new(),
          messaging_exempt: input.role == Role::Patron && id == exempt_id,
        };
        tracing::info!(profile_id = id, role = %profile.role, "profile created");
        profiles.push(profile.clone());

        let all = profiles.iter().cloned().map(Profile::redacted).collect();
        Ok(((profile.redacted(), all), true))
      })
      .await
  }

  /// Replace a stored profile by id.
  ///
  /// The stored credential is kept when the update carries none. The vote
  /// ledger (`votes`, `metCount`, `notMetCount`) is owned by
  /// [`cast_vote`](crate::vote::cast_vote) and always kept as stored.
  pub async fn update(&self, mut updated: Profile) -> Result<Profile> {
    self.hydrate(&mut updated);
    self
      .modify(|profiles| {
        let existing = profiles
          .iter_mut()
          .find(|p| p.id == updated.id)
          .ok_or(Error::ProfileNotFound(updated.id))?;

        if updated.password.is_none() {
          updated.password = existing.password.take();
        }
        updated.votes = std::mem::take(&mut existing.votes);
        updated.met_count = existing.met_count;
        updated.not_met_count = existing.not_met_count;

        *existing = updated.clone();
        Ok((updated.redacted(), true))
      })
      .await
  }

  /// Find the profile matching `email` (case-insensitive) and `password`.
  pub async fn authenticate(&self, email: &str, password: &str) -> Result<Profile> {
    if email.is_empty() || password.is_empty() {
      return Err(Error::Validation("email and password are required".into()));
    }
    self
      .list()
      .await?
      .into_iter()
      .find(|p| {
        same_email(&p.email, email) && p.password.as_deref() == Some(password)
      })
      .map(Profile::redacted)
      .ok_or(Error::InvalidCredentials)
  }
}
