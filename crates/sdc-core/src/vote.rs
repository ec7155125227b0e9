//! The "did you meet" vote ledger embedded in each profile.
//!
//! Each voter holds at most one vote per target. A `met` vote is permanent; a
//! `notMet` vote may be upgraded to `met` exactly once. The target's
//! `metCount` / `notMetCount` always equal the number of votes with each
//! choice.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  kv::KvStore,
  profile::{Profile, ProfileId, ProfileRepository},
};

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
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VoteChoice {
  Met,
  NotMet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
  pub voter_id: ProfileId,
  pub choice:   VoteChoice,
}

/// What [`apply_vote`] did to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteEffect {
  Recorded,
  Upgraded,
  Unchanged,
}

/// Apply a vote to `target` in memory.
///
/// Fails with [`Error::AlreadyConfirmed`] if `voter_id` has already voted
/// `met` on this profile.
pub fn apply_vote(
  target: &mut Profile,
  voter_id: ProfileId,
  choice: VoteChoice,
) -> Result<VoteEffect> {
  let target_id = target.id;
  match target.votes.iter_mut().find(|v| v.voter_id == voter_id) {
    Some(existing) => match (existing.choice, choice) {
      (VoteChoice::Met, _) => Err(Error::AlreadyConfirmed { voter_id, target_id }),
      (VoteChoice::NotMet, VoteChoice::Met) => {
        existing.choice = VoteChoice::Met;
        target.not_met_count = target.not_met_count.saturating_sub(1);
        target.met_count += 1;
        Ok(VoteEffect::Upgraded)
      }
      (VoteChoice::NotMet, VoteChoice::NotMet) => Ok(VoteEffect::Unchanged),
    },
    None => {
      target.votes.push(Vote { voter_id, choice });
      match choice {
        VoteChoice::Met => target.met_count += 1,
        VoteChoice::NotMet => target.not_met_count += 1,
      }
      Ok(VoteEffect::Recorded)
    }
  }
}

/// Record `voter_id`'s vote on `target_id` and persist the profile
/// collection. Returns the updated target with its credential stripped.
pub async fn cast_vote<S: KvStore>(
  profiles: &ProfileRepository<S>,
  voter_id: ProfileId,
  target_id: ProfileId,
  choice: VoteChoice,
) -> Result<Profile> {
  profiles
    .modify(|all| {
      let target = all
        .iter_mut()
        .find(|p| p.id == target_id)
        .ok_or(Error::ProfileNotFound(target_id))?;
      let effect = apply_vote(target, voter_id, choice)?;
      tracing::debug!(voter_id, target_id, %choice, ?effect, "vote applied");
      Ok((target.clone().redacted(), effect != VoteEffect::Unchanged))
    })
    .await
}
