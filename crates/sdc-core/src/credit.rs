//! Per-user credit balances.
//!
//! Each balance is a single JSON integer stored under
//! `(`[`CREDITS_STORE`]`, "<user id>")`. The first read of an unknown user
//! grants and persists the starting balance. The ledger knows nothing about
//! exemptions; callers decide whether a debit applies.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
  Result,
  kv::{KvStore, load_json, save_json},
  profile::ProfileId,
};

pub const CREDITS_STORE: &str = "credits_data";

/// Balance granted on a user's first balance lookup.
pub const DEFAULT_STARTING_CREDITS: u64 = 10;

pub struct CreditLedger<S> {
  kv:               Arc<S>,
  starting_balance: u64,
  write_lock:       Mutex<()>,
}

impl<S: KvStore> CreditLedger<S> {
  pub fn new(kv: Arc<S>) -> Self {
    Self {
      kv,
      starting_balance: DEFAULT_STARTING_CREDITS,
      write_lock: Mutex::new(()),
    }
  }

  pub fn with_starting_balance(mut self, credits: u64) -> Self {
    self.starting_balance = credits;
    self
  }

  /// Current balance, granting the starting balance on first access.
  pub async fn balance(&self, user_id: ProfileId) -> Result<u64> {
    if let Some(credits) = self.load(user_id).await? {
      return Ok(credits);
    }
    let _guard = self.write_lock.lock().await;
    self.balance_locked(user_id).await
  }

  /// Unconditionally overwrite a balance.
  pub async fn set_balance(&self, user_id: ProfileId, credits: u64) -> Result<()> {
    let _guard = self.write_lock.lock().await;
    self.store(user_id, credits).await
  }

  /// Debit `amount`, clamping the balance at zero. Returns the new balance.
  pub async fn spend(&self, user_id: ProfileId, amount: u64) -> Result<u64> {
    let _guard = self.write_lock.lock().await;
    let credits = self.balance_locked(user_id).await?.saturating_sub(amount);
    self.store(user_id, credits).await?;
    tracing::debug!(user_id, amount, credits, "credits spent");
    Ok(credits)
  }

  /// Credit `amount`. Returns the new balance.
  pub async fn add(&self, user_id: ProfileId, amount: u64) -> Result<u64> {
    let _guard = self.write_lock.lock().await;
    let credits = self.balance_locked(user_id).await?.saturating_add(amount);
    self.store(user_id, credits).await?;
    tracing::debug!(user_id, amount, credits, "credits added");
    Ok(credits)
  }

  async fn load(&self, user_id: ProfileId) -> Result<Option<u64>> {
    load_json(&*self.kv, CREDITS_STORE, &user_id.to_string()).await
  }

  async fn store(&self, user_id: ProfileId, credits: u64) -> Result<()> {
    save_json(&*self.kv, CREDITS_STORE, &user_id.to_string(), &credits).await
  }

  /// Re-read and grant if still missing. Caller holds `write_lock`.
  async fn balance_locked(&self, user_id: ProfileId) -> Result<u64> {
    match self.load(user_id).await? {
      Some(credits) => Ok(credits),
      None => {
        tracing::info!(user_id, credits = self.starting_balance, "granting starting credits");
        self.store(user_id, self.starting_balance).await?;
        Ok(self.starting_balance)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::kv::{MemoryStore, SlowFirstGet};

  fn ledger() -> CreditLedger<MemoryStore> {
    CreditLedger::new(Arc::new(MemoryStore::new()))
  }

  #[tokio::test]
  async fn first_access_grants_ten_then_spend_clamps() {
    let ledger = ledger();
    assert_eq!(ledger.balance(42).await.unwrap(), 10);
    assert_eq!(ledger.spend(42, 1).await.unwrap(), 9);
    assert_eq!(ledger.spend(42, 20).await.unwrap(), 0);
    assert_eq!(ledger.balance(42).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn grant_is_persisted() {
    let kv = Arc::new(MemoryStore::new());
    let ledger = CreditLedger::new(kv.clone());
    ledger.balance(7).await.unwrap();
    assert_eq!(
      kv.get(CREDITS_STORE, "7").await.unwrap(),
      Some(serde_json::json!(10))
    );
  }

  #[tokio::test]
  async fn spend_never_goes_negative() {
    let ledger = ledger();
    let mut expected: u64 = 10;
    for amount in [3, 0, 8, 1, 100, 2] {
      expected = expected.saturating_sub(amount);
      assert_eq!(ledger.spend(1, amount).await.unwrap(), expected);
    }
    assert_eq!(ledger.balance(1).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn add_after_exhaustion() {
    let ledger = ledger();
    ledger.spend(9, 50).await.unwrap();
    assert_eq!(ledger.add(9, 5).await.unwrap(), 5);
  }

  #[tokio::test]
  async fn starting_balance_is_configurable() {
    let ledger = ledger().with_starting_balance(3);
    assert_eq!(ledger.balance(1).await.unwrap(), 3);
  }

  #[tokio::test]
  async fn first_grant_does_not_clobber_concurrent_spend() {
    let kv = Arc::new(SlowFirstGet::new());
    let ledger = CreditLedger::new(kv.clone());

    let (seen, spent) = tokio::join!(ledger.balance(42), ledger.spend(42, 3));
    assert_eq!(spent.unwrap(), 7);
    assert_eq!(seen.unwrap(), 7);
    assert_eq!(
      kv.get(CREDITS_STORE, "42").await.unwrap(),
      Some(serde_json::json!(7))
    );
  }

  #[tokio::test]
  async fn set_balance_overwrites() {
    let ledger = ledger();
    ledger.set_balance(5, 77).await.unwrap();
    assert_eq!(ledger.balance(5).await.unwrap(), 77);
  }
}
