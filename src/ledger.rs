//! C4: the ledger. Per-player balances plus the append-only transaction
//! log. `commit` delegates the atomic balance-delta + transaction-append
//! operation to the store in a single durable call (spec §4.4), bounds it
//! by the configurable commit deadline (spec §5 "Timeouts"), and retries it
//! on transient storage failure per spec §7.

use crate::config::ServerConfig;
use crate::error::{EngineError, EngineResult};
use crate::model::{Direction, Transaction};
use crate::money::Money;
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 50;
const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 2000;

pub struct Ledger {
    store: Arc<dyn Store>,
    config: Arc<ServerConfig>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, config: Arc<ServerConfig>) -> Self {
        Self { store, config }
    }

    /// Non-mutating balance read (spec §4.4 "Quote is non-mutating").
    pub fn balance(&self, player_id: &str) -> EngineResult<Money> {
        self.store.get_balance(player_id)
    }

    pub fn set_balance(&self, player_id: &str, balance: Money) -> EngineResult<()> {
        self.store.set_balance(player_id, balance)
    }

    /// Atomically apply `balance_delta` and append `txn`, bounded by the
    /// `commit_timeout_ms` config key (default 2000ms) and retried up to
    /// [`MAX_RETRIES`] times with exponential backoff (50ms base, ×2,
    /// jitter ±25%) when the failure is classified as transient, including
    /// a deadline expiry (spec §7). A non-transient or exhausted failure
    /// leaves both balance and transaction log untouched, since the store
    /// wraps both writes in one SQL transaction; the caller's accumulator
    /// is never fed when this returns an error.
    pub async fn commit(&self, txn: &Transaction, balance_delta: Money) -> EngineResult<i64> {
        let deadline_ms = self
            .config
            .int("commit_timeout_ms")
            .unwrap_or(DEFAULT_COMMIT_TIMEOUT_MS as i64)
            .max(1) as u64;
        let deadline = Duration::from_millis(deadline_ms);

        let mut attempt = 0;
        loop {
            let store = self.store.clone();
            let txn = txn.clone();
            let outcome = match tokio::time::timeout(
                deadline,
                tokio::task::spawn_blocking(move || store.commit_transaction(&txn, balance_delta)),
            )
            .await
            {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(EngineError::EngineFault(format!("commit task panicked: {join_err}"))),
                Err(_elapsed) => {
                    warn!(deadline_ms, "commit exceeded deadline");
                    Err(EngineError::StorageTimeout(deadline_ms))
                }
            };

            match outcome {
                Ok(id) => return Ok(id),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = backoff_with_jitter(attempt);
                    warn!(attempt, ?backoff, "transient storage failure, retrying commit");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn history_for_player(
        &self,
        player_id: &str,
        page: u32,
        size: u32,
        direction: Option<Direction>,
    ) -> EngineResult<Vec<Transaction>> {
        self.store.list_transactions_for_player(player_id, page, size, direction)
    }

    /// Transactions recorded for `item_id` since `since`, used by the
    /// pricing tick's consistency check against the accumulator (spec §8
    /// invariant 5).
    pub fn transactions_since(&self, item_id: &str, since: DateTime<Utc>) -> EngineResult<Vec<Transaction>> {
        self.store.transactions_since(item_id, since)
    }
}

fn backoff_with_jitter(attempt: u32) -> Duration {
    let base = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
    let jitter_frac = jitter_sample(0.25);
    let millis = (base as f64 * (1.0 + jitter_frac)).max(0.0) as u64;
    Duration::from_millis(millis)
}

/// Uniform jitter in `[-frac, +frac]`.
fn jitter_sample(frac: f64) -> f64 {
    use rand::Rng;
    rand::thread_rng().gen_range(-frac..=frac)
}

pub fn debit_delta(total: Money) -> Money {
    -total
}

pub fn credit_delta(total: Money) -> Money {
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn sample_txn(player_id: &str, total: Money) -> Transaction {
        Transaction {
            id: 0,
            player_id: player_id.to_string(),
            player_name: "Alice".to_string(),
            item_id: "wheat".to_string(),
            direction: Direction::PlayerBuys,
            quantity: 2,
            unit_price: Money::from_f64(2.0),
            total,
            demand_pressure_snapshot: Money::ZERO,
            supply_pressure_snapshot: Money::ZERO,
            online_players_snapshot: 1,
            created_at: Utc::now(),
        }
    }

    fn build_ledger() -> Ledger {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = Arc::new(ServerConfig::new(store.clone()));
        Ledger::new(store, config)
    }

    #[tokio::test]
    async fn commit_succeeds_without_retry_on_healthy_store() {
        let ledger = build_ledger();
        ledger.set_balance("p1", Money::from_f64(100.0)).unwrap();
        let txn = sample_txn("p1", Money::from_f64(4.0));
        let id = ledger.commit(&txn, debit_delta(txn.total)).await.unwrap();
        assert!(id > 0);
        assert_eq!(ledger.balance("p1").unwrap(), Money::from_f64(96.0));
    }

    #[tokio::test]
    async fn failed_commit_leaves_balance_untouched() {
        let ledger = build_ledger();
        ledger.set_balance("p1", Money::from_f64(10.0)).unwrap();
        let txn = sample_txn("p1", Money::from_f64(40.0));
        let result = ledger.commit(&txn, debit_delta(txn.total)).await;
        assert!(matches!(result, Err(EngineError::InsufficientFunds { .. })));
        assert_eq!(ledger.balance("p1").unwrap(), Money::from_f64(10.0));
    }

    #[tokio::test]
    async fn commit_honors_a_configured_deadline() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = Arc::new(ServerConfig::new(store.clone()));
        config.set("commit_timeout_ms", "50").unwrap();
        let ledger = Ledger::new(store, config);
        ledger.set_balance("p1", Money::from_f64(100.0)).unwrap();
        let txn = sample_txn("p1", Money::from_f64(4.0));
        let id = ledger.commit(&txn, debit_delta(txn.total)).await.unwrap();
        assert!(id > 0);
    }
}
