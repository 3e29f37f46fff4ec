//! C7: the transaction executor. Ties catalog, cache, ledger, session
//! registry and accumulator into the single atomic pipeline of spec §4.7:
//! validate → quote → debit/credit → append → feed accumulator, all under
//! a per-player lock.

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{credit_delta, debit_delta, Ledger};
use crate::model::{Direction, Transaction};
use crate::money::Money;
use crate::pricing::PricingEngine;
use crate::session::SessionRegistry;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

const MAX_BATCH_SIZE: usize = 50;

/// The outcome of one successful execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub transaction_id: i64,
    pub unit_price: Money,
    pub total: Money,
    pub new_balance: Money,
}

/// One entry of a batch request (spec §4.7 "Batch execution").
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub item_id: String,
    pub quantity: i64,
    pub direction: Direction,
}

pub struct TransactionExecutor {
    catalog: Arc<Catalog>,
    pricing: Arc<PricingEngine>,
    ledger: Arc<Ledger>,
    sessions: Arc<SessionRegistry>,
    config: Arc<ServerConfig>,
    /// Per-player serialization, mirroring the teacher's `RateLimiter`'s
    /// `Arc<Mutex<_>>` sharing pattern (spec §4.4 concurrency contract).
    player_locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl TransactionExecutor {
    pub fn new(
        catalog: Arc<Catalog>,
        pricing: Arc<PricingEngine>,
        ledger: Arc<Ledger>,
        sessions: Arc<SessionRegistry>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            catalog,
            pricing,
            ledger,
            sessions,
            config,
            player_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, player_id: &str) -> Arc<AsyncMutex<()>> {
        self.player_locks
            .entry(player_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// `Execute(player_id, item_id, quantity, direction)` (spec §4.7).
    pub async fn execute(
        &self,
        player_id: &str,
        player_name: &str,
        item_id: &str,
        quantity: i64,
        direction: Direction,
    ) -> EngineResult<ExecutionResult> {
        if !(1..=10_000).contains(&quantity) {
            return Err(EngineError::InvalidQuantity(quantity));
        }
        let item = self.catalog.get_tradable(item_id)?;

        let lock = self.lock_for(player_id);
        let _guard = lock.lock().await;

        let activity_at = Utc::now();
        if self.sessions.get(player_id).is_some() {
            self.sessions.on_activity(player_id, activity_at)?;
        } else {
            self.sessions.on_login(player_id, player_name, activity_at)?;
        }

        let balance = self.ledger.balance(player_id)?;
        let unit_price = self.pricing.quote(&item, direction)?;
        let total = (unit_price * Money::from_i64(quantity)).round_money();

        let delta = match direction {
            Direction::PlayerBuys => {
                if balance < total {
                    return Err(EngineError::InsufficientFunds {
                        balance: balance.to_string(),
                        total: total.to_string(),
                    });
                }
                debit_delta(total)
            }
            Direction::PlayerSells => credit_delta(total),
        };

        let now = activity_at;
        let online = self.sessions.online_count();
        let pressures = self.pricing.accumulator().peek(&item.item_id);
        let scale = self.config.snapshot()?.neutral_scale();

        let txn = Transaction {
            id: 0,
            player_id: player_id.to_string(),
            player_name: player_name.to_string(),
            item_id: item.item_id.clone(),
            direction,
            quantity,
            unit_price,
            total,
            demand_pressure_snapshot: (pressures.weighted_buy / scale).round_pressure(),
            supply_pressure_snapshot: (pressures.weighted_sell / scale).round_pressure(),
            online_players_snapshot: online,
            created_at: now,
        };

        let transaction_id = self.ledger.commit(&txn, delta).await?;

        let config = self.config.snapshot()?;
        let contribution = self.pricing.contribution(player_id, quantity, now, online, &config);
        self.pricing
            .accumulator()
            .feed(&item.item_id, direction == Direction::PlayerBuys, quantity, contribution);

        let new_balance = self.ledger.balance(player_id)?;
        Ok(ExecutionResult {
            transaction_id,
            unit_price,
            total,
            new_balance,
        })
    }

    /// Batch execution under one per-player lock acquisition; partial
    /// success is allowed and the batch is not itself a database
    /// transaction (spec §4.7).
    pub async fn execute_batch(
        &self,
        player_id: &str,
        player_name: &str,
        entries: &[BatchEntry],
    ) -> EngineResult<Vec<EngineResult<ExecutionResult>>> {
        if entries.len() > MAX_BATCH_SIZE {
            return Err(EngineError::Validation(format!(
                "batch size {} exceeds maximum {}",
                entries.len(),
                MAX_BATCH_SIZE
            )));
        }

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let result = self
                .execute(player_id, player_name, &entry.item_id, entry.quantity, entry.direction)
                .await;
            results.push(result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PriceCache;
    use crate::model::{Category, ComplexityClass, Item};
    use crate::pressure::PressureAccumulator;
    use crate::store::{SqliteStore, Store};

    fn wheat() -> Item {
        Item {
            item_id: "wheat".to_string(),
            display_name: "Wheat".to_string(),
            category: Category::Crops,
            nutrition: None,
            complexity: ComplexityClass::Low,
            base_sell_price: Money::from_f64(2.0),
            base_buy_price: Money::from_f64(1.8),
            min_price: Money::from_f64(1.0),
            max_price: Money::from_f64(6.0),
            is_active: true,
        }
    }

    fn build() -> (Arc<TransactionExecutor>, Arc<Ledger>) {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let catalog = Arc::new(Catalog::new(store.clone()));
        catalog.upsert(&wheat()).unwrap();
        let config = Arc::new(ServerConfig::new(store.clone()));
        config.seed_defaults().unwrap();
        let accumulator = Arc::new(PressureAccumulator::new());
        let cache = Arc::new(PriceCache::new());
        let sessions = Arc::new(SessionRegistry::load(store.clone()).unwrap());
        let pricing = Arc::new(PricingEngine::new(
            store.clone(),
            catalog.clone(),
            config.clone(),
            accumulator,
            cache,
            sessions.clone(),
            chrono_tz::UTC,
        ));
        let ledger = Arc::new(Ledger::new(store.clone(), config.clone()));
        let executor = Arc::new(TransactionExecutor::new(catalog, pricing, ledger.clone(), sessions, config));
        (executor, ledger)
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_balance_and_log_untouched() {
        let (executor, ledger) = build();
        ledger.set_balance("p1", Money::from_f64(10.0)).unwrap();

        let result = executor
            .execute("p1", "Alice", "wheat", 6, Direction::PlayerBuys)
            .await;

        assert!(matches!(result, Err(EngineError::InsufficientFunds { .. })));
        assert_eq!(ledger.balance("p1").unwrap(), Money::from_f64(10.0));
        assert!(ledger.history_for_player("p1", 0, 10, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_buy_debits_balance_and_appends_transaction() {
        let (executor, ledger) = build();
        ledger.set_balance("p1", Money::from_f64(100.0)).unwrap();

        let result = executor
            .execute("p1", "Alice", "wheat", 2, Direction::PlayerBuys)
            .await
            .unwrap();

        assert_eq!(result.total, Money::from_f64(4.0));
        assert_eq!(result.new_balance, Money::from_f64(96.0));
        assert_eq!(ledger.history_for_player("p1", 0, 10, None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_allows_partial_success() {
        let (executor, ledger) = build();
        ledger.set_balance("p1", Money::from_f64(100.0)).unwrap();

        let entries = vec![
            BatchEntry {
                item_id: "wheat".to_string(),
                quantity: 1,
                direction: Direction::PlayerBuys,
            },
            BatchEntry {
                item_id: "wheat".to_string(),
                quantity: 10_000,
                direction: Direction::PlayerBuys,
            },
            BatchEntry {
                item_id: "wheat".to_string(),
                quantity: 1,
                direction: Direction::PlayerSells,
            },
        ];

        let results = executor.execute_batch("p1", "Alice", &entries).await.unwrap();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(ledger.history_for_player("p1", 0, 10, None).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_item_is_rejected_before_locking() {
        let (executor, _ledger) = build();
        let result = executor.execute("p1", "Alice", "ghost", 1, Direction::PlayerBuys).await;
        assert!(matches!(result, Err(EngineError::UnknownItem(_))));
    }
}
