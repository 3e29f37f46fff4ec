//! End-to-end scenarios for the vendor pricing engine, covering the
//! properties and scenarios of spec.md §8 against an in-memory SQLite
//! store.

use std::sync::Arc;

use vendor_pricing_engine::cache::PriceCache;
use vendor_pricing_engine::catalog::Catalog;
use vendor_pricing_engine::config::ServerConfig;
use vendor_pricing_engine::error::EngineError;
use vendor_pricing_engine::executor::{BatchEntry, TransactionExecutor};
use vendor_pricing_engine::ledger::Ledger;
use vendor_pricing_engine::model::{Category, ComplexityClass, Direction, Item};
use vendor_pricing_engine::money::Money;
use vendor_pricing_engine::pressure::PressureAccumulator;
use vendor_pricing_engine::pricing::PricingEngine;
use vendor_pricing_engine::session::SessionRegistry;
use vendor_pricing_engine::store::{SqliteStore, Store};

fn wheat() -> Item {
    Item {
        item_id: "wheat".to_string(),
        display_name: "Wheat".to_string(),
        category: Category::Crops,
        nutrition: None,
        complexity: ComplexityClass::Low,
        base_sell_price: Money::from_f64(2.00),
        base_buy_price: Money::from_f64(1.80),
        min_price: Money::from_f64(1.00),
        max_price: Money::from_f64(6.00),
        is_active: true,
    }
}

struct Harness {
    engine: Arc<PricingEngine>,
    executor: Arc<TransactionExecutor>,
    ledger: Arc<Ledger>,
    catalog: Arc<Catalog>,
}

fn build_harness() -> Harness {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let catalog = Arc::new(Catalog::new(store.clone()));
    catalog.upsert(&wheat()).unwrap();
    let config = Arc::new(ServerConfig::new(store.clone()));
    config.seed_defaults().unwrap();
    let accumulator = Arc::new(PressureAccumulator::new());
    let cache = Arc::new(PriceCache::new());
    let sessions = Arc::new(SessionRegistry::load(store.clone()).unwrap());
    let engine = Arc::new(PricingEngine::new(
        store.clone(),
        catalog.clone(),
        config.clone(),
        accumulator,
        cache,
        sessions.clone(),
        chrono_tz::UTC,
    ));
    let ledger = Arc::new(Ledger::new(store.clone(), config.clone()));
    let executor = Arc::new(TransactionExecutor::new(
        catalog.clone(),
        engine.clone(),
        ledger.clone(),
        sessions,
        config,
    ));
    Harness {
        engine,
        executor,
        ledger,
        catalog,
    }
}

/// Scenario 1: 200 sells at qty 10 with full weight (session=1.0,
/// time=1.0, correction=1.0 at online=base_online_players=25) run across
/// enough ticks to drive the price to its floor, which then holds.
#[tokio::test]
async fn floor_lock_after_sustained_sell_pressure() {
    let h = build_harness();
    let item = h.catalog.get("wheat").unwrap();

    for _ in 0..20 {
        for _ in 0..200 {
            h.engine.accumulator().feed("wheat", false, 10, Money::from_f64(10.0));
        }
        h.engine.reprice_tick().await.unwrap();
        let price = h.engine.current_price(&item).unwrap();
        if price == item.min_price {
            break;
        }
    }

    let price = h.engine.current_price(&item).unwrap();
    assert_eq!(price, item.min_price);

    // No trades this tick: floor holds.
    h.engine.reprice_tick().await.unwrap();
    assert_eq!(h.engine.current_price(&item).unwrap(), item.min_price);
}

/// Scenario 2: 200 buys at qty 10 under identical weights drive the price
/// to the ratio ceiling (`max_price_ratio * base_sell = 6.00`), which then
/// holds.
#[tokio::test]
async fn ceiling_lock_after_sustained_buy_pressure() {
    let h = build_harness();
    let item = h.catalog.get("wheat").unwrap();
    let ceiling = Money::from_f64(6.00);

    for _ in 0..20 {
        for _ in 0..200 {
            h.engine.accumulator().feed("wheat", true, 10, Money::from_f64(10.0));
        }
        h.engine.reprice_tick().await.unwrap();
        let price = h.engine.current_price(&item).unwrap();
        if price == ceiling {
            break;
        }
    }

    assert_eq!(h.engine.current_price(&item).unwrap(), ceiling);

    h.engine.reprice_tick().await.unwrap();
    assert_eq!(h.engine.current_price(&item).unwrap(), ceiling);
}

/// Scenario 3: insufficient funds leaves balance and transaction log
/// untouched.
#[tokio::test]
async fn insufficient_funds_has_no_observable_effect() {
    let h = build_harness();
    h.ledger.set_balance("p1", Money::from_f64(10.0)).unwrap();

    let result = h
        .executor
        .execute("p1", "Alice", "wheat", 6, Direction::PlayerBuys)
        .await;

    assert!(matches!(result, Err(EngineError::InsufficientFunds { .. })));
    assert_eq!(h.ledger.balance("p1").unwrap(), Money::from_f64(10.0));
    assert!(h.ledger.history_for_player("p1", 0, 10, None).unwrap().is_empty());
}

/// Scenario 4: batch of three — buy qty 1, buy qty 10000 (fails), sell qty
/// 1 — reports two successes and one failure, and only the two successes
/// persist.
#[tokio::test]
async fn batch_partial_success() {
    let h = build_harness();
    h.ledger.set_balance("p1", Money::from_f64(1000.0)).unwrap();

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

    let results = h.executor.execute_batch("p1", "Alice", &entries).await.unwrap();
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    assert_eq!(h.ledger.history_for_player("p1", 0, 10, None).unwrap().len(), 2);
}

/// Scenario 5: the player-correction ratio between online=1 and online=50
/// (against base_online_players=25) is exactly 4.0.
#[test]
fn online_player_correction_ratio_is_exactly_four() {
    use vendor_pricing_engine::pressure::player_correction;
    let low_online = player_correction(1, 25);
    let high_online = player_correction(50, 25);
    assert_eq!(low_online / high_online, Money::from_f64(4.0));
}

/// Scenario 6: 1000 concurrent sells from 1000 distinct players complete
/// with exactly 1000 transaction rows, no balance corruption, and an
/// accumulator sum equal to the sum of individual contributions.
#[tokio::test]
async fn concurrent_sells_produce_exactly_one_row_each_with_no_corruption() {
    let h = build_harness();
    let mut handles = Vec::with_capacity(1000);

    for i in 0..1000 {
        let executor = h.executor.clone();
        let player_id = format!("player-{i}");
        handles.push(tokio::spawn(async move {
            executor
                .execute(&player_id, &player_id, "wheat", 1, Direction::PlayerSells)
                .await
        }));
    }

    let mut ok_count = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok_count += 1;
        }
    }
    assert_eq!(ok_count, 1000);

    let snapshot = h.engine.accumulator().peek("wheat");
    assert_eq!(snapshot.raw_sell, 1000);

    for i in 0..1000 {
        let player_id = format!("player-{i}");
        let history = h.ledger.history_for_player(&player_id, 0, 10, None).unwrap();
        assert_eq!(history.len(), 1);
    }
}
