//! C6: the pricing engine. Tracks `current_price` per item and runs the
//! periodic repricing tick that folds the pressure accumulator into a new,
//! clamped price (spec §4.6). The scheduler loop is grounded on the
//! teacher's (rust/ variant) `commands::live::run_async` event loop: a
//! `tokio::time::interval` driving a `tokio::select!` against a shutdown
//! signal.

use crate::cache::PriceCache;
use crate::catalog::Catalog;
use crate::config::{ConfigSnapshot, ServerConfig};
use crate::error::EngineResult;
use crate::model::{Direction, Item, PriceHistoryEntry};
use crate::money::Money;
use crate::pressure::{player_correction, PressureAccumulator};
use crate::session::SessionRegistry;
use crate::store::Store;
use crate::timeweight::time_of_day_weight;
use chrono::Utc;
use chrono_tz::Tz;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct PricingEngine {
    store: Arc<dyn Store>,
    catalog: Arc<Catalog>,
    config: Arc<ServerConfig>,
    accumulator: Arc<PressureAccumulator>,
    cache: Arc<PriceCache>,
    sessions: Arc<SessionRegistry>,
    zone: Tz,
}

impl PricingEngine {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<Catalog>,
        config: Arc<ServerConfig>,
        accumulator: Arc<PressureAccumulator>,
        cache: Arc<PriceCache>,
        sessions: Arc<SessionRegistry>,
        zone: Tz,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            accumulator,
            cache,
            sessions,
            zone,
        }
    }

    pub fn accumulator(&self) -> &PressureAccumulator {
        &self.accumulator
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Current tracked price for an item; `Unset` defaults to
    /// `base_sell_price` (spec §4.9).
    pub fn current_price(&self, item: &Item) -> EngineResult<Money> {
        match self.store.get_current_price(&item.item_id)? {
            Some(price) => Ok(price),
            None => Ok(item.base_sell_price),
        }
    }

    /// Derive a quote for a direction from the published current price
    /// (spec §4.6): `PlayerBuys` pays `current_price`; `PlayerSells` pays
    /// out `current_price * (base_buy / base_sell)` when
    /// `vendor_spread_favors_vendor` is set, or `current_price` at parity
    /// otherwise. Both clamped. On a cache miss, computes directly and
    /// populates the cache (spec §4.8).
    pub fn quote(&self, item: &Item, direction: Direction) -> EngineResult<Money> {
        if let Some(entry) = self.cache.get(&item.item_id, direction) {
            return Ok(entry.price);
        }

        let current = self.current_price(item)?;
        let favors_vendor = self.config.bool_flag("vendor_spread_favors_vendor")?;
        let quote = match direction {
            Direction::PlayerBuys => item.clamp_price(current),
            Direction::PlayerSells => {
                let ratio = sell_ratio(item, favors_vendor);
                item.clamp_price((current * ratio).round_money())
            }
        };
        self.cache.publish(&item.item_id, direction, quote, Utc::now());
        Ok(quote)
    }

    /// One repricing tick over every active item (spec §4.6). Errors for a
    /// single item are swallowed with a warning: that item keeps its
    /// previous price and its history entry is omitted, per spec §7 ("the
    /// pricing tick never retries within a tick").
    pub async fn reprice_tick(&self) -> EngineResult<()> {
        let config = self.config.snapshot()?;
        let items = self.catalog.list_active()?;
        let online = self.sessions.online_count();
        let tick_at = Utc::now();

        info!(item_count = items.len(), online, "repricing tick starting");

        for item in items {
            if let Err(e) = self.reprice_one(&item, &config, online, tick_at) {
                warn!(item_id = %item.item_id, error = %e, "repricing failed for item, keeping previous price");
            }
        }

        info!("repricing tick complete");
        Ok(())
    }

    fn reprice_one(
        &self,
        item: &Item,
        config: &ConfigSnapshot,
        online: i64,
        tick_at: chrono::DateTime<Utc>,
    ) -> EngineResult<()> {
        let previous = self.current_price(item)?;
        let snapshot = self.accumulator.drain(&item.item_id);
        let scale = config.neutral_scale();

        let demand = (snapshot.weighted_buy / scale).round_pressure();
        let supply = (snapshot.weighted_sell / scale).round_pressure();
        let net = (demand - supply).round_pressure();

        let change = net.clamp(-config.max_price_change, config.max_price_change);
        let mut candidate = (previous * (Money::ONE + change)).round_money();

        let no_volume = snapshot.weighted_buy.is_zero() && snapshot.weighted_sell.is_zero();
        if net.is_zero() && no_volume {
            candidate = decay_toward_base(previous, item.base_sell_price, config.max_price_change);
        }

        let combined_min = item
            .min_price
            .max((config.min_price_ratio * item.base_sell_price).round_money());
        let combined_max = item
            .max_price
            .min((config.max_price_ratio * item.base_sell_price).round_money());
        let new_price = candidate.clamp(combined_min, combined_max).round_money();

        self.store.set_current_price(&item.item_id, new_price, tick_at)?;
        self.cache.publish(&item.item_id, Direction::PlayerBuys, item.clamp_price(new_price), tick_at);
        let ratio = sell_ratio(item, config.vendor_spread_favors_vendor);
        let sell_quote = item.clamp_price((new_price * ratio).round_money());
        self.cache.publish(&item.item_id, Direction::PlayerSells, sell_quote, tick_at);

        let percent_change = if previous.is_zero() {
            Money::ZERO
        } else {
            (((new_price - previous) / previous) * Money::from_i64(100)).round_pressure()
        };

        let correction = player_correction(online, config.base_online_players);

        self.store.append_price_history(&PriceHistoryEntry {
            item_id: item.item_id.clone(),
            tick_at,
            previous_price: previous,
            new_price,
            percent_change,
            demand_pressure: demand,
            supply_pressure: supply,
            net_pressure: net,
            raw_buy_volume: snapshot.raw_buy,
            raw_sell_volume: snapshot.raw_sell,
            weighted_buy_volume: snapshot.weighted_buy.round_volume(),
            weighted_sell_volume: snapshot.weighted_sell.round_volume(),
            online_players: online,
            player_correction: correction,
        })?;

        debug!(
            item_id = %item.item_id,
            %previous,
            %new_price,
            %net,
            "item repriced"
        );
        Ok(())
    }

    /// The weighted contribution of one trade to the accumulator (spec
    /// §4.5): `quantity * session_weight * time_of_day_weight *
    /// player_correction`.
    pub fn contribution(
        &self,
        player_id: &str,
        quantity: i64,
        at: chrono::DateTime<Utc>,
        online: i64,
        config: &ConfigSnapshot,
    ) -> Money {
        let session_weight = self.sessions.weight_for(player_id, config);
        let time_weight = time_of_day_weight(at, self.zone);
        let correction = player_correction(online, config.base_online_players);
        (Money::from_i64(quantity) * session_weight * time_weight * correction).round_pressure()
    }

    /// Run the scheduler loop: every `price_update_interval` seconds
    /// (jittered ±5%), run one tick, until `shutdown` fires. The tick
    /// itself is never interrupted mid-item (spec §5 "Cancellation").
    pub async fn run_scheduler(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            let interval_secs = match self.config.duration_seconds("price_update_interval") {
                Ok(secs) => secs.max(1),
                Err(_) => 600,
            };
            let delay = jittered_delay(interval_secs, 0.05);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = self.reprice_tick().await {
                        warn!(error = %e, "repricing tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown signal received, exiting scheduler loop");
                        break;
                    }
                }
            }
        }
    }
}

/// Decay toward `base_sell_price` by one step of at most
/// `max_price_change / 4` (spec §4.6 tie-break).
fn decay_toward_base(previous: Money, base_sell_price: Money, max_price_change: Money) -> Money {
    let step = (previous * max_price_change / Money::from_i64(4)).round_money();
    let diff = base_sell_price - previous;
    if diff.is_zero() {
        previous
    } else if diff.is_positive() {
        (previous + step.min(diff)).round_money()
    } else {
        (previous - step.min(diff.abs())).round_money()
    }
}

/// The player-sell quote ratio against `current_price`: the vendor's spread
/// (`base_buy / base_sell`) when `favors_vendor`, parity otherwise (spec.md
/// §9 Open Question on quote-basis configuration).
fn sell_ratio(item: &Item, favors_vendor: bool) -> Money {
    if favors_vendor {
        item.base_buy_price / item.base_sell_price
    } else {
        Money::ONE
    }
}

fn jittered_delay(base_secs: u64, jitter_frac: f64) -> Duration {
    let jitter = rand::thread_rng().gen_range(-jitter_frac..=jitter_frac);
    let millis = (base_secs as f64 * 1000.0 * (1.0 + jitter)).max(0.0) as u64;
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_moves_one_bounded_step_toward_base() {
        let previous = Money::from_f64(1.00);
        let base = Money::from_f64(2.00);
        let decayed = decay_toward_base(previous, base, Money::from_f64(0.10));
        // step = 1.00 * 0.10 / 4 = 0.025 -> rounds to 0.03 (half-up at 2dp)
        assert_eq!(decayed, Money::from_f64(1.03));
    }

    #[test]
    fn decay_does_not_overshoot_small_gap() {
        let previous = Money::from_f64(1.99);
        let base = Money::from_f64(2.00);
        let decayed = decay_toward_base(previous, base, Money::from_f64(0.10));
        assert_eq!(decayed, base);
    }

    #[test]
    fn sell_ratio_is_parity_when_spread_does_not_favor_vendor() {
        let item = Item {
            item_id: "wheat".to_string(),
            display_name: "Wheat".to_string(),
            category: crate::model::Category::Crops,
            nutrition: None,
            complexity: crate::model::ComplexityClass::Low,
            base_sell_price: Money::from_f64(2.0),
            base_buy_price: Money::from_f64(1.8),
            min_price: Money::from_f64(1.0),
            max_price: Money::from_f64(6.0),
            is_active: true,
        };
        assert_eq!(sell_ratio(&item, true), Money::from_f64(0.9));
        assert_eq!(sell_ratio(&item, false), Money::ONE);
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        for _ in 0..50 {
            let d = jittered_delay(600, 0.05);
            assert!(d.as_secs_f64() >= 600.0 * 0.95 - 1.0);
            assert!(d.as_secs_f64() <= 600.0 * 1.05 + 1.0);
        }
    }
}
