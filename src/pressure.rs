//! C5: the pressure accumulator. Per item, a running tally of raw and
//! weighted buy/sell volume since the last repricing tick. Shape grounded
//! on `mtrimner-arbitrage_bot`'s `Shared` (`Arc<DashMap<K, Arc<V>>>`) for
//! per-item concurrent mutation without a single global lock.

use crate::money::Money;
use dashmap::DashMap;
use std::sync::Mutex;

/// The four running aggregates for one item since the last `drain` (spec
/// §4.5). Wrapped in a `Mutex` per item so `drain` can atomically read and
/// zero all four fields together — contention is per-item, not global.
#[derive(Debug, Default)]
struct AccumulatorCell {
    raw_buy: i64,
    raw_sell: i64,
    weighted_buy: Money,
    weighted_sell: Money,
}

/// Snapshot returned by [`PressureAccumulator::drain`] or
/// [`PressureAccumulator::peek`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulatorSnapshot {
    pub raw_buy: i64,
    pub raw_sell: i64,
    pub weighted_buy: Money,
    pub weighted_sell: Money,
}

pub struct PressureAccumulator {
    cells: DashMap<String, Mutex<AccumulatorCell>>,
}

impl PressureAccumulator {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Feed a transaction's weighted contribution into the item's running
    /// totals (spec §4.5, §4.7 step 6). `quantity` is the raw unit count;
    /// `contribution` is `quantity * session_weight * time_weight *
    /// player_correction`, already rounded to the pressure scale.
    pub fn feed(&self, item_id: &str, is_buy: bool, quantity: i64, contribution: Money) {
        let cell = self
            .cells
            .entry(item_id.to_string())
            .or_insert_with(|| Mutex::new(AccumulatorCell::default()));
        let mut cell = cell.lock().unwrap();
        if is_buy {
            cell.raw_buy += quantity;
            cell.weighted_buy += contribution;
        } else {
            cell.raw_sell += quantity;
            cell.weighted_sell += contribution;
        }
    }

    /// `Drain(item)`: atomically read and zero the four aggregates (spec
    /// §4.5). A missing item (no trades since the last tick) drains as all
    /// zeros.
    pub fn drain(&self, item_id: &str) -> AccumulatorSnapshot {
        match self.cells.get(item_id) {
            Some(cell) => {
                let mut cell = cell.lock().unwrap();
                let snapshot = AccumulatorSnapshot {
                    raw_buy: cell.raw_buy,
                    raw_sell: cell.raw_sell,
                    weighted_buy: cell.weighted_buy,
                    weighted_sell: cell.weighted_sell,
                };
                *cell = AccumulatorCell::default();
                snapshot
            }
            None => AccumulatorSnapshot::default(),
        }
    }

    /// Read without draining — used by the executor to snapshot pressures
    /// onto the transaction row (spec §4.7 step 5) without disturbing the
    /// tick's bookkeeping.
    pub fn peek(&self, item_id: &str) -> AccumulatorSnapshot {
        match self.cells.get(item_id) {
            Some(cell) => {
                let cell = cell.lock().unwrap();
                AccumulatorSnapshot {
                    raw_buy: cell.raw_buy,
                    raw_sell: cell.raw_sell,
                    weighted_buy: cell.weighted_buy,
                    weighted_sell: cell.weighted_sell,
                }
            }
            None => AccumulatorSnapshot::default(),
        }
    }
}

impl Default for PressureAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// `player_correction(n) = min(2.0, base_online_players / max(n, 1))` (spec
/// §4.5); `n=0` yields `2.0`.
pub fn player_correction(online: i64, base_online_players: i64) -> Money {
    let denom = Money::from_i64(online.max(1));
    let ratio = Money::from_i64(base_online_players) / denom;
    ratio.min(Money::from_f64(2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_zeros_the_accumulator() {
        let acc = PressureAccumulator::new();
        acc.feed("wheat", true, 10, Money::from_f64(7.0));
        let snap = acc.drain("wheat");
        assert_eq!(snap.raw_buy, 10);
        assert_eq!(snap.weighted_buy, Money::from_f64(7.0));
        let second = acc.drain("wheat");
        assert_eq!(second.raw_buy, 0);
        assert_eq!(second.weighted_buy, Money::ZERO);
    }

    #[test]
    fn peek_does_not_reset() {
        let acc = PressureAccumulator::new();
        acc.feed("wheat", false, 5, Money::from_f64(3.0));
        let first = acc.peek("wheat");
        let second = acc.peek("wheat");
        assert_eq!(first.raw_sell, second.raw_sell);
        assert_eq!(first.raw_sell, 5);
    }

    #[test]
    fn zero_online_players_yields_double_correction() {
        assert_eq!(player_correction(0, 25), Money::from_f64(2.0));
    }

    #[test]
    fn correction_ratio_scales_inversely_with_online_count() {
        let low = player_correction(1, 25);
        let high = player_correction(50, 25);
        assert_eq!(low, Money::from_f64(2.0));
        assert_eq!(high, Money::from_f64(0.5));
        assert_eq!(low / high, Money::from_f64(4.0));
    }
}
