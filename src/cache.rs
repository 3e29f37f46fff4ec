//! C8: the price cache. Wait-free reads of the last quote published by the
//! pricing engine (C6), keyed by `(item_id, direction)`. `arc_swap::ArcSwap`
//! gives readers a torn-read-free snapshot with a single writer — the
//! repricing tick is the sole publisher (spec §4.8).

use crate::model::Direction;
use crate::money::Money;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct QuoteEntry {
    pub price: Money,
    pub published_at: DateTime<Utc>,
}

pub struct PriceCache {
    entries: DashMap<(String, Direction), Arc<ArcSwap<QuoteEntry>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Lock-free, wait-free read. Returns `None` on a genuine miss (an item
    /// never published to).
    pub fn get(&self, item_id: &str, direction: Direction) -> Option<QuoteEntry> {
        self.entries
            .get(&(item_id.to_string(), direction))
            .map(|slot| (**slot.load()).clone())
    }

    /// Sole writer path: publish a new quote, replacing any prior one
    /// atomically (spec §4.8 — readers see old or new, never torn).
    pub fn publish(&self, item_id: &str, direction: Direction, price: Money, published_at: DateTime<Utc>) {
        let entry = QuoteEntry { price, published_at };
        let key = (item_id.to_string(), direction);
        match self.entries.get(&key) {
            Some(slot) => slot.store(Arc::new(entry)),
            None => {
                self.entries.insert(key, Arc::new(ArcSwap::from_pointee(entry)));
            }
        }
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_returns_none() {
        let cache = PriceCache::new();
        assert!(cache.get("wheat", Direction::PlayerBuys).is_none());
    }

    #[test]
    fn publish_then_get_round_trips() {
        let cache = PriceCache::new();
        let now = Utc::now();
        cache.publish("wheat", Direction::PlayerBuys, Money::from_f64(2.5), now);
        let entry = cache.get("wheat", Direction::PlayerBuys).unwrap();
        assert_eq!(entry.price, Money::from_f64(2.5));
    }

    #[test]
    fn directions_are_independent_slots() {
        let cache = PriceCache::new();
        let now = Utc::now();
        cache.publish("wheat", Direction::PlayerBuys, Money::from_f64(2.5), now);
        cache.publish("wheat", Direction::PlayerSells, Money::from_f64(2.2), now);
        assert_eq!(cache.get("wheat", Direction::PlayerBuys).unwrap().price, Money::from_f64(2.5));
        assert_eq!(cache.get("wheat", Direction::PlayerSells).unwrap().price, Money::from_f64(2.2));
    }
}
