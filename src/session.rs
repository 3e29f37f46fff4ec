//! C3: the session registry. Tracks who is online, derives the session-age
//! weight tier (spec §4.3). Mirrors the `Arc<DashMap<K, Arc<V>>>` shape of
//! `mtrimner-arbitrage_bot`'s `Shared` state for per-key concurrent access
//! without a global lock.

use crate::config::ConfigSnapshot;
use crate::model::{PlayerSession, SessionTier};
use crate::money::Money;
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

pub struct SessionRegistry {
    sessions: DashMap<String, PlayerSession>,
    store: Arc<dyn Store>,
}

impl SessionRegistry {
    /// Build the in-memory registry, hydrating it from the last durable
    /// snapshot so a restart does not forget who was online.
    pub fn load(store: Arc<dyn Store>) -> crate::error::EngineResult<Self> {
        let sessions = DashMap::new();
        for session in store.online_sessions()? {
            sessions.insert(session.player_id.clone(), session);
        }
        Ok(Self { sessions, store })
    }

    /// `OnLogin(player_id, name, now)` (spec §4.3).
    pub fn on_login(&self, player_id: &str, name: &str, now: DateTime<Utc>) -> crate::error::EngineResult<()> {
        let session = PlayerSession {
            player_id: player_id.to_string(),
            name: name.to_string(),
            login_time: now,
            last_activity: now,
            is_online: true,
            tier: SessionTier::Instant,
        };
        self.store.upsert_session(&session)?;
        self.sessions.insert(player_id.to_string(), session);
        Ok(())
    }

    /// `OnActivity(player_id, now)`: refresh `last_activity` and recompute
    /// the session-age tier (spec §4.3).
    pub fn on_activity(&self, player_id: &str, now: DateTime<Utc>) -> crate::error::EngineResult<()> {
        if let Some(mut entry) = self.sessions.get_mut(player_id) {
            entry.last_activity = now;
            entry.tier = tier_for_age(now - entry.login_time);
            self.store.upsert_session(&entry)?;
        }
        Ok(())
    }

    /// `OnLogout(player_id)`: mark offline, freeze the last weight tier.
    pub fn on_logout(&self, player_id: &str) -> crate::error::EngineResult<()> {
        if let Some(mut entry) = self.sessions.get_mut(player_id) {
            entry.is_online = false;
            self.store.upsert_session(&entry)?;
        }
        Ok(())
    }

    /// `OnlineCount()`.
    pub fn online_count(&self) -> i64 {
        self.sessions.iter().filter(|e| e.is_online).count() as i64
    }

    /// `WeightFor(player_id, at_time)`: the weight for the player's tier as
    /// of `at_time`, `session_weight_instant` when the player is unknown.
    pub fn weight_for(&self, player_id: &str, config: &ConfigSnapshot) -> Money {
        match self.sessions.get(player_id) {
            Some(session) => weight_for_tier(session.tier, config),
            None => config.session_weight_instant,
        }
    }

    pub fn get(&self, player_id: &str) -> Option<PlayerSession> {
        self.sessions.get(player_id).map(|e| e.clone())
    }
}

/// Session-age tier boundaries (spec §4.3): <10m instant, 10-30m short,
/// 30-120m medium, >=120m long.
fn tier_for_age(age: Duration) -> SessionTier {
    let minutes = age.num_minutes();
    if minutes < 10 {
        SessionTier::Instant
    } else if minutes < 30 {
        SessionTier::Short
    } else if minutes < 120 {
        SessionTier::Medium
    } else {
        SessionTier::Long
    }
}

fn weight_for_tier(tier: SessionTier, config: &ConfigSnapshot) -> Money {
    match tier {
        SessionTier::Instant => config.session_weight_instant,
        SessionTier::Short => config.session_weight_short,
        SessionTier::Medium => config.session_weight_medium,
        SessionTier::Long => config.session_weight_long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn config() -> ConfigSnapshot {
        ConfigSnapshot {
            base_online_players: 25,
            price_update_interval_secs: 600,
            max_price_change: Money::from_f64(0.10),
            min_price_ratio: Money::from_f64(0.50),
            max_price_ratio: Money::from_f64(3.00),
            session_weight_instant: Money::from_f64(0.3),
            session_weight_short: Money::from_f64(0.6),
            session_weight_medium: Money::from_f64(0.8),
            session_weight_long: Money::from_f64(1.0),
            vendor_spread_favors_vendor: true,
        }
    }

    #[test]
    fn unknown_player_gets_instant_weight() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let registry = SessionRegistry::load(store).unwrap();
        assert_eq!(registry.weight_for("ghost", &config()), Money::from_f64(0.3));
    }

    #[test]
    fn tier_escalates_with_session_age() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let registry = SessionRegistry::load(store).unwrap();
        let login = Utc::now() - Duration::minutes(45);
        registry.on_login("p1", "Alice", login).unwrap();
        registry.on_activity("p1", login + Duration::minutes(45)).unwrap();
        assert_eq!(registry.weight_for("p1", &config()), Money::from_f64(0.8));
    }

    #[test]
    fn logout_marks_offline_without_losing_tier() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let registry = SessionRegistry::load(store).unwrap();
        registry.on_login("p1", "Alice", Utc::now()).unwrap();
        assert_eq!(registry.online_count(), 1);
        registry.on_logout("p1").unwrap();
        assert_eq!(registry.online_count(), 0);
        assert_eq!(registry.weight_for("p1", &config()), Money::from_f64(0.3));
    }
}
