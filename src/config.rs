//! C1: the hot-reloadable key/value `ServerConfig` store (spec §3, §4.1).
//!
//! Distinct from [`crate::settings`]'s process-level `EngineSettings`: this
//! store lives in the database, is mutated at runtime through the admin
//! surface, and is read once per computation (a tick or a transaction) so a
//! single caller always observes a consistent snapshot.

use crate::error::EngineResult;
use crate::money::Money;
use crate::store::Store;
use std::sync::Arc;
use tracing::warn;

/// One documented default per recognized key (spec §3).
const DEFAULTS: &[(&str, &str)] = &[
    ("base_online_players", "25"),
    ("price_update_interval", "600"),
    ("max_price_change", "0.10"),
    ("min_price_ratio", "0.50"),
    ("max_price_ratio", "3.00"),
    ("session_weight_instant", "0.3"),
    ("session_weight_short", "0.6"),
    ("session_weight_medium", "0.8"),
    ("session_weight_long", "1.0"),
    ("vendor_spread_favors_vendor", "true"),
    ("commit_timeout_ms", "2000"),
];

fn default_for(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Typed accessor over the store's config table. Cheap to clone; callers
/// that need a consistent view for one computation should take a single
/// [`ConfigSnapshot`] rather than calling the accessors repeatedly.
pub struct ServerConfig {
    store: Arc<dyn Store>,
}

impl ServerConfig {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn raw(&self, key: &str) -> EngineResult<String> {
        match self.store.get_config(key)? {
            Some(v) => Ok(v),
            None => {
                let default = default_for(key).unwrap_or("0");
                warn!(key, default, "config key missing, using default");
                Ok(default.to_string())
            }
        }
    }

    pub fn int(&self, key: &str) -> EngineResult<i64> {
        Ok(self.raw(key)?.parse().unwrap_or(0))
    }

    pub fn decimal(&self, key: &str) -> EngineResult<Money> {
        Ok(Money::from_f64(self.raw(key)?.parse().unwrap_or(0.0)))
    }

    pub fn duration_seconds(&self, key: &str) -> EngineResult<u64> {
        Ok(self.raw(key)?.parse().unwrap_or(0))
    }

    pub fn bool_flag(&self, key: &str) -> EngineResult<bool> {
        Ok(matches!(self.raw(key)?.as_str(), "true" | "1"))
    }

    /// Single mutator; bumps `updated_at` as a side effect of the write.
    pub fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.store.set_config(key, value)
    }

    /// Seed the documented defaults for any key not yet present. Called by
    /// the `migrate` CLI subcommand.
    pub fn seed_defaults(&self) -> EngineResult<()> {
        self.seed_defaults_with(&[])
    }

    /// Same as [`Self::seed_defaults`], but `overrides` takes precedence
    /// over the built-in default for any key it names. Used at process
    /// startup to seed `base_online_players` from [`crate::settings::EngineSettings`]
    /// on a fresh database (spec.md §6 environment knob).
    pub fn seed_defaults_with(&self, overrides: &[(&str, String)]) -> EngineResult<()> {
        for (key, value) in DEFAULTS {
            if self.store.get_config(key)?.is_none() {
                let seeded = overrides
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or(value);
                self.store.set_config(key, seeded)?;
            }
        }
        Ok(())
    }

    /// Read every recognized key once, for callers (a tick, a transaction)
    /// that must see a single consistent view (spec §4.1).
    pub fn snapshot(&self) -> EngineResult<ConfigSnapshot> {
        Ok(ConfigSnapshot {
            base_online_players: self.int("base_online_players")?,
            price_update_interval_secs: self.duration_seconds("price_update_interval")?,
            max_price_change: self.decimal("max_price_change")?,
            min_price_ratio: self.decimal("min_price_ratio")?,
            max_price_ratio: self.decimal("max_price_ratio")?,
            session_weight_instant: self.decimal("session_weight_instant")?,
            session_weight_short: self.decimal("session_weight_short")?,
            session_weight_medium: self.decimal("session_weight_medium")?,
            session_weight_long: self.decimal("session_weight_long")?,
            vendor_spread_favors_vendor: self.bool_flag("vendor_spread_favors_vendor")?,
        })
    }
}

/// A consistent read of every recognized config key, taken once at the
/// start of a tick or a transaction (spec §4.1).
#[derive(Debug, Clone, Copy)]
pub struct ConfigSnapshot {
    pub base_online_players: i64,
    pub price_update_interval_secs: u64,
    pub max_price_change: Money,
    pub min_price_ratio: Money,
    pub max_price_ratio: Money,
    pub session_weight_instant: Money,
    pub session_weight_short: Money,
    pub session_weight_medium: Money,
    pub session_weight_long: Money,
    /// Whether the player-sell quote is discounted by `base_buy /
    /// base_sell` (vendor keeps the spread) or paid out at parity with the
    /// player-buy quote (spec.md §9 Open Question on quote-basis
    /// configuration).
    pub vendor_spread_favors_vendor: bool,
}

impl ConfigSnapshot {
    /// `S = max(1, base_online_players)` (spec §4.6).
    pub fn neutral_scale(&self) -> Money {
        Money::from_i64(self.base_online_players.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[test]
    fn missing_key_returns_documented_default() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = ServerConfig::new(store);
        assert_eq!(config.int("base_online_players").unwrap(), 25);
        assert_eq!(config.decimal("max_price_change").unwrap(), Money::from_f64(0.10));
    }

    #[test]
    fn seed_defaults_with_applies_override_on_fresh_db() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = ServerConfig::new(store);
        config
            .seed_defaults_with(&[("base_online_players", "40".to_string())])
            .unwrap();
        assert_eq!(config.int("base_online_players").unwrap(), 40);
        // Unrelated keys still get the built-in default.
        assert_eq!(config.decimal("max_price_change").unwrap(), Money::from_f64(0.10));
    }

    #[test]
    fn seed_defaults_with_does_not_clobber_an_existing_value() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = ServerConfig::new(store);
        config.seed_defaults().unwrap();
        config.set("base_online_players", "99").unwrap();
        config
            .seed_defaults_with(&[("base_online_players", "40".to_string())])
            .unwrap();
        assert_eq!(config.int("base_online_players").unwrap(), 99);
    }

    #[test]
    fn seed_defaults_then_override_persists() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = ServerConfig::new(store);
        config.seed_defaults().unwrap();
        config.set("base_online_players", "50").unwrap();
        assert_eq!(config.int("base_online_players").unwrap(), 50);
    }

    #[test]
    fn snapshot_reads_every_recognized_key() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = ServerConfig::new(store);
        config.seed_defaults().unwrap();
        let snap = config.snapshot().unwrap();
        assert_eq!(snap.neutral_scale(), Money::from_i64(25));
    }
}
