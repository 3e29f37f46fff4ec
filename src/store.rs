//! Persistence layer: a narrow repository trait plus a SQLite
//! implementation covering the five entities of spec §3 and the
//! constraints/indices of spec §6.
//!
//! Connections are pooled behind a single `Arc<Mutex<Connection>>` the way
//! `crypto-strategies::state_manager::SqliteStateManager` does; WAL mode
//! lets concurrent readers proceed while a writer holds the mutex for the
//! duration of one statement or transaction.

use crate::error::{EngineError, EngineResult};
use crate::model::{
    Category, ComplexityClass, Direction, Item, Nutrition, PlayerSession, PriceHistoryEntry,
    SessionTier, Transaction,
};
use crate::money::Money;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Narrow repository seam (spec §9): item lookup, atomic balance+transaction
/// commit, session upsert, history append, config read/write, price
/// publication. Any store providing equivalent atomicity satisfies it.
pub trait Store: Send + Sync {
    fn get_item(&self, item_id: &str) -> EngineResult<Option<Item>>;
    fn list_items(&self, category: Option<Category>) -> EngineResult<Vec<Item>>;
    fn list_active_items(&self) -> EngineResult<Vec<Item>>;
    fn upsert_item(&self, item: &Item) -> EngineResult<()>;

    fn get_balance(&self, player_id: &str) -> EngineResult<Money>;
    fn set_balance(&self, player_id: &str, balance: Money) -> EngineResult<()>;

    /// Atomically apply `balance_delta` to `player_id`'s balance and append
    /// `txn` as a durable row in the same operation. Rejects (without
    /// mutating anything) if the resulting balance would be negative.
    /// Returns the assigned transaction id.
    fn commit_transaction(&self, txn: &Transaction, balance_delta: Money) -> EngineResult<i64>;

    fn list_transactions_for_player(
        &self,
        player_id: &str,
        page: u32,
        size: u32,
        direction: Option<Direction>,
    ) -> EngineResult<Vec<Transaction>>;

    /// Transactions for `item_id` with `created_at >= since`, ascending by
    /// id. Used by the repricing tick to cross-check accumulator counts
    /// (spec §8 invariant 5) and to keep the most recent tick interval
    /// always queryable (spec §3 "Lifecycle").
    fn transactions_since(&self, item_id: &str, since: DateTime<Utc>) -> EngineResult<Vec<Transaction>>;

    fn get_current_price(&self, item_id: &str) -> EngineResult<Option<Money>>;
    fn set_current_price(&self, item_id: &str, price: Money, at: DateTime<Utc>) -> EngineResult<()>;

    fn append_price_history(&self, entry: &PriceHistoryEntry) -> EngineResult<()>;
    fn latest_price_history(&self, item_id: &str, limit: u32) -> EngineResult<Vec<PriceHistoryEntry>>;

    fn get_session(&self, player_id: &str) -> EngineResult<Option<PlayerSession>>;
    fn upsert_session(&self, session: &PlayerSession) -> EngineResult<()>;
    fn online_sessions(&self) -> EngineResult<Vec<PlayerSession>>;

    fn get_config(&self, key: &str) -> EngineResult<Option<String>>;
    fn set_config(&self, key: &str, value: &str) -> EngineResult<()>;
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> EngineResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EngineError::EngineFault(format!("failed to create db directory: {e}"))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        info!("SQLite store initialized at {}", db_path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS items (
                item_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                category TEXT NOT NULL,
                hunger INTEGER,
                saturation REAL,
                complexity TEXT NOT NULL,
                base_sell_price TEXT NOT NULL,
                base_buy_price TEXT NOT NULL,
                min_price TEXT NOT NULL,
                max_price TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS balances (
                player_id TEXT PRIMARY KEY,
                balance TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id TEXT NOT NULL,
                player_name TEXT NOT NULL,
                item_id TEXT NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
                direction TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                unit_price TEXT NOT NULL,
                total TEXT NOT NULL,
                demand_pressure_snapshot TEXT NOT NULL,
                supply_pressure_snapshot TEXT NOT NULL,
                online_players_snapshot INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_txn_player_created
                ON transactions(player_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_txn_item_created
                ON transactions(item_id, created_at);

            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
                tick_at TEXT NOT NULL,
                previous_price TEXT NOT NULL,
                new_price TEXT NOT NULL,
                percent_change TEXT NOT NULL,
                demand_pressure TEXT NOT NULL,
                supply_pressure TEXT NOT NULL,
                net_pressure TEXT NOT NULL,
                raw_buy_volume INTEGER NOT NULL,
                raw_sell_volume INTEGER NOT NULL,
                weighted_buy_volume TEXT NOT NULL,
                weighted_sell_volume TEXT NOT NULL,
                online_players INTEGER NOT NULL,
                player_correction TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_item_tick
                ON price_history(item_id, tick_at DESC);

            CREATE TABLE IF NOT EXISTS current_prices (
                item_id TEXT PRIMARY KEY REFERENCES items(item_id) ON DELETE CASCADE,
                price TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                player_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                login_time TEXT NOT NULL,
                last_activity TEXT NOT NULL,
                is_online INTEGER NOT NULL,
                tier TEXT NOT NULL
            );
            ",
        )?;

        debug!("schema created/verified");
        Ok(())
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let category: String = row.get("category")?;
        let complexity: String = row.get("complexity")?;
        let hunger: Option<i32> = row.get("hunger")?;
        let saturation: Option<f64> = row.get("saturation")?;
        Ok(Item {
            item_id: row.get("item_id")?,
            display_name: row.get("display_name")?,
            category: Category::from_str(&category).unwrap_or(Category::Vanilla),
            nutrition: hunger.zip(saturation).map(|(hunger, saturation)| Nutrition {
                hunger,
                saturation,
            }),
            complexity: ComplexityClass::from_str(&complexity).unwrap_or(ComplexityClass::Low),
            base_sell_price: parse_money(&row.get::<_, String>("base_sell_price")?)?,
            base_buy_price: parse_money(&row.get::<_, String>("base_buy_price")?)?,
            min_price: parse_money(&row.get::<_, String>("min_price")?)?,
            max_price: parse_money(&row.get::<_, String>("max_price")?)?,
            is_active: row.get::<_, i64>("is_active")? != 0,
        })
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let direction: String = row.get("direction")?;
        let created_at: String = row.get("created_at")?;
        Ok(Transaction {
            id: row.get("id")?,
            player_id: row.get("player_id")?,
            player_name: row.get("player_name")?,
            item_id: row.get("item_id")?,
            direction: Direction::from_str(&direction).unwrap_or(Direction::PlayerBuys),
            quantity: row.get("quantity")?,
            unit_price: parse_money(&row.get::<_, String>("unit_price")?)?,
            total: parse_money(&row.get::<_, String>("total")?)?,
            demand_pressure_snapshot: parse_money(&row.get::<_, String>("demand_pressure_snapshot")?)?,
            supply_pressure_snapshot: parse_money(&row.get::<_, String>("supply_pressure_snapshot")?)?,
            online_players_snapshot: row.get("online_players_snapshot")?,
            created_at: parse_time(&created_at),
        })
    }

    fn row_to_history(row: &rusqlite::Row) -> rusqlite::Result<PriceHistoryEntry> {
        Ok(PriceHistoryEntry {
            item_id: row.get("item_id")?,
            tick_at: parse_time(&row.get::<_, String>("tick_at")?),
            previous_price: parse_money(&row.get::<_, String>("previous_price")?)?,
            new_price: parse_money(&row.get::<_, String>("new_price")?)?,
            percent_change: parse_money(&row.get::<_, String>("percent_change")?)?,
            demand_pressure: parse_money(&row.get::<_, String>("demand_pressure")?)?,
            supply_pressure: parse_money(&row.get::<_, String>("supply_pressure")?)?,
            net_pressure: parse_money(&row.get::<_, String>("net_pressure")?)?,
            raw_buy_volume: row.get("raw_buy_volume")?,
            raw_sell_volume: row.get("raw_sell_volume")?,
            weighted_buy_volume: parse_money(&row.get::<_, String>("weighted_buy_volume")?)?,
            weighted_sell_volume: parse_money(&row.get::<_, String>("weighted_sell_volume")?)?,
            online_players: row.get("online_players")?,
            player_correction: parse_money(&row.get::<_, String>("player_correction")?)?,
        })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<PlayerSession> {
        let tier: String = row.get("tier")?;
        Ok(PlayerSession {
            player_id: row.get("player_id")?,
            name: row.get("name")?,
            login_time: parse_time(&row.get::<_, String>("login_time")?),
            last_activity: parse_time(&row.get::<_, String>("last_activity")?),
            is_online: row.get::<_, i64>("is_online")? != 0,
            tier: match tier.as_str() {
                "Short" => SessionTier::Short,
                "Medium" => SessionTier::Medium,
                "Long" => SessionTier::Long,
                _ => SessionTier::Instant,
            },
        })
    }
}

/// Parse a persisted monetary/pressure column straight into `Decimal` text,
/// never through binary floating point. A malformed column is storage
/// corruption, not a zero balance: propagate it as a read error rather than
/// silently defaulting.
fn parse_money(s: &str) -> rusqlite::Result<Money> {
    Decimal::from_str(s).map(Money::from_decimal).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap())
}

fn tier_str(tier: SessionTier) -> &'static str {
    match tier {
        SessionTier::Instant => "Instant",
        SessionTier::Short => "Short",
        SessionTier::Medium => "Medium",
        SessionTier::Long => "Long",
    }
}

impl Store for SqliteStore {
    fn get_item(&self, item_id: &str) -> EngineResult<Option<Item>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM items WHERE item_id = ?1",
            params![item_id],
            Self::row_to_item,
        )
        .optional()
        .map_err(EngineError::from)
    }

    fn list_items(&self, category: Option<Category>) -> EngineResult<Vec<Item>> {
        let conn = self.conn.lock().unwrap();
        let items = if let Some(category) = category {
            let mut stmt = conn.prepare("SELECT * FROM items WHERE category = ?1")?;
            let result = stmt
                .query_map(params![category.as_str()], Self::row_to_item)?
                .collect::<Result<Vec<_>, _>>()?;
            result
        } else {
            let mut stmt = conn.prepare("SELECT * FROM items")?;
            let result = stmt
                .query_map([], Self::row_to_item)?
                .collect::<Result<Vec<_>, _>>()?;
            result
        };
        Ok(items)
    }

    fn list_active_items(&self) -> EngineResult<Vec<Item>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM items WHERE is_active = 1")?;
        let items = stmt
            .query_map([], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn upsert_item(&self, item: &Item) -> EngineResult<()> {
        item.validate()?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO items
                (item_id, display_name, category, hunger, saturation, complexity,
                 base_sell_price, base_buy_price, min_price, max_price, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(item_id) DO UPDATE SET
                display_name=excluded.display_name,
                category=excluded.category,
                hunger=excluded.hunger,
                saturation=excluded.saturation,
                complexity=excluded.complexity,
                base_sell_price=excluded.base_sell_price,
                base_buy_price=excluded.base_buy_price,
                min_price=excluded.min_price,
                max_price=excluded.max_price,
                is_active=excluded.is_active",
            params![
                item.item_id,
                item.display_name,
                item.category.as_str(),
                item.nutrition.map(|n| n.hunger),
                item.nutrition.map(|n| n.saturation),
                item.complexity.as_str(),
                item.base_sell_price.to_string(),
                item.base_buy_price.to_string(),
                item.min_price.to_string(),
                item.max_price.to_string(),
                item.is_active as i64,
            ],
        )?;
        Ok(())
    }

    fn get_balance(&self, player_id: &str) -> EngineResult<Money> {
        let conn = self.conn.lock().unwrap();
        let balance: Option<String> = conn
            .query_row(
                "SELECT balance FROM balances WHERE player_id = ?1",
                params![player_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match balance {
            Some(s) => parse_money(&s)?,
            None => Money::ZERO,
        })
    }

    fn set_balance(&self, player_id: &str, balance: Money) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO balances (player_id, balance, last_updated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(player_id) DO UPDATE SET balance=excluded.balance, last_updated=excluded.last_updated",
            params![player_id, balance.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn commit_transaction(&self, txn: &Transaction, balance_delta: Money) -> EngineResult<i64> {
        txn.validate()?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT balance FROM balances WHERE player_id = ?1",
                params![txn.player_id],
                |row| row.get(0),
            )
            .optional()?;
        let current_balance = match current {
            Some(s) => parse_money(&s)?,
            None => Money::ZERO,
        };
        let new_balance = current_balance + balance_delta;

        if new_balance.is_negative() {
            return Err(EngineError::InsufficientFunds {
                balance: current_balance.to_string(),
                total: txn.total.to_string(),
            });
        }

        tx.execute(
            "INSERT INTO balances (player_id, balance, last_updated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(player_id) DO UPDATE SET balance=excluded.balance, last_updated=excluded.last_updated",
            params![txn.player_id, new_balance.to_string(), Utc::now().to_rfc3339()],
        )?;

        tx.execute(
            "INSERT INTO transactions
                (player_id, player_name, item_id, direction, quantity, unit_price, total,
                 demand_pressure_snapshot, supply_pressure_snapshot, online_players_snapshot, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                txn.player_id,
                txn.player_name,
                txn.item_id,
                txn.direction.as_str(),
                txn.quantity,
                txn.unit_price.to_string(),
                txn.total.to_string(),
                txn.demand_pressure_snapshot.to_string(),
                txn.supply_pressure_snapshot.to_string(),
                txn.online_players_snapshot,
                txn.created_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.commit()?;
        debug!(
            "committed transaction {} for {} ({} x{} @ {})",
            id, txn.player_id, txn.item_id, txn.quantity, txn.unit_price
        );
        Ok(id)
    }

    fn list_transactions_for_player(
        &self,
        player_id: &str,
        page: u32,
        size: u32,
        direction: Option<Direction>,
    ) -> EngineResult<Vec<Transaction>> {
        let conn = self.conn.lock().unwrap();
        let offset = (page as i64) * (size as i64);
        let rows = if let Some(direction) = direction {
            let mut stmt = conn.prepare(
                "SELECT * FROM transactions WHERE player_id = ?1 AND direction = ?2
                 ORDER BY created_at DESC LIMIT ?3 OFFSET ?4",
            )?;
            let result = stmt
                .query_map(
                    params![player_id, direction.as_str(), size as i64, offset],
                    Self::row_to_transaction,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            result
        } else {
            let mut stmt = conn.prepare(
                "SELECT * FROM transactions WHERE player_id = ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            )?;
            let result = stmt
                .query_map(params![player_id, size as i64, offset], Self::row_to_transaction)?
                .collect::<Result<Vec<_>, _>>()?;
            result
        };
        Ok(rows)
    }

    fn transactions_since(&self, item_id: &str, since: DateTime<Utc>) -> EngineResult<Vec<Transaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM transactions WHERE item_id = ?1 AND created_at >= ?2 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![item_id, since.to_rfc3339()], Self::row_to_transaction)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_current_price(&self, item_id: &str) -> EngineResult<Option<Money>> {
        let conn = self.conn.lock().unwrap();
        let price: Option<String> = conn
            .query_row(
                "SELECT price FROM current_prices WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;
        price.map(|s| parse_money(&s)).transpose().map_err(EngineError::from)
    }

    fn set_current_price(&self, item_id: &str, price: Money, at: DateTime<Utc>) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO current_prices (item_id, price, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id) DO UPDATE SET price=excluded.price, updated_at=excluded.updated_at",
            params![item_id, price.to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn append_price_history(&self, entry: &PriceHistoryEntry) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO price_history
                (item_id, tick_at, previous_price, new_price, percent_change,
                 demand_pressure, supply_pressure, net_pressure,
                 raw_buy_volume, raw_sell_volume, weighted_buy_volume, weighted_sell_volume,
                 online_players, player_correction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                entry.item_id,
                entry.tick_at.to_rfc3339(),
                entry.previous_price.to_string(),
                entry.new_price.to_string(),
                entry.percent_change.to_string(),
                entry.demand_pressure.to_string(),
                entry.supply_pressure.to_string(),
                entry.net_pressure.to_string(),
                entry.raw_buy_volume,
                entry.raw_sell_volume,
                entry.weighted_buy_volume.to_string(),
                entry.weighted_sell_volume.to_string(),
                entry.online_players,
                entry.player_correction.to_string(),
            ],
        )?;
        Ok(())
    }

    fn latest_price_history(&self, item_id: &str, limit: u32) -> EngineResult<Vec<PriceHistoryEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM price_history WHERE item_id = ?1 ORDER BY tick_at DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![item_id, limit as i64], Self::row_to_history)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_session(&self, player_id: &str) -> EngineResult<Option<PlayerSession>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM sessions WHERE player_id = ?1",
            params![player_id],
            Self::row_to_session,
        )
        .optional()
        .map_err(EngineError::from)
    }

    fn upsert_session(&self, session: &PlayerSession) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (player_id, name, login_time, last_activity, is_online, tier)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(player_id) DO UPDATE SET
                name=excluded.name,
                login_time=excluded.login_time,
                last_activity=excluded.last_activity,
                is_online=excluded.is_online,
                tier=excluded.tier",
            params![
                session.player_id,
                session.name,
                session.login_time.to_rfc3339(),
                session.last_activity.to_rfc3339(),
                session.is_online as i64,
                tier_str(session.tier),
            ],
        )?;
        Ok(())
    }

    fn online_sessions(&self) -> EngineResult<Vec<PlayerSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM sessions WHERE is_online = 1")?;
        let rows = stmt
            .query_map([], Self::row_to_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_config(&self, key: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM config WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(EngineError::from)
    }

    fn set_config(&self, key: &str, value: &str) -> EngineResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
