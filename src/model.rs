//! Core data model: catalog items, transactions, price history and
//! player sessions (spec §3).

use crate::error::EngineError;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog category tag. A plain enum, not a class hierarchy (spec §9
/// "Polymorphism").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Vanilla,
    FoodCore,
    Crops,
    FoodExtended,
    Tools,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vanilla => "Vanilla",
            Category::FoodCore => "FoodCore",
            Category::Crops => "Crops",
            Category::FoodExtended => "FoodExtended",
            Category::Tools => "Tools",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Vanilla" => Some(Category::Vanilla),
            "FoodCore" => Some(Category::FoodCore),
            "Crops" => Some(Category::Crops),
            "FoodExtended" => Some(Category::FoodExtended),
            "Tools" => Some(Category::Tools),
            _ => None,
        }
    }
}

/// Complexity class used by admin tooling to gauge crafting depth; carried
/// through unchanged, never interpreted by the pricing engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityClass {
    Low,
    Medium,
    High,
    Extreme,
}

impl ComplexityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityClass::Low => "Low",
            ComplexityClass::Medium => "Medium",
            ComplexityClass::High => "High",
            ComplexityClass::Extreme => "Extreme",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(ComplexityClass::Low),
            "Medium" => Some(ComplexityClass::Medium),
            "High" => Some(ComplexityClass::High),
            "Extreme" => Some(ComplexityClass::Extreme),
            _ => None,
        }
    }
}

/// Nutrition metadata, carried through for display purposes only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Nutrition {
    pub hunger: i32,
    pub saturation: f64,
}

/// A tradable catalog entry (spec §3 "Item").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub display_name: String,
    pub category: Category,
    pub nutrition: Option<Nutrition>,
    pub complexity: ComplexityClass,
    pub base_sell_price: Money,
    pub base_buy_price: Money,
    pub min_price: Money,
    pub max_price: Money,
    pub is_active: bool,
}

impl Item {
    /// Validate the invariants of spec §3: `min <= base_sell <= max`,
    /// `min <= base_buy <= max`, `base_buy <= base_sell`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_price > self.max_price {
            return Err(EngineError::Validation(format!(
                "{}: min_price {} > max_price {}",
                self.item_id, self.min_price, self.max_price
            )));
        }
        if self.base_sell_price < self.min_price || self.base_sell_price > self.max_price {
            return Err(EngineError::Validation(format!(
                "{}: base_sell_price {} outside [{}, {}]",
                self.item_id, self.base_sell_price, self.min_price, self.max_price
            )));
        }
        if self.base_buy_price < self.min_price || self.base_buy_price > self.max_price {
            return Err(EngineError::Validation(format!(
                "{}: base_buy_price {} outside [{}, {}]",
                self.item_id, self.base_buy_price, self.min_price, self.max_price
            )));
        }
        if self.base_buy_price > self.base_sell_price {
            return Err(EngineError::Validation(format!(
                "{}: base_buy_price {} > base_sell_price {} (vendor spread must favor the vendor)",
                self.item_id, self.base_buy_price, self.base_sell_price
            )));
        }
        Ok(())
    }

    /// `ClampPrice(item, p) = max(item.min, min(item.max, p))` (spec §4.2).
    pub fn clamp_price(&self, p: Money) -> Money {
        p.clamp(self.min_price, self.max_price)
    }
}

/// Trade direction. A two-valued tag, not a class hierarchy (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    PlayerBuys,
    PlayerSells,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::PlayerBuys => "PlayerBuys",
            Direction::PlayerSells => "PlayerSells",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PlayerBuys" => Some(Direction::PlayerBuys),
            "PlayerSells" => Some(Direction::PlayerSells),
            _ => None,
        }
    }
}

/// An immutable, append-only transaction row (spec §3 "Transaction").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub player_id: String,
    pub player_name: String,
    pub item_id: String,
    pub direction: Direction,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
    pub demand_pressure_snapshot: Money,
    pub supply_pressure_snapshot: Money,
    pub online_players_snapshot: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// `|total - unit * quantity| <= 0.01` (spec §3 invariant).
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.player_id.is_empty() || self.player_id.len() > 36 {
            return Err(EngineError::Validation(format!(
                "player_id must be 1-36 chars, got {}",
                self.player_id.len()
            )));
        }
        if !(1..=10_000).contains(&self.quantity) {
            return Err(EngineError::InvalidQuantity(self.quantity));
        }
        if self.unit_price <= Money::ZERO {
            return Err(EngineError::Validation(format!(
                "unit_price must be positive, got {}",
                self.unit_price
            )));
        }
        let expected = (self.unit_price * Money::from_i64(self.quantity)).round_money();
        let diff = (self.total - expected).abs();
        if diff > Money::from_f64(0.01) {
            return Err(EngineError::Validation(format!(
                "total {} does not match unit*quantity {} within 0.01",
                self.total, expected
            )));
        }
        Ok(())
    }
}

/// One repricing tick's outcome for a single item (spec §3
/// "PriceHistoryEntry").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub item_id: String,
    pub tick_at: DateTime<Utc>,
    pub previous_price: Money,
    pub new_price: Money,
    pub percent_change: Money,
    pub demand_pressure: Money,
    pub supply_pressure: Money,
    pub net_pressure: Money,
    pub raw_buy_volume: i64,
    pub raw_sell_volume: i64,
    pub weighted_buy_volume: Money,
    pub weighted_sell_volume: Money,
    pub online_players: i64,
    pub player_correction: Money,
}

/// Session-age weight tier (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionTier {
    Instant,
    Short,
    Medium,
    Long,
}

/// A tracked player session (spec §3 "PlayerSession").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSession {
    pub player_id: String,
    pub name: String,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_online: bool,
    pub tier: SessionTier,
}
