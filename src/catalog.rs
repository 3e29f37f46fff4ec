//! C2: the item catalog. Read-mostly, copy-on-write at the storage layer —
//! this module is a thin lookup/validation facade over [`crate::store::Store`].

use crate::error::{EngineError, EngineResult};
use crate::model::{Category, Item};
use crate::store::Store;
use std::sync::Arc;

pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Full item row, regardless of `is_active` — price-history lookups may
    /// still resolve a deactivated item (spec §4.2).
    pub fn get(&self, item_id: &str) -> EngineResult<Item> {
        self.store
            .get_item(item_id)?
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))
    }

    /// Same lookup but rejects an inactive item — the shape the transaction
    /// executor needs (spec §4.2: "invisible to the transaction executor").
    pub fn get_tradable(&self, item_id: &str) -> EngineResult<Item> {
        let item = self.get(item_id)?;
        if !item.is_active {
            return Err(EngineError::ItemInactive(item_id.to_string()));
        }
        Ok(item)
    }

    pub fn list(&self, category: Option<Category>) -> EngineResult<Vec<Item>> {
        self.store.list_items(category)
    }

    pub fn list_active(&self) -> EngineResult<Vec<Item>> {
        self.store.list_active_items()
    }

    pub fn upsert(&self, item: &Item) -> EngineResult<()> {
        self.store.upsert_item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComplexityClass;
    use crate::money::Money;
    use crate::store::SqliteStore;

    fn item(id: &str, active: bool) -> Item {
        Item {
            item_id: id.to_string(),
            display_name: "Wheat".to_string(),
            category: Category::Crops,
            nutrition: None,
            complexity: ComplexityClass::Low,
            base_sell_price: Money::from_f64(2.0),
            base_buy_price: Money::from_f64(1.8),
            min_price: Money::from_f64(1.0),
            max_price: Money::from_f64(6.0),
            is_active: active,
        }
    }

    #[test]
    fn unknown_item_is_an_error() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let catalog = Catalog::new(store);
        assert!(matches!(catalog.get("ghost"), Err(EngineError::UnknownItem(_))));
    }

    #[test]
    fn inactive_item_visible_to_get_but_not_get_tradable() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let catalog = Catalog::new(store);
        catalog.upsert(&item("wheat", false)).unwrap();
        assert!(catalog.get("wheat").is_ok());
        assert!(matches!(catalog.get_tradable("wheat"), Err(EngineError::ItemInactive(_))));
    }

    #[test]
    fn clamp_price_projects_into_bounds() {
        let i = item("wheat", true);
        assert_eq!(i.clamp_price(Money::from_f64(100.0)), Money::from_f64(6.0));
        assert_eq!(i.clamp_price(Money::from_f64(0.0)), Money::from_f64(1.0));
    }
}
