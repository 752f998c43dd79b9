//! Reconciliation of a freshly generated item batch against the previous
//! list.
//!
//! Regenerating a plan produces a new raw batch; the user may have checked
//! off or reordered items in the meantime. Reconciliation keeps the checked
//! flags of matching items (by [`BaseKey`]) while taking quantities and
//! ordering from the incoming batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use weekmenu_db::models::ShoppingItem;

use super::key::{BaseKey, base_key};
use super::ShoppingSession;

/// An item as produced by a generator: no identity, no user state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl RawItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

/// Merge an incoming raw batch with the session's current list.
///
/// Every output item is fresh: a new placeholder id and a `sort_order`
/// equal to its position in the incoming batch. A full regeneration thus
/// resets ordering to the generator's natural order. Only `checked`
/// survives, inherited from the first previous item with the same
/// [`BaseKey`]; each key matches at most once, so a duplicated key in the
/// batch yields one inherited flag and the rest start unchecked. Previous
/// items absent from the batch are dropped.
///
/// The result is not installed in the session; callers persist it and
/// adopt the store's response.
pub fn reconcile(session: &mut ShoppingSession, incoming: &[RawItem]) -> Vec<ShoppingItem> {
    // First previous item per key wins; consumed on match.
    let mut previous: HashMap<BaseKey, &ShoppingItem> = HashMap::new();
    for item in &session.items {
        previous
            .entry(base_key(&item.name, &item.unit))
            .or_insert(item);
    }

    let mut merged = Vec::with_capacity(incoming.len());
    for (position, raw) in incoming.iter().enumerate() {
        let checked = previous
            .remove(&base_key(&raw.name, &raw.unit))
            .map(|prev| prev.checked)
            .unwrap_or(false);

        merged.push(ShoppingItem {
            id: 0, // placeholder, assigned below
            name: raw.name.trim().to_owned(),
            quantity: raw.quantity.max(0.0),
            unit: raw.unit.trim().to_owned(),
            checked,
            sort_order: position as i64,
            show_quantity: true,
        });
    }

    // Placeholder ids are allocated after matching so the borrow of
    // `session.items` above has ended.
    for item in &mut merged {
        item.id = session.next_placeholder_id();
    }

    merged
}
