use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry on the active shopping list.
///
/// `id` is store-assigned (AUTOINCREMENT). In-memory sessions use negative
/// placeholder ids for items that have not been persisted yet; those never
/// survive a sync, since every mutation adopts the store's returned rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub checked: bool,
    /// Position among items with the same `checked` value. The canonical
    /// ordering is `(checked, sort_order, name)`; gaps are harmless.
    pub sort_order: i64,
    pub show_quantity: bool,
}

/// One calendar day: whether the household cooks and which meal is planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DayPlan {
    pub day_date: NaiveDate,
    pub cook: bool,
    pub meal_id: Option<String>,
}

/// A shopping item archived by completing the list, recorded against the
/// calendar day the list was completed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub day_date: NaiveDate,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}
