//! The shopping list engine.
//!
//! A list lives in exactly one [`ShoppingSession`] at a time. Pure list
//! operations live in [`key`], [`reconcile`] and [`list`]; everything that
//! talks to the store goes through [`service`], whose responses replace the
//! session's list wholesale.

pub mod key;
pub mod list;
pub mod reconcile;
pub mod service;

use thiserror::Error;

use weekmenu_db::models::ShoppingItem;

pub use key::{BaseKey, base_key};
pub use reconcile::{RawItem, reconcile};

/// Errors from shopping list operations. All of these are recoverable by
/// the caller; none should end the session.
#[derive(Debug, Error)]
pub enum ListError {
    /// Rejected input, e.g. an empty item name on add.
    #[error("invalid shopping item: {0}")]
    Validation(String),

    /// A move whose target lies in the opposite checked/unchecked
    /// partition. Checked state must change via a toggle first.
    #[error("cannot move item {moved} relative to {target}: items are in different partitions")]
    InvalidMove { moved: i64, target: i64 },

    /// A mutation referenced an id that is no longer on the list. Callers
    /// treat this as a no-op after refreshing from the store.
    #[error("shopping item {0} not found")]
    NotFound(i64),

    /// The store round trip failed. The local list is left unchanged.
    #[error("shopping list sync failed: {0:#}")]
    Sync(#[from] anyhow::Error),
}

/// Session-scoped shopping list state.
///
/// Holds the current list and a monotonic counter for placeholder ids of
/// items that have not been persisted yet. Placeholders are negative so
/// they can never collide with store-assigned row ids; every successful
/// sync replaces them with the store's ids.
#[derive(Debug, Default)]
pub struct ShoppingSession {
    pub items: Vec<ShoppingItem>,
    next_placeholder: i64,
}

impl ShoppingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next placeholder id: -1, -2, ...
    pub fn next_placeholder_id(&mut self) -> i64 {
        self.next_placeholder -= 1;
        self.next_placeholder
    }
}
