//! The sync gateway between a [`ShoppingSession`] and the store.
//!
//! Every mutation follows the same shape: validate locally, send the
//! mutation, then adopt the store's full list response wholesale. The store
//! is authoritative; local state is never patched incrementally. When two
//! sessions race, the last response wins and earlier edits may be
//! overwritten silently.
//!
//! A mutation that references an id the store no longer has is treated as
//! a no-op: the session refreshes from the store and the call returns `Ok`.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use weekmenu_db::queries::shopping;

use crate::generate::{ListGenerator, PlanContext};

use super::{ListError, ShoppingSession, list, reconcile};

/// Refresh the session's list from the store.
pub async fn load(pool: &SqlitePool, session: &mut ShoppingSession) -> Result<(), ListError> {
    session.items = shopping::list_items(pool).await?;
    Ok(())
}

/// Regenerate the list from a generator and persist the merged result.
///
/// The incoming batch is reconciled against the current list so checked
/// flags survive, then replaces the stored list wholesale. On any failure
/// the session's list is left as it was.
pub async fn generate(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    generator: &dyn ListGenerator,
    ctx: &PlanContext,
) -> Result<(), ListError> {
    let batch = generator.generate(ctx).await?;
    debug!(items = batch.len(), "generated raw shopping batch");

    let merged = reconcile(session, &batch);
    session.items = shopping::replace_items(pool, &merged).await?;
    Ok(())
}

/// Set one item's checked flag and adopt the store's response.
pub async fn toggle(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    id: i64,
    checked: bool,
) -> Result<(), ListError> {
    let affected = shopping::set_checked(pool, id, checked).await?;
    if affected == 0 {
        warn!(id, "toggle hit a missing item, refreshing");
    }
    load(pool, session).await
}

/// Add a single item at the end of the open partition.
///
/// Validation and quantity coercion happen locally before the store is
/// touched; a rejected name never produces a round trip.
pub async fn add(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    name: &str,
    quantity: f64,
    unit: &str,
) -> Result<(), ListError> {
    // Dry-run the append locally so Validation errors surface before any
    // round trip, and so quantity coercion matches the offline rules.
    let mut scratch = session.items.clone();
    let placeholder = session.next_placeholder_id();
    list::append_item(&mut scratch, placeholder, name, quantity, unit)?;
    let added = scratch.last().expect("append just pushed an item");

    shopping::insert_item(pool, &added.name, added.quantity, &added.unit).await?;
    load(pool, session).await
}

/// Remove one item from the list.
pub async fn delete(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    id: i64,
) -> Result<(), ListError> {
    let affected = shopping::delete_item(pool, id).await?;
    if affected == 0 {
        warn!(id, "delete hit a missing item, refreshing");
    }
    load(pool, session).await
}

/// Move an item before or after a target within the same partition.
///
/// The move is applied to a local copy first: an invalid move (crossing
/// the checked boundary) is rejected without touching the store, so the
/// stored order stays exactly as it was.
pub async fn move_to(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    moved_id: i64,
    target_id: i64,
    insert_after: bool,
) -> Result<(), ListError> {
    let mut scratch = session.items.clone();
    match list::move_item(&mut scratch, moved_id, target_id, insert_after) {
        Ok(()) => {}
        Err(ListError::NotFound(id)) => {
            warn!(id, "move referenced a missing item, refreshing");
            return load(pool, session).await;
        }
        Err(err) => return Err(err),
    }

    let ordered_ids: Vec<i64> = list::sorted_view(&scratch).map(|i| i.id).collect();
    session.items = shopping::reorder_items(pool, &ordered_ids).await?;
    Ok(())
}

/// Archive every checked item to the shopping history under `day` and drop
/// them from the active list. Returns the number of archived items; 0 when
/// nothing was checked.
pub async fn complete(
    pool: &SqlitePool,
    session: &mut ShoppingSession,
    day: NaiveDate,
) -> Result<u64, ListError> {
    let archived = shopping::archive_checked(pool, day).await?;
    debug!(archived, %day, "completed shopping list");
    load(pool, session).await?;
    Ok(archived)
}

/// Wipe the entire list, checked or not. Nothing is archived.
pub async fn clear(pool: &SqlitePool, session: &mut ShoppingSession) -> Result<u64, ListError> {
    let removed = shopping::clear_items(pool).await?;
    load(pool, session).await?;
    Ok(removed)
}
