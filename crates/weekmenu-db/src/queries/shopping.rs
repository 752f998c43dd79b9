//! Query functions for the `shopping_items` table.
//!
//! The active shopping list is small and exclusively owned by one session,
//! so mutating queries favour simplicity: callers re-fetch the full list
//! after each mutation and treat the store's answer as authoritative.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::ShoppingItem;

/// Fetch the full list in canonical order: open items before checked items,
/// ascending `sort_order` within each partition, name as the tie-break.
pub async fn list_items(pool: &SqlitePool) -> Result<Vec<ShoppingItem>> {
    let items = sqlx::query_as::<_, ShoppingItem>(
        "SELECT id, name, quantity, unit, checked, sort_order, show_quantity \
         FROM shopping_items \
         ORDER BY checked ASC, sort_order ASC, name ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list shopping items")?;

    Ok(items)
}

/// Replace the entire list in one transaction.
///
/// Input ids are ignored; the store assigns fresh ids on insert. Returns the
/// persisted list in canonical order.
pub async fn replace_items(pool: &SqlitePool, items: &[ShoppingItem]) -> Result<Vec<ShoppingItem>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("DELETE FROM shopping_items")
        .execute(&mut *tx)
        .await
        .context("failed to clear shopping items")?;

    for item in items {
        sqlx::query(
            "INSERT INTO shopping_items (name, quantity, unit, checked, sort_order, show_quantity) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.checked)
        .bind(item.sort_order)
        .bind(item.show_quantity)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert shopping item {:?}", item.name))?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    list_items(pool).await
}

/// Set one item's `checked` flag, leaving `sort_order` untouched.
///
/// Returns the number of rows affected (0 means the id no longer exists).
pub async fn set_checked(pool: &SqlitePool, id: i64, checked: bool) -> Result<u64> {
    let result = sqlx::query("UPDATE shopping_items SET checked = ? WHERE id = ?")
        .bind(checked)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update checked flag")?;

    Ok(result.rows_affected())
}

/// Append a new unchecked item at the end of the open partition.
pub async fn insert_item(
    pool: &SqlitePool,
    name: &str,
    quantity: f64,
    unit: &str,
) -> Result<ShoppingItem> {
    let item = sqlx::query_as::<_, ShoppingItem>(
        "INSERT INTO shopping_items (name, quantity, unit, checked, sort_order, show_quantity) \
         VALUES (?, ?, ?, 0, \
             (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM shopping_items WHERE checked = 0), \
             1) \
         RETURNING id, name, quantity, unit, checked, sort_order, show_quantity",
    )
    .bind(name)
    .bind(quantity)
    .bind(unit)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert shopping item {name:?}"))?;

    Ok(item)
}

/// Delete one item. Remaining items are not renumbered; ordering only
/// depends on relative `sort_order`, so gaps are fine.
///
/// Returns the number of rows affected.
pub async fn delete_item(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM shopping_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete shopping item")?;

    Ok(result.rows_affected())
}

/// Apply a full reordering: `ordered_ids` lists every item id in the desired
/// display order (open items first, then checked items).
///
/// Each item's `sort_order` becomes its position within its own partition.
/// Ids that no longer exist are skipped; items missing from `ordered_ids`
/// keep their current `sort_order`.
pub async fn reorder_items(pool: &SqlitePool, ordered_ids: &[i64]) -> Result<Vec<ShoppingItem>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let rows: Vec<(i64, bool)> = sqlx::query_as("SELECT id, checked FROM shopping_items")
        .fetch_all(&mut *tx)
        .await
        .context("failed to fetch item partitions")?;
    let partition: HashMap<i64, bool> = rows.into_iter().collect();

    let mut open_pos: i64 = 0;
    let mut done_pos: i64 = 0;
    for id in ordered_ids {
        let Some(&checked) = partition.get(id) else {
            continue;
        };
        let pos = if checked {
            let p = done_pos;
            done_pos += 1;
            p
        } else {
            let p = open_pos;
            open_pos += 1;
            p
        };
        sqlx::query("UPDATE shopping_items SET sort_order = ? WHERE id = ?")
            .bind(pos)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to reorder shopping item {id}"))?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    list_items(pool).await
}

/// Archive every checked item against `day` and remove it from the active
/// list, all in one transaction.
///
/// Returns the number of archived items (0 when nothing was checked, which
/// is a valid no-op).
pub async fn archive_checked(pool: &SqlitePool, day: NaiveDate) -> Result<u64> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let inserted = sqlx::query(
        "INSERT INTO shopping_history (day_date, name, quantity, unit) \
         SELECT ?, name, quantity, unit FROM shopping_items WHERE checked = 1",
    )
    .bind(day)
    .execute(&mut *tx)
    .await
    .context("failed to archive checked items")?;

    sqlx::query("DELETE FROM shopping_items WHERE checked = 1")
        .execute(&mut *tx)
        .await
        .context("failed to remove archived items")?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(inserted.rows_affected())
}

/// Delete every item unconditionally. Returns the number of rows removed.
pub async fn clear_items(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM shopping_items")
        .execute(pool)
        .await
        .context("failed to clear shopping list")?;

    Ok(result.rows_affected())
}
