//! Query functions for the `shopping_history` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::HistoryEntry;

/// Fetch all items archived on one day.
pub async fn list_for_day(pool: &SqlitePool, day: NaiveDate) -> Result<Vec<HistoryEntry>> {
    let entries = sqlx::query_as::<_, HistoryEntry>(
        "SELECT id, day_date, name, quantity, unit \
         FROM shopping_history \
         WHERE day_date = ? \
         ORDER BY name ASC",
    )
    .bind(day)
    .fetch_all(pool)
    .await
    .context("failed to fetch shopping history")?;

    Ok(entries)
}

/// Archived-item counts per day within an inclusive range, for the history
/// calendar view.
pub async fn counts_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, i64)>> {
    let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
        "SELECT day_date, COUNT(*) \
         FROM shopping_history \
         WHERE day_date BETWEEN ? AND ? \
         GROUP BY day_date \
         ORDER BY day_date ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("failed to count shopping history")?;

    Ok(rows)
}
