//! Query functions for the `day_plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::DayPlan;

/// Upsert the cook flag for a day. Days default to cooking, so a row only
/// exists once the user has touched the day.
pub async fn set_day_cook(pool: &SqlitePool, day: NaiveDate, cook: bool) -> Result<()> {
    sqlx::query(
        "INSERT INTO day_plans (day_date, cook) VALUES (?, ?) \
         ON CONFLICT(day_date) DO UPDATE SET \
             cook = excluded.cook, \
             updated_at = CURRENT_TIMESTAMP",
    )
    .bind(day)
    .bind(cook)
    .execute(pool)
    .await
    .context("failed to set day cook flag")?;

    Ok(())
}

/// Upsert the planned meal for a day. Assigning a meal implies the
/// household cooks that day.
pub async fn set_day_meal(pool: &SqlitePool, day: NaiveDate, meal_id: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO day_plans (day_date, cook, meal_id) VALUES (?, 1, ?) \
         ON CONFLICT(day_date) DO UPDATE SET \
             meal_id = excluded.meal_id, \
             cook = 1, \
             updated_at = CURRENT_TIMESTAMP",
    )
    .bind(day)
    .bind(meal_id)
    .execute(pool)
    .await
    .context("failed to set day meal")?;

    Ok(())
}

/// Fetch a single day, if the user has touched it.
pub async fn get_day(pool: &SqlitePool, day: NaiveDate) -> Result<Option<DayPlan>> {
    let plan = sqlx::query_as::<_, DayPlan>(
        "SELECT day_date, cook, meal_id FROM day_plans WHERE day_date = ?",
    )
    .bind(day)
    .fetch_optional(pool)
    .await
    .context("failed to fetch day plan")?;

    Ok(plan)
}

/// Fetch all touched days in an inclusive date range, ascending.
pub async fn get_days_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayPlan>> {
    let plans = sqlx::query_as::<_, DayPlan>(
        "SELECT day_date, cook, meal_id \
         FROM day_plans \
         WHERE day_date BETWEEN ? AND ? \
         ORDER BY day_date ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("failed to fetch day plans")?;

    Ok(plans)
}
