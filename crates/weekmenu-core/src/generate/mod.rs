//! The `ListGenerator` trait -- the seam between meal planning and the
//! shopping list.
//!
//! The shopping engine does not care where raw items come from; anything
//! that can turn a date range into a batch of [`RawItem`]s can drive a
//! regeneration. The trait is intentionally object-safe so the sync
//! gateway can take `&dyn ListGenerator`.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::warn;

use weekmenu_db::queries::day_plans;

use crate::plan::RecipeBook;
use crate::shopping::RawItem;

/// The date range and household size a batch is generated for.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// First day of the range, inclusive.
    pub start: NaiveDate,
    /// Last day of the range, inclusive.
    pub end: NaiveDate,
    /// Number of people ingredient quantities are scaled to.
    pub person_count: u32,
}

/// A source of raw shopping list entries for a date range.
#[async_trait]
pub trait ListGenerator: Send + Sync {
    /// Produce the raw batch for `ctx`. Order matters: the batch order
    /// becomes the list's initial ordering.
    async fn generate(&self, ctx: &PlanContext) -> Result<Vec<RawItem>>;
}

// Compile-time assertion: ListGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ListGenerator) {}
};

/// The production generator: collects the ingredients of every planned
/// meal on a cook day in the range, scales them to the household size and
/// aggregates equal name/unit pairs.
pub struct PlanIngredients {
    pool: SqlitePool,
    recipes: RecipeBook,
    /// The serving count the recipe quantities are written for.
    base_servings: u32,
}

impl PlanIngredients {
    pub fn new(pool: SqlitePool, recipes: RecipeBook, base_servings: u32) -> Self {
        Self {
            pool,
            recipes,
            base_servings: base_servings.max(1),
        }
    }
}

#[async_trait]
impl ListGenerator for PlanIngredients {
    async fn generate(&self, ctx: &PlanContext) -> Result<Vec<RawItem>> {
        let days = day_plans::get_days_between(&self.pool, ctx.start, ctx.end).await?;
        let scale = f64::from(ctx.person_count) / f64::from(self.base_servings);

        // Aggregate on the normalized key, keep the first-seen display
        // name, and let the BTreeMap hand the batch back name-sorted.
        let mut totals: BTreeMap<String, RawItem> = BTreeMap::new();
        for day in days {
            if !day.cook {
                continue;
            }
            let Some(meal_id) = &day.meal_id else {
                continue;
            };
            let Some(recipe) = self.recipes.by_id(meal_id) else {
                warn!(%day.day_date, meal_id, "planned meal has no known recipe, skipping");
                continue;
            };

            for ingredient in &recipe.ingredients {
                let key = crate::shopping::base_key(&ingredient.name, &ingredient.unit);
                totals
                    .entry(key.as_str().to_owned())
                    .and_modify(|item| item.quantity += ingredient.quantity * scale)
                    .or_insert_with(|| {
                        RawItem::new(
                            ingredient.name.trim(),
                            ingredient.quantity * scale,
                            ingredient.unit.trim(),
                        )
                    });
            }
        }

        Ok(totals.into_values().collect())
    }
}
