//! Meal planning: recipes, household preferences and the plan engine.
//!
//! Recipes live in a JSON file; the engine in [`engine`] scores them
//! against the household profile and fills the cook days of a week.

pub mod engine;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shopping::RawItem;

pub use engine::{generate_plan, select_best_recipe};

/// Per-portion nutrition facts, as written in the recipe file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub calories: f64,
}

/// How often a recipe may appear in one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationLimit {
    #[serde(rename = "2_per_week")]
    TwoPerWeek,
    #[serde(rename = "1_per_week")]
    OnePerWeek,
    #[serde(rename = "1_per_month")]
    OnePerMonth,
}

/// One recipe from the recipe file. Ingredient quantities are written for
/// the configured base serving count and scaled at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<RawItem>,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub rotation_limit: Option<RotationLimit>,
}

impl Recipe {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_fish(&self) -> bool {
        self.has_tag("fish")
    }

    /// Pasta by tag or by name; "Spaghetti bolognese" counts even without
    /// the tag.
    pub fn is_pasta_like(&self) -> bool {
        if self.has_tag("pasta") {
            return true;
        }
        let name = self.name.to_lowercase();
        name.contains("pasta") || name.contains("spaghetti")
    }

    /// Externally sourced recipes carry an `ext_` id prefix.
    pub fn is_external(&self) -> bool {
        self.id.starts_with("ext_")
    }

    /// User-authored recipes carry a `custom_` id prefix.
    pub fn is_custom(&self) -> bool {
        self.id.starts_with("custom_")
    }
}

/// The full recipe collection, loaded once and shared.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Load the recipe file (a JSON array of recipes).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe file {}", path.display()))?;
        let recipes: Vec<Recipe> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse recipe file {}", path.display()))?;
        Ok(Self { recipes })
    }

    pub fn by_id(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// What the household likes, dislikes and must avoid. Tags match recipe
/// tags; allergies match recipe allergens case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyPrefs {
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Standing nutrition weights, applied to every plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionTargets {
    #[serde(default = "default_weight")]
    pub high_protein_weight: f64,
    #[serde(default = "default_weight")]
    pub low_carb_weight: f64,
    #[serde(default)]
    pub weekly_min_fish: u32,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            high_protein_weight: 1.0,
            low_carb_weight: 1.0,
            weekly_min_fish: 0,
        }
    }
}

/// The household profile the engine scores against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub family: FamilyPrefs,
    #[serde(default)]
    pub nutrition: NutritionTargets,
}

/// One-off knobs for a single plan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanOptions {
    #[serde(default)]
    pub prefer_fish: bool,
    #[serde(default)]
    pub high_protein: bool,
    #[serde(default)]
    pub low_carb: bool,
    /// Overrides the profile's `weekly_min_fish` when set.
    #[serde(default)]
    pub min_fish: Option<u32>,
}

/// One planned cook day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub date: NaiveDate,
    pub meal_id: String,
    pub meal_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_limit_uses_the_wire_names() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"id": "r1", "name": "Zalm", "rotation_limit": "1_per_week"}"#,
        )
        .unwrap();
        assert_eq!(recipe.rotation_limit, Some(RotationLimit::OnePerWeek));
        assert!(recipe.tags.is_empty());
        assert_eq!(recipe.nutrition, Nutrition::default());
    }

    #[test]
    fn pasta_is_detected_by_tag_or_name() {
        let by_tag: Recipe =
            serde_json::from_str(r#"{"id": "r1", "name": "Lasagne", "tags": ["pasta"]}"#).unwrap();
        let by_name: Recipe =
            serde_json::from_str(r#"{"id": "r2", "name": "Spaghetti bolognese"}"#).unwrap();
        let neither: Recipe = serde_json::from_str(r#"{"id": "r3", "name": "Stamppot"}"#).unwrap();

        assert!(by_tag.is_pasta_like());
        assert!(by_name.is_pasta_like());
        assert!(!neither.is_pasta_like());
    }
}
