//! The plan engine: scores recipes against the household profile and
//! fills the cook days of a date range.
//!
//! Selection is greedy per day with a small random jitter, so two runs
//! over the same week differ slightly. Hard constraints (allergies,
//! rotation caps, no back-to-back fish or pasta) are filters; everything
//! else is a soft score adjustment.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;

use super::{PlanOptions, PlannedMeal, Profile, Recipe, RotationLimit};

/// Base score of a recipe for this household, before any per-day
/// adjustments.
fn recipe_score(recipe: &Recipe, profile: &Profile, options: &PlanOptions) -> f64 {
    let family = &profile.family;
    let mut score = 0.0;

    for tag in &recipe.tags {
        if family.likes.contains(tag) {
            // A liked fish tag barely counts unless fish is asked for,
            // otherwise fish lovers get fish every single day.
            if tag == "fish" && !options.prefer_fish {
                score += 0.2;
            } else {
                score += 2.0;
            }
        }
        if family.dislikes.contains(tag) {
            score -= 2.0;
        }
        if tag == "favorite" {
            score += 1.25;
        }
    }

    let protein = recipe.nutrition.protein;
    let carbs = recipe.nutrition.carbs;

    let mut protein_weight = profile.nutrition.high_protein_weight;
    let mut carb_weight = profile.nutrition.low_carb_weight;
    if options.high_protein {
        protein_weight += 0.4;
    }
    if options.low_carb {
        carb_weight += 0.2;
    }

    score += (protein / 10.0) * protein_weight;

    // Keep carbs in balance instead of hard-avoiding them: occasional
    // pasta/rice/potatoes are fine.
    score -= ((carbs - 18.0).max(0.0) / 16.0) * carb_weight;
    if (20.0..=48.0).contains(&carbs) {
        score += 0.55;
    } else if carbs > 55.0 {
        score -= 0.25;
    }

    if options.prefer_fish && recipe.is_fish() {
        score += 1.5;
    }

    // Externally sourced meals get a small boost so they actually appear
    // in rotation.
    if recipe.is_external() {
        score += 0.95;
    }

    score
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

/// How many times this recipe may appear in a plan of `day_count` days.
fn max_occurrences(recipe: &Recipe, day_count: usize) -> usize {
    match recipe.rotation_limit {
        None => {
            // Diversity guardrails for recipes without explicit rotation
            // settings; external meals rotate aggressively.
            if recipe.is_external() {
                ((day_count + 6) / 7).max(1)
            } else {
                ((day_count + 3) / 4).max(2)
            }
        }
        Some(RotationLimit::TwoPerWeek) => ((day_count * 2 + 6) / 7).max(1),
        Some(RotationLimit::OnePerWeek) => ((day_count + 6) / 7).max(1),
        Some(RotationLimit::OnePerMonth) => ((day_count + 29) / 30).max(1),
    }
}

/// No fish after fish, no pasta after pasta.
fn blocked_by_neighbors(
    recipe: &Recipe,
    prev_recipe: Option<&Recipe>,
    next_recipe: Option<&Recipe>,
) -> bool {
    if recipe.is_fish()
        && (prev_recipe.is_some_and(Recipe::is_fish) || next_recipe.is_some_and(Recipe::is_fish))
    {
        return true;
    }
    if recipe.is_pasta_like()
        && (prev_recipe.is_some_and(Recipe::is_pasta_like)
            || next_recipe.is_some_and(Recipe::is_pasta_like))
    {
        return true;
    }
    false
}

/// Allergy check: a single overlapping allergen disqualifies the recipe.
fn is_allowed(recipe: &Recipe, allergies: &[String]) -> bool {
    !recipe.allergens.iter().any(|allergen| {
        allergies
            .iter()
            .any(|allergy| allergy.eq_ignore_ascii_case(allergen))
    })
}

/// Fill the given cook days with meals.
///
/// A day may stay unplanned when every candidate is blocked; the caller
/// sees that as a gap in the returned plan, not an error.
pub fn generate_plan(
    cook_days: &[NaiveDate],
    recipes: &[Recipe],
    profile: &Profile,
    options: &PlanOptions,
    rng: &mut impl Rng,
) -> Vec<PlannedMeal> {
    let allowed: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| is_allowed(r, &profile.family.allergies))
        .collect();
    if allowed.is_empty() {
        return Vec::new();
    }

    let mut ranked = allowed.clone();
    ranked.sort_by(|a, b| {
        recipe_score(b, profile, options).total_cmp(&recipe_score(a, profile, options))
    });
    let custom_pool: Vec<&Recipe> = ranked.iter().copied().filter(|r| r.is_custom()).collect();

    let min_fish = options
        .min_fish
        .unwrap_or(profile.nutrition.weekly_min_fish) as usize;

    let mut plan: Vec<PlannedMeal> = Vec::new();
    let mut used: HashMap<&str, usize> = HashMap::new();
    let mut fish_count = 0usize;

    for (day_idx, &day) in cook_days.iter().enumerate() {
        let mut best: Option<&Recipe> = None;
        let mut best_score = f64::NEG_INFINITY;
        let prev_recipe = plan
            .last()
            .and_then(|entry| allowed.iter().copied().find(|r| r.id == entry.meal_id));
        let remaining_days = cook_days.len() - day_idx;

        // Occasionally inject a custom meal to diversify the week.
        if !custom_pool.is_empty() && rng.random_bool(0.35) {
            for recipe in &custom_pool {
                if used.get(recipe.id.as_str()).copied().unwrap_or(0)
                    >= max_occurrences(recipe, cook_days.len())
                {
                    continue;
                }
                if blocked_by_neighbors(recipe, prev_recipe, None) {
                    continue;
                }
                let repeat_penalty =
                    used.get(recipe.id.as_str()).copied().unwrap_or(0) as f64 * 2.6;
                let mut score = recipe_score(recipe, profile, options) - repeat_penalty
                    + rng.random_range(-0.3..1.0);
                if recipe.has_tag("heavy") {
                    score += if is_weekend(day) { 0.9 } else { -0.45 };
                }
                if score > best_score {
                    best = Some(recipe);
                    best_score = score;
                }
            }
        }

        for recipe in &ranked {
            let occurrences = used.get(recipe.id.as_str()).copied().unwrap_or(0);
            if occurrences >= max_occurrences(recipe, cook_days.len()) {
                continue;
            }
            if blocked_by_neighbors(recipe, prev_recipe, None) {
                continue;
            }

            let repeat_penalty = occurrences as f64 * 2.6;
            let mut score = recipe_score(recipe, profile, options) - repeat_penalty
                + rng.random_range(-0.6..0.6);

            if recipe.has_tag("heavy") {
                score += if is_weekend(day) { 0.9 } else { -0.45 };
            }

            // Soft steering towards the weekly fish minimum: nudge fish in
            // while under it, back off once it is met, and push hard when
            // the remaining days barely cover the shortfall.
            if recipe.is_fish() && min_fish > 0 {
                if fish_count < min_fish {
                    score += 0.8;
                } else {
                    score -= 0.35;
                }
                let fish_missing = min_fish.saturating_sub(fish_count);
                if fish_missing > 0 && remaining_days <= fish_missing + 1 {
                    score += 1.1;
                }
            }

            if score > best_score {
                best = Some(recipe);
                best_score = score;
            }
        }

        let Some(best) = best else {
            continue;
        };
        plan.push(PlannedMeal {
            date: day,
            meal_id: best.id.clone(),
            meal_name: best.name.clone(),
        });
        *used.entry(best.id.as_str()).or_insert(0) += 1;
        if best.is_fish() {
            fish_count += 1;
        }
    }

    plan.sort_by_key(|entry| entry.date);
    plan
}

/// Pick the single best replacement meal for one day.
///
/// Used by the per-day retry: the day's current meal goes into
/// `excluded_ids`, its calendar neighbors into `prev_recipe`/`next_recipe`.
/// Deterministic; no jitter.
pub fn select_best_recipe<'a>(
    recipes: &'a [Recipe],
    profile: &Profile,
    options: &PlanOptions,
    day: Option<NaiveDate>,
    prev_recipe: Option<&Recipe>,
    next_recipe: Option<&Recipe>,
    excluded_ids: &[String],
) -> Option<&'a Recipe> {
    let mut candidates: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| !excluded_ids.contains(&r.id))
        .filter(|r| is_allowed(r, &profile.family.allergies))
        .filter(|r| !blocked_by_neighbors(r, prev_recipe, next_recipe))
        .collect();

    let score = |recipe: &Recipe| {
        let mut value = recipe_score(recipe, profile, options);
        if recipe.has_tag("heavy") {
            value += match day {
                Some(day) if is_weekend(day) => 0.7,
                _ => -0.35,
            };
        }
        value
    };

    candidates.sort_by(|a, b| score(b).total_cmp(&score(a)));
    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::plan::{FamilyPrefs, Nutrition, NutritionTargets};

    fn recipe(id: &str, name: &str, tags: &[&str]) -> Recipe {
        Recipe {
            id: id.to_owned(),
            name: name.to_owned(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            allergens: Vec::new(),
            ingredients: Vec::new(),
            nutrition: Nutrition::default(),
            rotation_limit: None,
        }
    }

    fn profile() -> Profile {
        Profile {
            family: FamilyPrefs::default(),
            nutrition: NutritionTargets::default(),
        }
    }

    fn week_of_days(count: usize) -> Vec<NaiveDate> {
        // Monday 2025-03-03 onwards.
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        (0..count)
            .map(|i| start + chrono::Days::new(i as u64))
            .collect()
    }

    #[test]
    fn liked_tags_raise_and_disliked_tags_lower_the_score() {
        let mut profile = profile();
        profile.family.likes = vec!["comfort".to_owned()];
        profile.family.dislikes = vec!["spicy".to_owned()];
        let options = PlanOptions::default();

        let liked = recipe("r1", "Stamppot", &["comfort"]);
        let disliked = recipe("r2", "Curry", &["spicy"]);
        let neutral = recipe("r3", "Soep", &[]);

        assert!(recipe_score(&liked, &profile, &options) > recipe_score(&neutral, &profile, &options));
        assert!(recipe_score(&disliked, &profile, &options) < recipe_score(&neutral, &profile, &options));
    }

    #[test]
    fn liked_fish_barely_counts_without_the_fish_option() {
        let mut profile = profile();
        profile.family.likes = vec!["fish".to_owned()];
        let fish = recipe("r1", "Zalm", &["fish"]);

        let plain = recipe_score(&fish, &profile, &PlanOptions::default());
        let preferred = recipe_score(
            &fish,
            &profile,
            &PlanOptions {
                prefer_fish: true,
                ..PlanOptions::default()
            },
        );

        // 0.2 for the muted like vs 2.0 + 1.5 with prefer_fish set.
        assert!(preferred > plain + 3.0);
    }

    #[test]
    fn moderate_carbs_beat_heavy_carbs() {
        let profile = profile();
        let options = PlanOptions::default();
        let mut balanced = recipe("r1", "Rijstschotel", &[]);
        balanced.nutrition.carbs = 35.0;
        let mut loaded = recipe("r2", "Friet", &[]);
        loaded.nutrition.carbs = 70.0;

        assert!(
            recipe_score(&balanced, &profile, &options)
                > recipe_score(&loaded, &profile, &options)
        );
    }

    #[test]
    fn allergies_exclude_recipes_entirely() {
        let mut profile = profile();
        profile.family.allergies = vec!["Peanut".to_owned()];
        let mut satay = recipe("r1", "Saté", &[]);
        satay.allergens = vec!["peanut".to_owned()];

        let plan = generate_plan(
            &week_of_days(3),
            &[satay],
            &profile,
            &PlanOptions::default(),
            &mut StdRng::seed_from_u64(7),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn rotation_limit_caps_repeats() {
        let mut weekly = recipe("r1", "Zuurkool", &[]);
        weekly.rotation_limit = Some(RotationLimit::OnePerWeek);

        let plan = generate_plan(
            &week_of_days(7),
            &[weekly],
            &profile(),
            &PlanOptions::default(),
            &mut StdRng::seed_from_u64(7),
        );
        assert_eq!(plan.len(), 1, "one appearance per seven days");
    }

    #[test]
    fn default_rotation_allows_two_repeats_per_week() {
        let plain = recipe("r1", "Soep", &[]);

        let plan = generate_plan(
            &week_of_days(7),
            &[plain],
            &profile(),
            &PlanOptions::default(),
            &mut StdRng::seed_from_u64(7),
        );
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn no_back_to_back_fish() {
        let recipes = vec![
            recipe("r1", "Zalm", &["fish"]),
            recipe("r2", "Kabeljauw", &["fish"]),
            recipe("r3", "Kip", &[]),
        ];

        let plan = generate_plan(
            &week_of_days(7),
            &recipes,
            &profile(),
            &PlanOptions {
                prefer_fish: true,
                ..PlanOptions::default()
            },
            &mut StdRng::seed_from_u64(42),
        );

        for pair in plan.windows(2) {
            let both_fish = pair.iter().all(|entry| {
                recipes
                    .iter()
                    .find(|r| r.id == entry.meal_id)
                    .is_some_and(Recipe::is_fish)
            });
            assert!(!both_fish, "fish planned on consecutive entries");
        }
    }

    #[test]
    fn plan_is_sorted_by_date() {
        let recipes = vec![recipe("r1", "Soep", &[]), recipe("r2", "Kip", &[])];
        let mut days = week_of_days(4);
        days.reverse();

        let plan = generate_plan(
            &days,
            &recipes,
            &profile(),
            &PlanOptions::default(),
            &mut StdRng::seed_from_u64(3),
        );

        for pair in plan.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn select_best_prefers_heavy_meals_on_weekends() {
        let heavy = recipe("r1", "Stoofpot", &["heavy"]);
        let light = recipe("r2", "Salade", &[]);
        let recipes = vec![heavy, light];
        let profile = profile();
        let options = PlanOptions::default();

        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();

        let weekend_pick =
            select_best_recipe(&recipes, &profile, &options, Some(saturday), None, None, &[])
                .unwrap();
        let midweek_pick =
            select_best_recipe(&recipes, &profile, &options, Some(wednesday), None, None, &[])
                .unwrap();

        assert_eq!(weekend_pick.id, "r1");
        assert_eq!(midweek_pick.id, "r2");
    }

    #[test]
    fn select_best_honours_exclusions_and_neighbors() {
        let fish = recipe("r1", "Zalm", &["fish"]);
        let other_fish = recipe("r2", "Tonijn", &["fish"]);
        let chicken = recipe("r3", "Kip", &[]);
        let recipes = vec![fish.clone(), other_fish, chicken];
        let profile = profile();
        let options = PlanOptions {
            prefer_fish: true,
            ..PlanOptions::default()
        };

        // Retrying a fish day next to another fish day: every fish recipe
        // is blocked, only the chicken remains.
        let pick = select_best_recipe(
            &recipes,
            &profile,
            &options,
            None,
            Some(&fish),
            None,
            &["r1".to_owned()],
        )
        .unwrap();
        assert_eq!(pick.id, "r3");

        let none = select_best_recipe(
            &recipes,
            &profile,
            &options,
            None,
            None,
            None,
            &["r1".to_owned(), "r2".to_owned(), "r3".to_owned()],
        );
        assert!(none.is_none());
    }
}
