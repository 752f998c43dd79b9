use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;

use weekmenu_core::plan::{self, PlanOptions, RecipeBook};
use weekmenu_db::queries::day_plans;

use crate::PlanCommands;
use crate::config::WeekmenuConfig;

pub async fn run_plan_command(
    command: PlanCommands,
    pool: &SqlitePool,
    config: &WeekmenuConfig,
) -> Result<()> {
    match command {
        PlanCommands::Generate {
            start,
            days,
            prefer_fish,
            high_protein,
            low_carb,
            min_fish,
        } => {
            let options = PlanOptions {
                prefer_fish,
                high_protein,
                low_carb,
                min_fish,
            };
            run_generate(pool, config, start, days, &options).await
        }
        PlanCommands::Show { start, days } => run_show(pool, config, start, days).await,
        PlanCommands::Retry { date } => run_retry(pool, config, date).await,
    }
}

pub(crate) fn range(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .map(|i| start + Days::new(u64::from(i)))
        .collect()
}

/// Days without a row yet count as cook days; only an explicit skip
/// removes a day from the plan.
pub(crate) async fn cook_days(pool: &SqlitePool, all_days: &[NaiveDate]) -> Result<Vec<NaiveDate>> {
    let mut result = Vec::with_capacity(all_days.len());
    for &day in all_days {
        let cook = day_plans::get_day(pool, day)
            .await?
            .map(|plan| plan.cook)
            .unwrap_or(true);
        if cook {
            result.push(day);
        }
    }
    Ok(result)
}

async fn run_generate(
    pool: &SqlitePool,
    config: &WeekmenuConfig,
    start: NaiveDate,
    days: u32,
    options: &PlanOptions,
) -> Result<()> {
    let book = RecipeBook::load(&config.recipes_path)?;
    let cook_days = cook_days(pool, &range(start, days)).await?;
    if cook_days.is_empty() {
        println!("No cook days in range; nothing to plan.");
        return Ok(());
    }

    let planned = plan::generate_plan(
        &cook_days,
        book.recipes(),
        &config.profile,
        options,
        &mut rand::rng(),
    );
    if planned.is_empty() {
        anyhow::bail!("no meals could be planned; check the recipe file and allergies");
    }

    for meal in &planned {
        day_plans::set_day_meal(pool, meal.date, &meal.meal_id)
            .await
            .with_context(|| format!("failed to save meal for {}", meal.date))?;
        println!("{}  {}", meal.date, meal.meal_name);
    }
    if planned.len() < cook_days.len() {
        println!(
            "({} cook day(s) left unplanned: every candidate was blocked)",
            cook_days.len() - planned.len()
        );
    }
    Ok(())
}

async fn run_show(
    pool: &SqlitePool,
    config: &WeekmenuConfig,
    start: NaiveDate,
    days: u32,
) -> Result<()> {
    let book = RecipeBook::load(&config.recipes_path)?;

    for day in range(start, days) {
        let entry = day_plans::get_day(pool, day).await?;
        let line = match entry {
            Some(plan) if !plan.cook => "(no cooking)".to_string(),
            Some(plan) => match plan.meal_id {
                Some(id) => book
                    .by_id(&id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| format!("unknown meal {id}")),
                None => "-".to_string(),
            },
            None => "-".to_string(),
        };
        println!("{day}  {line}");
    }
    Ok(())
}

async fn run_retry(pool: &SqlitePool, config: &WeekmenuConfig, date: NaiveDate) -> Result<()> {
    let book = RecipeBook::load(&config.recipes_path)?;

    let current = day_plans::get_day(pool, date)
        .await?
        .and_then(|plan| plan.meal_id);
    let excluded: Vec<String> = current.into_iter().collect();

    // Neighboring meals constrain the replacement (no fish or pasta on
    // consecutive days).
    let prev = neighbor_recipe(pool, &book, date.pred_opt()).await?;
    let next = neighbor_recipe(pool, &book, date.succ_opt()).await?;

    let pick = plan::select_best_recipe(
        book.recipes(),
        &config.profile,
        &PlanOptions::default(),
        Some(date),
        prev.as_ref(),
        next.as_ref(),
        &excluded,
    );

    match pick {
        Some(recipe) => {
            day_plans::set_day_meal(pool, date, &recipe.id).await?;
            println!("{date}  {}", recipe.name);
            Ok(())
        }
        None => anyhow::bail!("no alternative meal available for {date}"),
    }
}

async fn neighbor_recipe(
    pool: &SqlitePool,
    book: &RecipeBook,
    day: Option<NaiveDate>,
) -> Result<Option<weekmenu_core::plan::Recipe>> {
    let Some(day) = day else {
        return Ok(None);
    };
    let meal_id = day_plans::get_day(pool, day)
        .await?
        .filter(|plan| plan.cook)
        .and_then(|plan| plan.meal_id);
    Ok(meal_id.and_then(|id| book.by_id(&id).cloned()))
}
