use anyhow::Result;
use chrono::{Days, Local};
use sqlx::SqlitePool;

use weekmenu_core::generate::{PlanContext, PlanIngredients};
use weekmenu_core::plan::RecipeBook;
use weekmenu_core::shopping::{ShoppingSession, list, service};
use weekmenu_db::models::ShoppingItem;

use crate::ShopCommands;
use crate::config::WeekmenuConfig;

pub async fn run_shop_command(
    command: ShopCommands,
    pool: &SqlitePool,
    config: &WeekmenuConfig,
) -> Result<()> {
    let mut session = ShoppingSession::new();
    service::load(pool, &mut session).await?;

    match command {
        ShopCommands::Generate {
            start,
            days,
            persons,
        } => {
            let book = RecipeBook::load(&config.recipes_path)?;
            let generator =
                PlanIngredients::new(pool.clone(), book, config.base_servings);
            let ctx = PlanContext {
                start,
                end: start + Days::new(u64::from(days.saturating_sub(1))),
                person_count: persons,
            };
            service::generate(pool, &mut session, &generator, &ctx).await?;
            println!("Generated {} item(s).", session.items.len());
        }
        ShopCommands::Show => {}
        ShopCommands::Add {
            name,
            quantity,
            unit,
        } => {
            service::add(pool, &mut session, &name, quantity, &unit).await?;
        }
        ShopCommands::Check { id } => {
            service::toggle(pool, &mut session, id, true).await?;
        }
        ShopCommands::Uncheck { id } => {
            service::toggle(pool, &mut session, id, false).await?;
        }
        ShopCommands::Move { id, target, after } => {
            service::move_to(pool, &mut session, id, target, after).await?;
        }
        ShopCommands::Remove { id } => {
            service::delete(pool, &mut session, id).await?;
        }
        ShopCommands::Complete { date } => {
            let day = date.unwrap_or_else(|| Local::now().date_naive());
            let archived = service::complete(pool, &mut session, day).await?;
            println!("Archived {archived} item(s) under {day}.");
        }
        ShopCommands::Clear => {
            let removed = service::clear(pool, &mut session).await?;
            println!("Removed {removed} item(s).");
        }
    }

    print_list(&session.items);
    Ok(())
}

fn print_list(items: &[ShoppingItem]) {
    if items.is_empty() {
        println!("Shopping list is empty.");
        return;
    }

    for item in list::sorted_view(items) {
        let mark = if item.checked { "x" } else { " " };
        let amount = if item.show_quantity && item.quantity > 0.0 {
            format!(" {} {}", trim_quantity(item.quantity), item.unit)
                .trim_end()
                .to_string()
        } else {
            String::new()
        };
        println!("[{mark}] {:>4}  {}{amount}", item.id, item.name);
    }
}

/// Render 2.0 as "2" but keep 0.5 as "0.5".
fn trim_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}
