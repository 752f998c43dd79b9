use anyhow::Result;
use sqlx::SqlitePool;

use weekmenu_db::queries::day_plans;

use crate::DayCommands;

pub async fn run_day_command(command: DayCommands, pool: &SqlitePool) -> Result<()> {
    match command {
        DayCommands::Cook { date } => {
            day_plans::set_day_cook(pool, date, true).await?;
            println!("{date} marked as a cook day.");
        }
        DayCommands::Skip { date } => {
            day_plans::set_day_cook(pool, date, false).await?;
            println!("{date} marked as a no-cook day.");
        }
    }
    Ok(())
}
