mod config;
mod day_cmd;
mod plan_cmd;
mod serve_cmd;
mod shop_cmd;
#[cfg(test)]
mod test_util;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use weekmenu_db::pool;

use config::WeekmenuConfig;

#[derive(Parser)]
#[command(name = "weekmenu", about = "Household meal planner and shopping list")]
struct Cli {
    /// Database URL (overrides WEEKMENU_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a weekmenu config file (no database required)
    Init {
        /// SQLite connection URL
        #[arg(long, default_value = weekmenu_db::config::DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the weekmenu database (creates the file and runs migrations)
    DbInit,
    /// Meal plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Per-day cook settings
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Shopping list management
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Fill the cook days of a date range with meals
    Generate {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Number of days to plan
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Prefer fish meals
        #[arg(long)]
        prefer_fish: bool,
        /// Weight protein-rich meals higher
        #[arg(long)]
        high_protein: bool,
        /// Weight carb-heavy meals lower
        #[arg(long)]
        low_carb: bool,
        /// Minimum fish meals in the range (overrides the profile)
        #[arg(long)]
        min_fish: Option<u32>,
    },
    /// Show the plan for a date range
    Show {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Number of days to show
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Pick a different meal for one day
    Retry {
        /// Day to replan (YYYY-MM-DD)
        date: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// Mark a day as a cook day
    Cook {
        /// Day to mark (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Mark a day as a no-cook day
    Skip {
        /// Day to mark (YYYY-MM-DD)
        date: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum ShopCommands {
    /// Regenerate the list from the planned meals in a date range
    Generate {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Number of days to cover
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Number of people to scale quantities to
        #[arg(long, default_value_t = 2)]
        persons: u32,
    },
    /// Show the current list
    Show,
    /// Add a single item
    Add {
        /// Item name
        name: String,
        /// Quantity (0 means "to taste")
        #[arg(long, default_value_t = 0.0)]
        quantity: f64,
        /// Unit, e.g. "kg" or "stuk"
        #[arg(long, default_value = "")]
        unit: String,
    },
    /// Check off an item
    Check {
        /// Item id (see `shop show`)
        id: i64,
    },
    /// Uncheck an item
    Uncheck {
        /// Item id
        id: i64,
    },
    /// Move an item before or after another item
    Move {
        /// Item id to move
        id: i64,
        /// Item id to move it next to
        target: i64,
        /// Insert after the target instead of before it
        #[arg(long)]
        after: bool,
    },
    /// Remove an item
    Remove {
        /// Item id
        id: i64,
    },
    /// Archive checked items to history and drop them from the list
    Complete {
        /// Day to record the purchases under (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Wipe the entire list without archiving
    Clear,
}

/// Execute the `weekmenu init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        ..config::ConfigFile::default()
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `weekmenu db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `weekmenu db-init` command: create the database file and run
/// migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = WeekmenuConfig::resolve(cli_db_url)?;

    println!("Initializing weekmenu database...");

    pool::ensure_database_dir(&resolved.db_config)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("weekmenu db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Plan { command } => {
            let resolved = WeekmenuConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmd::run_plan_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Day { command } => {
            let resolved = WeekmenuConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = day_cmd::run_day_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Shop { command } => {
            let resolved = WeekmenuConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = shop_cmd::run_shop_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = WeekmenuConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &resolved, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
