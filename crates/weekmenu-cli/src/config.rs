//! Configuration file management for weekmenu.
//!
//! Provides a TOML-based config file at `~/.config/weekmenu/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use weekmenu_core::plan::Profile;
use weekmenu_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub app: AppSection,
    /// Household likes/dislikes/allergies and nutrition weights for the
    /// plan engine.
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppSection {
    /// The serving count recipe quantities are written for.
    #[serde(default = "default_base_servings")]
    pub base_servings: u32,
    /// Path to the recipe JSON file.
    #[serde(default = "default_recipes_path")]
    pub recipes_path: PathBuf,
}

fn default_base_servings() -> u32 {
    2
}

fn default_recipes_path() -> PathBuf {
    PathBuf::from("recipes.json")
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            base_servings: default_base_servings(),
            recipes_path: default_recipes_path(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the weekmenu config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/weekmenu` or
/// `~/.config/weekmenu`. We intentionally ignore the platform-specific
/// `dirs::config_dir()` (which returns `~/Library/Application Support` on
/// macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("weekmenu");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("weekmenu")
}

/// Return the path to the weekmenu config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WeekmenuConfig {
    pub db_config: DbConfig,
    pub base_servings: u32,
    pub recipes_path: PathBuf,
    pub profile: Profile,
}

impl WeekmenuConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > default.
    ///
    /// - DB URL: `cli_db_url` > `WEEKMENU_DATABASE_URL` env >
    ///   `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Recipes path: `WEEKMENU_RECIPES` env > `config_file.app.recipes_path`
    ///   > `recipes.json`
    /// - Base servings and profile come from the config file (or defaults).
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("WEEKMENU_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let recipes_path = if let Ok(path) = std::env::var("WEEKMENU_RECIPES") {
            PathBuf::from(path)
        } else if let Some(ref cfg) = file_config {
            cfg.app.recipes_path.clone()
        } else {
            default_recipes_path()
        };

        let (base_servings, profile) = match file_config {
            Some(cfg) => (cfg.app.base_servings, cfg.profile),
            None => (default_base_servings(), Profile::default()),
        };

        Ok(Self {
            db_config,
            base_servings,
            recipes_path,
            profile,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    #[test]
    fn config_file_roundtrips_through_toml() {
        let original = ConfigFile {
            database: DatabaseSection {
                url: "sqlite://testdata/test.db?mode=rwc".to_string(),
            },
            app: AppSection {
                base_servings: 4,
                recipes_path: PathBuf::from("/etc/weekmenu/recipes.json"),
            },
            profile: Profile::default(),
        };

        let contents = toml::to_string_pretty(&original).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();

        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.app.base_servings, 4);
        assert_eq!(loaded.app.recipes_path, original.app.recipes_path);
    }

    #[test]
    fn empty_config_file_falls_back_to_defaults() {
        let loaded: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(loaded.database.url, DbConfig::DEFAULT_URL);
        assert_eq!(loaded.app.base_servings, 2);
        assert_eq!(loaded.app.recipes_path, PathBuf::from("recipes.json"));
        assert!(loaded.profile.family.likes.is_empty());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var("WEEKMENU_DATABASE_URL", "sqlite://env/env.db") };

        let config = WeekmenuConfig::resolve(Some("sqlite://cli/cli.db")).unwrap();
        assert_eq!(config.db_config.database_url, "sqlite://cli/cli.db");

        unsafe { std::env::remove_var("WEEKMENU_DATABASE_URL") };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();

        unsafe { std::env::set_var("WEEKMENU_DATABASE_URL", "sqlite://env/env.db") };

        let config = WeekmenuConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "sqlite://env/env.db");

        unsafe { std::env::remove_var("WEEKMENU_DATABASE_URL") };
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();

        unsafe { std::env::remove_var("WEEKMENU_DATABASE_URL") };
        unsafe { std::env::remove_var("WEEKMENU_RECIPES") };
        // Point HOME and XDG_CONFIG_HOME at a temp dir so load_config()
        // cannot find a real config file.
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_home = std::env::var("HOME").ok();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("HOME", tmp.path()) };
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };

        let result = WeekmenuConfig::resolve(None);

        // Restore env before asserting, to avoid poisoning the mutex on
        // failure.
        match orig_home {
            Some(h) => unsafe { std::env::set_var("HOME", h) },
            None => unsafe { std::env::remove_var("HOME") },
        }
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.base_servings, 2);
        assert_eq!(config.recipes_path, PathBuf::from("recipes.json"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("weekmenu/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
