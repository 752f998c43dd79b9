use std::env;
use std::path::Path;

/// Database configuration.
///
/// Reads from the `WEEKMENU_DATABASE_URL` environment variable, falling back
/// to a file database at `data/weekmenu.db` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full SQLite connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    ///
    /// `mode=rwc` creates the database file on first connect.
    pub const DEFAULT_URL: &str = "sqlite://data/weekmenu.db?mode=rwc";

    /// Build a config from the environment.
    ///
    /// Priority: `WEEKMENU_DATABASE_URL` env var, then the compile-time
    /// default.
    pub fn from_env() -> Self {
        let database_url =
            env::var("WEEKMENU_DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Extract the filesystem path of a file-backed database.
    ///
    /// Returns `None` for in-memory databases (`sqlite::memory:`).
    pub fn database_path(&self) -> Option<&Path> {
        let rest = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        if rest.starts_with(':') || rest.is_empty() {
            return None;
        }
        let path = rest.split('?').next().unwrap_or(rest);
        Some(Path::new(path))
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_url, "sqlite://data/weekmenu.db?mode=rwc");
    }

    #[test]
    fn database_path_strips_scheme_and_query() {
        let cfg = DbConfig::new("sqlite://data/weekmenu.db?mode=rwc");
        assert_eq!(cfg.database_path(), Some(Path::new("data/weekmenu.db")));
    }

    #[test]
    fn database_path_none_for_memory() {
        let cfg = DbConfig::new("sqlite::memory:");
        assert_eq!(cfg.database_path(), None);
    }

    #[test]
    fn explicit_new() {
        let cfg = DbConfig::new("sqlite:///tmp/other.db");
        assert_eq!(cfg.database_url, "sqlite:///tmp/other.db");
        assert_eq!(cfg.database_path(), Some(Path::new("/tmp/other.db")));
    }
}
