//! Runtime configuration for the `flashcards` binary.
//!
//! Read from `--config <path>` when given, otherwise from `./flashcards.toml`
//! if it exists, otherwise defaults. `FLASHCARDS_DB` overrides the database path.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "flashcards.toml";
pub const DATABASE_ENV_VAR: &str = "FLASHCARDS_DB";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file holding sets, cards and review progress.
    pub database_path: PathBuf,
    /// How many times one card may be shown within a single study session.
    pub max_reviews_per_card: u32,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("flashcards.sqlite3"),
            max_reviews_per_card: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };

        if let Ok(database) = std::env::var(DATABASE_ENV_VAR) {
            if !database.is_empty() {
                config.database_path = PathBuf::from(database);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_reviews_per_card == 0 {
            bail!("max_reviews_per_card must be at least 1");
        }
        if self.database_path.as_os_str().is_empty() {
            bail!("database_path must not be empty");
        }
        Ok(())
    }
}
