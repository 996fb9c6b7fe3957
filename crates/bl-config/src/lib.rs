//! # bl-config
//!
//! Layered settings for Rusty-Blog. Later layers win:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. the file named by `RUSTY_BLOG_CONFIG` (optional)
//! 4. `RUSTY_BLOG__*` environment variables, e.g. `RUSTY_BLOG__DATABASE__URL`
//!
//! A `.env` file is read first, if present.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RUSTY_BLOG";
pub const CONFIG_PATH_VAR: &str = "RUSTY_BLOG_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub blog: BlogSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite:rusty_blog.db`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogSettings {
    /// Fixed page size for every listing
    pub posts_per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Loads settings from all layers.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = defaults()?
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with a TOML document. Ignores the environment.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let settings: Settings = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.blog.posts_per_page == 0 {
            return Err(ConfigError::Invalid("blog.posts_per_page must be at least 1".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".into()));
        }
        Ok(())
    }
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("database.url", "sqlite:rusty_blog.db")?
        .set_default("database.max_connections", 5)?
        .set_default("blog.posts_per_page", 10)?
        .set_default("log.filter", "info")?)
}
