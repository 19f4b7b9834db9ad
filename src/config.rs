use crate::error::{EtiSignupsError, Result};
use crate::i18n::Catalog;
use crate::projection::DateStyle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure loaded from eti_signups.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub display: DisplayConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Connection settings for the remote signup store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    #[serde(default = "default_signups_table")]
    pub signups_table: String,
}

/// Presentation settings for the signup table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub locale: String,
    pub date_format: String,
    /// Viewports narrower than this (in px) hide non-essential columns
    pub small_screen_width: u32,
    #[serde(default)]
    pub translations: Option<PathBuf>,
}

fn default_signups_table() -> String {
    "signups".to_string()
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub database_user: String,
    pub database_pass: String,
    pub db_reconnect: bool,
    pub log_level: String,
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_user: "root".to_string(),
            database_pass: "root".to_string(),
            db_reconnect: false,
            log_level: "eti_signups=info".to_string(),
            channel_capacity: 16,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            database_user: std::env::var("ETI_DB_USER").unwrap_or_else(|_| "root".to_string()),
            database_pass: std::env::var("ETI_DB_PASS").unwrap_or_else(|_| "root".to_string()),
            db_reconnect: std::env::var("ETI_DB_RECONNECT")
                .ok()
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "eti_signups=info".to_string()),
            channel_capacity: std::env::var("ETI_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|v| v.clamp(1, 1024))
                .unwrap_or(16),
        }
    }
}

/// Load `.env` (or the file named by ETI_ENV_FILE). Missing files are fine.
pub fn load_env() {
    if let Ok(env_path) = std::env::var("ETI_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::from_path(".env");
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses ETI_SIGNUPS_CONFIG environment variable or defaults to "eti_signups.toml"
    pub fn load() -> Result<Self> {
        load_env();

        let config_path = std::env::var("ETI_SIGNUPS_CONFIG")
            .unwrap_or_else(|_| "eti_signups.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Env-first database overrides
        if let Ok(db_url) = std::env::var("ETI_DB_URL") {
            tracing::debug!("ETI_DB_URL env override applied");
            config.database.url = db_url;
        }
        if let Ok(db_ns) = std::env::var("ETI_DB_NS") {
            tracing::debug!("ETI_DB_NS env override applied");
            config.database.namespace = db_ns;
        }
        if let Ok(db_name) = std::env::var("ETI_DB_DB") {
            tracing::debug!("ETI_DB_DB env override applied");
            config.database.database = db_name;
        }

        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Translation catalog for the display settings: the built-in strings,
    /// overlaid with `display.translations` when set.
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.display.translations {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }

    pub fn date_style(&self) -> DateStyle {
        DateStyle::new(self.display.date_format.clone())
    }

    /// Validate settings that would otherwise fail late (at render or connect time)
    pub fn validate(&self) -> Result<()> {
        let url = &self.database.url;
        if url.contains("://") && !url.starts_with("ws://") && !url.starts_with("wss://") {
            tracing::warn!(
                "Database URL '{}' doesn't start with ws:// or wss://; the store connects over WebSocket",
                url
            );
        }
        let normalized = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"))
            .unwrap_or(url);
        if !normalized.contains(':') || normalized.starts_with(':') || normalized.ends_with(':') {
            tracing::warn!("Database URL '{}' appears to be missing hostname or port", url);
        }

        if self.database.signups_table.trim().is_empty() {
            return Err(EtiSignupsError::Config {
                message: "database.signups_table must not be empty".into(),
            });
        }

        // chrono reports bad specifiers lazily; render a sample once here
        DateStyle::parse(&self.display.date_format).map_err(|_| EtiSignupsError::Config {
            message: format!("invalid display.date_format '{}'", self.display.date_format),
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "127.0.0.1:8000".to_string(),
                namespace: "eti".to_string(),
                database: "eti".to_string(),
                signups_table: default_signups_table(),
            },
            display: DisplayConfig {
                locale: "es-AR".to_string(),
                date_format: "%d/%m/%Y".to_string(),
                small_screen_width: 600,
                translations: None,
            },
            runtime: RuntimeConfig::default(),
        }
    }
}
