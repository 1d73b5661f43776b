//! Configuration file support for commitlog.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `COMMITLOG_`, e.g., `COMMITLOG_DATABASE_URL`)
//! 3. Config file (./commitlog.toml, then ~/.config/commitlog/config.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/commitlog/commitlog.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/commitlog/commitlog.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."                 # or use COMMITLOG_GITHUB_TOKEN env var
//! url = "https://api.github.com"    # API root, for GitHub Enterprise use https://host/api/v3
//! timeout = 30                      # per-request timeout in seconds
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

const APP_NAME: &str = "commitlog";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via COMMITLOG_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
    /// API root URL.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            url: commitlog::github::DEFAULT_API_URL.to_string(),
            timeout: 30,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/commitlog/config.toml)
    /// 3. Local config file (./commitlog.toml)
    /// 4. Environment variables with COMMITLOG_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("commitlog.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./commitlog.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., COMMITLOG_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("COMMITLOG")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("commitlog.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the GitHub token, ignoring blank values.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn github_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/commitlog` or `~/.local/state/commitlog`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.url, "https://api.github.com");
        assert_eq!(config.github_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres:///commitlog"

            [github]
            token = "ghp_test"
            url = "https://ghe.example.com/api/v3"
            timeout = 5
        "#,
        );

        assert_eq!(config.database.url.as_deref(), Some("postgres:///commitlog"));
        assert_eq!(config.github_token().as_deref(), Some("ghp_test"));
        assert_eq!(config.github.url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_github_section_keeps_defaults() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_test"
        "#,
        );
        assert_eq!(config.github.url, "https://api.github.com");
        assert_eq!(config.github.timeout, 30);
    }

    #[test]
    fn test_blank_token_is_treated_as_missing() {
        let config = from_toml(
            r#"
            [github]
            token = "   "
        "#,
        );
        assert_eq!(config.github_token(), None);
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        let url = config.database_url().expect("state dir should resolve");
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("commitlog.db?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let config = Config {
            database: DatabaseConfig {
                url: Some("sqlite::memory:".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(config.database_url().as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_config_merging_order() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\ntimeout = 60\nurl = \"https://a.example\"",
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                "[github]\ntimeout = 10",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.github.timeout, 10);
        assert_eq!(config.github.url, "https://a.example");
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[github\ntoken = 1", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml(
            r#"
            [github]
            token = "t"
            unknown_field = "should be ignored"
        "#,
        );
        assert_eq!(config.github_token().as_deref(), Some("t"));
    }
}
