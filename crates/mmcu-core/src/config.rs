//! Configuration types and loading for the application.
//!
//! The config file only supplies defaults: command-line flags and the
//! `MM_*` environment variables handled by the CLI always take precedence.

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::env_prefix;
use crate::export::{DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, OutputFormat, Pagination};
use crate::mattermost::Scheme;

/// Default Mattermost port.
pub const DEFAULT_PORT: u16 = 8065;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(
    title = "Application Configuration",
    description = "Defaults for mm-channel-users; command-line flags and MM_* variables override them"
)]
pub struct AppConfig {
    /// JSON Schema reference for editor support.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub schema: Option<String>,

    /// Mattermost server to connect to.
    pub connection: ConnectionConfig,

    /// Export defaults.
    pub export: ExportConfig,

    /// Paging behavior for API listings.
    pub pagination: PaginationConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a specific path. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load_from_path(config_file: &Path) -> Result<Self> {
        let env_prefix = env_prefix();
        let built = Config::builder()
            .set_default("connection.port", i64::from(DEFAULT_PORT))?
            .set_default("connection.scheme", "http")?
            .set_default("export.format", "csv")?
            .set_default("export.include_bots", false)?
            .set_default("pagination.per_page", i64::from(DEFAULT_PER_PAGE))?
            .set_default("pagination.max_pages", i64::from(DEFAULT_MAX_PAGES))?
            .set_default("logging.level", "info")?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(env_prefix.as_str()).separator("__"))
            .build()?;

        let config: Self = built.try_deserialize()?;
        config.pagination.validate()?;
        Ok(config)
    }
}

/// Connection defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Mattermost server connection")]
pub struct ConnectionConfig {
    /// Host name without scheme or port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// TCP port (default: 8065).
    pub port: u16,

    /// HTTP scheme (http or https).
    pub scheme: Scheme,

    /// Bearer token of an administrator account. Prefer `MM_TOKEN` over
    /// storing it on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            port: DEFAULT_PORT,
            scheme: Scheme::Http,
            token: None,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Export defaults")]
pub struct ExportConfig {
    /// Output format (csv or json).
    pub format: OutputFormat,

    /// Include bot accounts in the export.
    pub include_bots: bool,
}

/// Paging behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Paging behavior for API listings")]
pub struct PaginationConfig {
    /// Items requested per page (default: 50).
    #[schemars(range(min = 1, max = 200))]
    pub per_page: u32,

    /// Abort a listing that has not ended after this many pages (default: 10000).
    #[schemars(range(min = 1))]
    pub max_pages: u32,
}

impl PaginationConfig {
    fn validate(self) -> Result<()> {
        if self.per_page == 0 || self.per_page > 200 {
            anyhow::bail!(
                "pagination.per_page must be between 1 and 200, got {}",
                self.per_page
            );
        }
        if self.max_pages == 0 {
            anyhow::bail!("pagination.max_pages must be at least 1");
        }
        Ok(())
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl From<PaginationConfig> for Pagination {
    fn from(cfg: PaginationConfig) -> Self {
        Self {
            per_page: cfg.per_page,
            max_pages: cfg.max_pages,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Logging configuration")]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace).
    #[schemars(default = "default_log_level")]
    pub level: LogLevel,
}

/// Log level enumeration for schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only emit error-level messages.
    Error,
    /// Emit warnings and errors.
    Warn,
    /// Emit informational messages and above (default).
    #[default]
    Info,
    /// Emit debug diagnostics and above.
    Debug,
    /// Emit all messages including fine-grained traces.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

const fn default_log_level() -> LogLevel {
    LogLevel::Info
}
