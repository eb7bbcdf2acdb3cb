//! Core library for mm-channel-users.
//!
//! This crate provides:
//! - Configuration loading and management
//! - XDG-compliant path resolution
//! - Schema and example config generation
//! - A Mattermost REST client behind the [`MattermostApi`] trait
//! - The export traversal (team, public channels, channel members)
//! - CSV and JSON serializers for the collected member records

pub mod config;
pub mod error;
pub mod export;
pub mod mattermost;
pub mod paths;
pub mod schema;

pub use crate::config::{AppConfig, ConnectionConfig, ExportConfig, LogLevel, LoggingConfig};
pub use error::{CoreError, ExportError, Result};
pub use export::{
    ExportRequest, ExportSummary, OutputFormat, OutputTarget, Pagination, UserRecord, run_export,
};
pub use mattermost::{Channel, Connection, MattermostApi, MattermostClient, Scheme};
pub use paths::AppPaths;
pub use schema::{generate_example_config, generate_schema, write_generated_files};

/// Application name used for config directories and environment prefix.
pub const APP_NAME: &str = "mm-channel-users";

/// Returns the environment variable prefix for this application.
#[must_use]
pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
