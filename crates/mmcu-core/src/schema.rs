//! Schema and example config generation.
//!
//! This module provides functions to generate the JSON schema and an example
//! TOML configuration from the config struct definitions.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use schemars::Schema;
use schemars::generate::SchemaSettings;
use serde_json::json;

use crate::config::AppConfig;

/// Generated schema filename.
pub const SCHEMA_FILENAME: &str = "config.schema.json";

/// Generated config filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Generate the JSON schema for `AppConfig` using schemars.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn generate_schema(project_name: &str, repo_url: &str) -> Result<String> {
    // draft-07 has the widest TOML editor support
    let settings = SchemaSettings::draft07();
    let generator = settings.into_generator();
    let mut schema: Schema = generator.into_root_schema_for::<AppConfig>();

    schema.insert(
        "$id".to_string(),
        json!(format!("{repo_url}/schemas/config.schema.json")),
    );
    schema.insert(
        "title".to_string(),
        json!(format!("{project_name} configuration")),
    );
    schema.insert(
        "description".to_string(),
        json!(format!("Configuration schema for {project_name}")),
    );

    if let Some(props) = schema.get_mut("properties")
        && let Some(props_obj) = props.as_object_mut()
    {
        props_obj.insert(
            "$schema".to_string(),
            json!({
                "type": "string",
                "description": "JSON Schema reference for editor support"
            }),
        );
    }

    serde_json::to_string_pretty(&schema).context("serializing JSON schema")
}

/// Generate the example TOML configuration from the default `AppConfig`.
///
/// # Errors
///
/// Returns an error if TOML serialization fails.
pub fn generate_example_config(project_name: &str) -> Result<String> {
    let config = AppConfig::default();
    let toml_body =
        toml::to_string_pretty(&config).context("serializing default config to TOML")?;

    let mut output = String::new();
    let _ = write!(
        output,
        r#"# Configuration for {project_name}.
# Copy this file to $XDG_CONFIG_HOME/{project_name}/config.toml and adjust as needed.
# Command-line flags and the MM_URL, MM_PORT, MM_SCHEME, MM_TOKEN and MM_DEBUG
# environment variables take precedence over these values.
#
# [connection]
# url = "chat.example.com"
# token = "..."

"#
    );
    output.push_str(&toml_body);

    Ok(output)
}

/// Write generated files to a directory.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_generated_files(output_dir: &Path, project_name: &str, repo_url: &str) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory: {}", output_dir.display()))?;

    let schema = generate_schema(project_name, repo_url)?;
    let schema_path = output_dir.join(SCHEMA_FILENAME);
    fs::write(&schema_path, &schema)
        .with_context(|| format!("writing schema to {}", schema_path.display()))?;

    let config = generate_example_config(project_name)?;
    let config_path = output_dir.join(CONFIG_FILENAME);
    fs::write(&config_path, &config)
        .with_context(|| format!("writing config to {}", config_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::APP_NAME;

    const REPO_URL: &str = "https://github.com/byteowlz/mm-channel-users";

    #[test]
    fn test_schema_generation() {
        let schema = generate_schema(APP_NAME, REPO_URL).expect("schema generation failed");
        assert!(schema.contains("\"title\""));
        assert!(schema.contains("mm-channel-users configuration"));
        assert!(schema.contains("\"$schema\""));
        assert!(schema.contains("LogLevel"));
        assert!(schema.contains("per_page"));
    }

    #[test]
    fn test_config_generation() {
        let config = generate_example_config(APP_NAME).expect("config generation failed");
        assert!(config.contains("[connection]"));
        assert!(config.contains("[export]"));
        assert!(config.contains("[pagination]"));
        assert!(config.contains("port = 8065"));
        assert!(!config.contains("\ntoken ="));
    }

    #[test]
    fn generated_files_land_in_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_generated_files(dir.path(), APP_NAME, REPO_URL).expect("files written");
        assert!(dir.path().join(SCHEMA_FILENAME).is_file());
        assert!(dir.path().join(CONFIG_FILENAME).is_file());
    }
}
