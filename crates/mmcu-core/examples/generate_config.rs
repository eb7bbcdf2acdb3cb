//! Generate config.toml and config.schema.json into the workspace `schemas/` directory.
//!
//! Run with: cargo run -p mmcu-core --example generate_config

use std::path::PathBuf;

use anyhow::Context as _;
use mmcu_core::{APP_NAME, write_generated_files};

/// Repository URL for schema $id.
const REPO_URL: &str = "https://github.com/byteowlz/mm-channel-users";

fn main() -> anyhow::Result<()> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let crate_root = PathBuf::from(&manifest_dir);
    let workspace_root = crate_root
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .context("could not find workspace root")?;

    let schemas_dir = workspace_root.join("schemas");

    println!("Generating config files to {}...", schemas_dir.display());
    write_generated_files(&schemas_dir, APP_NAME, REPO_URL)?;
    println!("Done! Generated:");
    println!("  - {}/config.schema.json", schemas_dir.display());
    println!("  - {}/config.toml", schemas_dir.display());

    Ok(())
}
