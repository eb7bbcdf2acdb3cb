//! Export pipeline: team → public channels → channel members → one serializer.
//!
//! Every stage runs to completion before the next one starts, and the output
//! file is only created once all records have been collected. Any stage
//! failure aborts the run with an [`ExportError`] and nothing is written.

pub mod csv;
pub mod json;
pub mod traversal;

#[cfg(test)]
mod testing;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mattermost::{MattermostApi, User};
use crate::{CoreError, ExportError};

pub use traversal::{collect_members, list_public_channels, resolve_team};

/// Default number of items requested per page.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Default upper bound on pages fetched for a single listing.
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// One (channel, user) membership, flattened for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Name of the channel the user is a member of.
    #[serde(rename = "ChannelName")]
    pub channel_name: String,
    /// Opaque user ID.
    #[serde(rename = "UserID")]
    pub user_id: String,
    /// Login name.
    #[serde(rename = "Username")]
    pub username: String,
    /// Email address.
    #[serde(rename = "Email")]
    pub email: String,
    /// First name.
    #[serde(rename = "FirstName")]
    pub first_name: String,
    /// Last name.
    #[serde(rename = "LastName")]
    pub last_name: String,
    /// Nickname.
    #[serde(rename = "Nickname")]
    pub nickname: String,
}

impl UserRecord {
    /// Build the record for `user` as a member of `channel_name`.
    #[must_use]
    pub fn from_member(channel_name: &str, user: &User) -> Self {
        Self {
            channel_name: channel_name.to_string(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            nickname: user.nickname.clone(),
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One row per record with a fixed header.
    #[default]
    Csv,
    /// Records grouped by channel name in a nested document.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CSV" => Ok(Self::Csv),
            "JSON" => Ok(Self::Json),
            _ => Err(CoreError::Config(format!(
                "output type '{s}' is not supported (expected CSV or JSON)"
            ))),
        }
    }
}

/// Where the serialized export goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// The process's standard output.
    #[default]
    Stdout,
    /// A file, created (or truncated) at write time.
    File(PathBuf),
}

impl OutputTarget {
    /// Map an optional `-file` value to a target; empty means stdout.
    #[must_use]
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) if !p.as_os_str().is_empty() => Self::File(p),
            _ => Self::Stdout,
        }
    }

    /// Run `write` against this target and flush it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or any write fails.
    pub fn write_with<F>(&self, write: F) -> crate::Result<()>
    where
        F: FnOnce(&mut dyn Write) -> crate::Result<()>,
    {
        match self {
            Self::Stdout => {
                let stdout = io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                write(&mut out)?;
                out.flush()?;
            }
            Self::File(path) => {
                let file = File::create(path).map_err(|e| {
                    CoreError::Io(io::Error::new(
                        e.kind(),
                        format!("creating {}: {e}", path.display()),
                    ))
                })?;
                let mut out = BufWriter::new(file);
                write(&mut out)?;
                out.flush()?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Paging parameters shared by every paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Items requested per page.
    pub per_page: u32,
    /// Listings that have not returned an empty page after this many pages fail.
    pub max_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Parameters of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Team name to export.
    pub team: String,
    /// Emit bot accounts too.
    pub include_bots: bool,
    /// Serializer to use.
    pub format: OutputFormat,
    /// Output destination.
    pub target: OutputTarget,
    /// Paging parameters.
    pub pagination: Pagination,
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Public channels found in the team.
    pub channels: usize,
    /// Records written.
    pub records: usize,
}

/// Serialize `records` in `format` to `target`.
///
/// # Errors
///
/// Returns [`ExportError::Write`] if the output cannot be created or written.
pub fn write_records(
    records: &[UserRecord],
    format: OutputFormat,
    target: &OutputTarget,
) -> Result<(), ExportError> {
    log::debug!("writing {} record(s) as {format} to {target}", records.len());
    target
        .write_with(|out| match format {
            OutputFormat::Csv => csv::write_csv(records, out),
            OutputFormat::Json => json::write_json(records, out),
        })
        .map_err(|source| ExportError::Write { format, source })
}

/// Run the whole export: resolve the team, list its public channels, collect
/// their members and write them with the requested serializer.
///
/// # Errors
///
/// Returns the [`ExportError`] of the first stage that fails; nothing is
/// written in that case.
pub async fn run_export<A: MattermostApi>(
    api: &A,
    request: &ExportRequest,
) -> Result<ExportSummary, ExportError> {
    let team = resolve_team(api, &request.team).await?;
    log::debug!("team '{}' has ID {}", request.team, team.id);

    let channels = list_public_channels(api, &team, request.pagination).await?;
    log::info!(
        "found {} public channel(s) in team '{}'",
        channels.len(),
        request.team
    );

    let records =
        collect_members(api, &channels, request.include_bots, request.pagination).await?;

    write_records(&records, request.format, &request.target)?;

    Ok(ExportSummary {
        channels: channels.len(),
        records: records.len(),
    })
}
