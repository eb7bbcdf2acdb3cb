//! Error types for the core library.

use thiserror::Error;

use crate::export::OutputFormat;

/// Core library error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration-related error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A transport failure or a non-OK response from the Mattermost API.
    #[error("API error: {0}")]
    Api(String),

    /// A paginated listing never returned its terminating empty page.
    #[error("page limit exceeded: no empty page after {max_pages} pages of {what}")]
    PageLimit {
        /// What was being listed (e.g. `channels for team x`).
        what: String,
        /// The configured upper bound.
        max_pages: u32,
    },

    /// A generic error for other cases.
    #[error("error: {0}")]
    Other(String),
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// A failure of one export stage. Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The team name could not be mapped to an identifier.
    #[error("failed to resolve team '{team}': {source}")]
    Resolution {
        /// Requested team name.
        team: String,
        /// Underlying cause.
        #[source]
        source: CoreError,
    },

    /// Paginating the team's public channels failed.
    #[error("failed to list public channels for team '{team}': {source}")]
    Listing {
        /// Requested team name.
        team: String,
        /// Underlying cause.
        #[source]
        source: CoreError,
    },

    /// Paginating a channel's membership failed.
    #[error("failed to collect members of channel '{channel}': {source}")]
    Collection {
        /// Name of the channel whose pagination failed.
        channel: String,
        /// Underlying cause.
        #[source]
        source: CoreError,
    },

    /// Creating or writing the output failed.
    #[error("failed to write {format} output: {source}")]
    Write {
        /// The serializer that failed.
        format: OutputFormat,
        /// Underlying cause.
        #[source]
        source: CoreError,
    },
}

impl ExportError {
    /// Process exit code reserved for the failing stage.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Resolution { .. } => 1,
            Self::Listing { .. } => 2,
            Self::Collection { .. } => 3,
            Self::Write {
                format: OutputFormat::Csv,
                ..
            } => 4,
            Self::Write {
                format: OutputFormat::Json,
                ..
            } => 5,
        }
    }
}
