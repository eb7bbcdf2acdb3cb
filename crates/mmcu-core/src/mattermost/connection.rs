//! Connection parameters for a Mattermost server.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// HTTP scheme used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP (default).
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(CoreError::Config(format!(
                "unsupported scheme '{other}' (expected http or https)"
            ))),
        }
    }
}

/// Target host, port, scheme and the bearer token of an administrator account.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    /// Host name without scheme or port (e.g. `chat.example.com`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// Personal access or session token.
    pub token: String,
}

impl Connection {
    /// Base URL of the server, e.g. `https://chat.example.com:443`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
