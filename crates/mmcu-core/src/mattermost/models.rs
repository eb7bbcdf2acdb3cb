//! Data models for the Mattermost v4 REST API.
//!
//! Only the fields the export needs are modelled; everything else in the
//! server's payloads is ignored.

use serde::{Deserialize, Serialize};

/// A team as returned by `GET /api/v4/teams/name/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    /// Opaque team ID.
    pub id: String,
    /// URL-safe team name.
    pub name: String,
    /// Human-readable team name.
    pub display_name: String,
}

/// A public channel within a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Opaque channel ID.
    pub id: String,
    /// URL-safe channel name; used as the grouping key in exports.
    pub name: String,
}

/// A user account as returned by `GET /api/v4/users?in_channel=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Opaque user ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address (may be empty when the server hides it).
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Nickname.
    pub nickname: String,
    /// Deactivation timestamp in Unix milliseconds; `0` while active.
    pub delete_at: i64,
    /// Whether the account is a bot.
    pub is_bot: bool,
}

impl User {
    /// Whether the account has been deactivated.
    #[must_use]
    pub const fn is_deactivated(&self) -> bool {
        self.delete_at != 0
    }
}
