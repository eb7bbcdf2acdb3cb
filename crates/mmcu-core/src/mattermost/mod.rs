//! Mattermost API access.
//!
//! This module provides:
//! - Connection parameters ([`Connection`], [`Scheme`])
//! - Wire models for teams, channels and users
//! - The [`MattermostApi`] trait the export traversal is written against
//! - [`MattermostClient`], the `reqwest`-based implementation of that trait

pub mod client;
pub mod connection;
pub mod models;

use std::future::Future;

pub use client::MattermostClient;
pub use connection::{Connection, Scheme};
pub use models::{Channel, Team, User};

use crate::Result;

/// The three read-only Mattermost operations the export needs.
///
/// Each call is one round-trip. Implementations fail on transport errors and
/// on any status other than `200 OK`.
pub trait MattermostApi {
    /// Look up a team by its URL-safe name.
    fn team_by_name(&self, name: &str) -> impl Future<Output = Result<Team>>;

    /// Fetch one page of the public channels of a team.
    fn public_channels_for_team(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<Channel>>>;

    /// Fetch one page of the members of a channel.
    fn users_in_channel(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<User>>>;
}
