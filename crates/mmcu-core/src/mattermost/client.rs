//! Mattermost API client using the v4 REST endpoints.
//!
//! All calls authenticate with `Authorization: Bearer <token>`; the token must
//! belong to an account allowed to read every public channel of the team.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::mattermost::models::{Channel, Team, User};
use crate::mattermost::{Connection, MattermostApi};
use crate::{CoreError, Result};

/// Per-request timeout enforced by the HTTP transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Mattermost API client.
pub struct MattermostClient {
    http_client: Client,
    base_url: String,
    token: String,
}

impl MattermostClient {
    /// Create a new client for the given connection.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(connection: &Connection) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("mm-channel-users/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Other(format!("creating HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: connection.base_url(),
            token: connection.token.clone(),
        })
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/api/v4{path}", self.base_url);
        log::trace!("GET {url} {query:?}");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| CoreError::Api(format!("{what} request failed: {e}")))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::Api(format!("{what} failed: {status} - {text}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CoreError::Serialization(format!("parsing {what} response: {e}")))
    }
}

impl fmt::Debug for MattermostClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MattermostClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MattermostApi for MattermostClient {
    async fn team_by_name(&self, name: &str) -> Result<Team> {
        let path = format!("/teams/name/{}", urlencoding::encode(name));
        self.get_json("get team by name", &path, &[]).await
    }

    async fn public_channels_for_team(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Channel>> {
        let path = format!("/teams/{}/channels", urlencoding::encode(team_id));
        self.get_json(
            "list public channels",
            &path,
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    async fn users_in_channel(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<User>> {
        self.get_json(
            "list channel members",
            "/users",
            &[
                ("in_channel", channel_id.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }
}
