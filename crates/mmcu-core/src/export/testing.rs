//! In-memory Mattermost used by the export tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::mattermost::{Channel, MattermostApi, Team, User};
use crate::{CoreError, Result};

/// Serves one team, pages its channels and members out of memory, and
/// records every request it receives.
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    team: Team,
    channels: Vec<Channel>,
    members: HashMap<String, Vec<User>>,
    failing_members: Option<String>,
    failing_channels_page: Option<u32>,
    endless_channels: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new(team_name: &str, team_id: &str) -> Self {
        Self {
            team: Team {
                id: team_id.to_string(),
                name: team_name.to_string(),
                display_name: team_name.to_string(),
            },
            ..Self::default()
        }
    }

    pub(crate) fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.push(Channel {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub(crate) fn with_members(mut self, channel_id: &str, users: Vec<User>) -> Self {
        self.members.insert(channel_id.to_string(), users);
        self
    }

    pub(crate) fn failing_members_of(mut self, channel_id: &str) -> Self {
        self.failing_members = Some(channel_id.to_string());
        self
    }

    pub(crate) const fn failing_channels_page(mut self, page: u32) -> Self {
        self.failing_channels_page = Some(page);
        self
    }

    pub(crate) const fn endless_channels(mut self) -> Self {
        self.endless_channels = true;
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }

    fn record(&self, request: String) {
        self.requests.lock().expect("request log lock").push(request);
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    items
        .iter()
        .skip((page * per_page) as usize)
        .take(per_page as usize)
        .cloned()
        .collect()
}

fn server_error() -> CoreError {
    CoreError::Api("500 Internal Server Error".to_string())
}

impl MattermostApi for FakeApi {
    async fn team_by_name(&self, name: &str) -> Result<Team> {
        self.record(format!("team:{name}"));
        if name == self.team.name {
            Ok(self.team.clone())
        } else {
            Err(CoreError::Api(format!(
                "get team by name failed: 404 Not Found - team '{name}'"
            )))
        }
    }

    async fn public_channels_for_team(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Channel>> {
        self.record(format!("channels:{page}"));
        if team_id != self.team.id || self.failing_channels_page == Some(page) {
            return Err(server_error());
        }
        if self.endless_channels {
            return Ok(vec![Channel {
                id: format!("c-{page}"),
                name: format!("channel-{page}"),
            }]);
        }
        Ok(page_of(&self.channels, page, per_page))
    }

    async fn users_in_channel(
        &self,
        channel_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<User>> {
        self.record(format!("members:{channel_id}:{page}"));
        if self.failing_members.as_deref() == Some(channel_id) {
            return Err(server_error());
        }
        Ok(self
            .members
            .get(channel_id)
            .map(|users| page_of(users, page, per_page))
            .unwrap_or_default())
    }
}

/// An active human account.
pub(crate) fn member(name: &str) -> User {
    let mut first_name = name.to_string();
    if let Some(first) = first_name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    User {
        id: format!("id-{name}"),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        first_name,
        last_name: "Tester".to_string(),
        nickname: format!("{name}-nick"),
        delete_at: 0,
        is_bot: false,
    }
}

/// An active bot account.
pub(crate) fn bot(name: &str) -> User {
    User {
        is_bot: true,
        ..member(name)
    }
}

/// A deactivated human account.
pub(crate) fn deactivated(name: &str) -> User {
    User {
        delete_at: 1_712_345_678_901,
        ..member(name)
    }
}
