//! Team resolution, public channel listing and member collection.

use std::future::Future;

use crate::export::{Pagination, UserRecord};
use crate::mattermost::{Channel, MattermostApi, Team};
use crate::{CoreError, ExportError};

/// Request pages `0, 1, 2, ...` until one comes back empty and return the
/// concatenation of all items in arrival order.
async fn fetch_all_pages<T, F, Fut>(
    what: &str,
    pagination: Pagination,
    mut fetch_page: F,
) -> crate::Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = crate::Result<Vec<T>>>,
{
    let mut all = Vec::new();
    for page in 0..pagination.max_pages {
        let batch = fetch_page(page).await?;
        log::debug!("{what}: page {page} returned {} item(s)", batch.len());
        if batch.is_empty() {
            return Ok(all);
        }
        all.extend(batch);
    }
    Err(CoreError::PageLimit {
        what: what.to_string(),
        max_pages: pagination.max_pages,
    })
}

/// Look up a team by name.
///
/// # Errors
///
/// Returns [`ExportError::Resolution`] on transport failure or a non-OK status.
pub async fn resolve_team<A: MattermostApi>(api: &A, team_name: &str) -> Result<Team, ExportError> {
    log::debug!("getting team ID for '{team_name}'");
    api.team_by_name(team_name)
        .await
        .map_err(|source| ExportError::Resolution {
            team: team_name.to_string(),
            source,
        })
}

/// List every public channel of `team`, in the order the server returns them.
///
/// # Errors
///
/// Returns [`ExportError::Listing`] if any page fails; channels already
/// fetched are discarded.
pub async fn list_public_channels<A: MattermostApi>(
    api: &A,
    team: &Team,
    pagination: Pagination,
) -> Result<Vec<Channel>, ExportError> {
    let team_id = team.id.as_str();
    let per_page = pagination.per_page;
    let what = format!("public channels of team '{}'", team.name);

    let channels = fetch_all_pages(&what, pagination, move |page| {
        api.public_channels_for_team(team_id, page, per_page)
    })
    .await
    .map_err(|source| ExportError::Listing {
        team: team.name.clone(),
        source,
    })?;

    for channel in &channels {
        log::debug!("channel ID: {}, name: {}", channel.id, channel.name);
    }
    Ok(channels)
}

/// Collect the members of every channel as flat records.
///
/// Deactivated accounts are always skipped; bot accounts are skipped unless
/// `include_bots` is set. A user in several channels yields one record per
/// channel.
///
/// # Errors
///
/// Returns [`ExportError::Collection`] naming the first channel whose
/// membership could not be fetched.
pub async fn collect_members<A: MattermostApi>(
    api: &A,
    channels: &[Channel],
    include_bots: bool,
    pagination: Pagination,
) -> Result<Vec<UserRecord>, ExportError> {
    let per_page = pagination.per_page;
    let mut records = Vec::new();

    for channel in channels {
        let channel_id = channel.id.as_str();
        let what = format!("members of channel '{}'", channel.name);

        let users = fetch_all_pages(&what, pagination, move |page| {
            api.users_in_channel(channel_id, page, per_page)
        })
        .await
        .map_err(|source| ExportError::Collection {
            channel: channel.name.clone(),
            source,
        })?;

        for user in &users {
            if user.is_deactivated() {
                log::debug!("skipping deactivated account '{}'", user.username);
                continue;
            }
            if user.is_bot && !include_bots {
                log::debug!("skipping bot account '{}'", user.username);
                continue;
            }
            records.push(UserRecord::from_member(&channel.name, user));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::testing::{FakeApi, bot, deactivated, member};
    use crate::mattermost::User;

    fn api_with_channels(count: usize) -> FakeApi {
        (0..count).fold(FakeApi::new("engineering", "team-eng"), |api, i| {
            api.with_channel(&format!("c{i}"), &format!("channel-{i}"))
        })
    }

    fn small_pages() -> Pagination {
        Pagination {
            per_page: 50,
            max_pages: 100,
        }
    }

    #[tokio::test]
    async fn resolver_returns_team_id() {
        let api = FakeApi::new("engineering", "team-eng");
        let team = resolve_team(&api, "engineering").await.expect("resolves");
        assert_eq!(team.id, "team-eng");
    }

    #[tokio::test]
    async fn resolver_failure_is_resolution_error() {
        let api = FakeApi::new("engineering", "team-eng");
        let err = resolve_team(&api, "sales").await.expect_err("unknown team");
        assert!(matches!(err, ExportError::Resolution { ref team, .. } if team == "sales"));
    }

    #[tokio::test]
    async fn lister_requests_one_page_past_the_last_full_one() {
        let api = api_with_channels(120);
        let team = resolve_team(&api, "engineering").await.expect("resolves");

        let channels = list_public_channels(&api, &team, small_pages())
            .await
            .expect("listing succeeds");

        assert_eq!(channels.len(), 120);
        assert_eq!(channels[0].name, "channel-0");
        assert_eq!(channels[119].name, "channel-119");
        let pages: Vec<String> = api
            .requests()
            .into_iter()
            .filter(|r| r.starts_with("channels:"))
            .collect();
        assert_eq!(pages, vec!["channels:0", "channels:1", "channels:2", "channels:3"]);
    }

    #[tokio::test]
    async fn lister_with_exactly_full_pages_stops_at_first_empty_page() {
        let api = api_with_channels(100);
        let team = resolve_team(&api, "engineering").await.expect("resolves");

        let channels = list_public_channels(&api, &team, small_pages())
            .await
            .expect("listing succeeds");

        assert_eq!(channels.len(), 100);
        let page_requests = api
            .requests()
            .iter()
            .filter(|r| r.starts_with("channels:"))
            .count();
        assert_eq!(page_requests, 3);
    }

    #[tokio::test]
    async fn team_without_channels_lists_nothing() {
        let api = FakeApi::new("engineering", "team-eng");
        let team = resolve_team(&api, "engineering").await.expect("resolves");

        let channels = list_public_channels(&api, &team, small_pages())
            .await
            .expect("listing succeeds");

        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn lister_failure_discards_partial_pages() {
        let api = api_with_channels(75).failing_channels_page(1);
        let team = resolve_team(&api, "engineering").await.expect("resolves");

        let err = list_public_channels(&api, &team, small_pages())
            .await
            .expect_err("second page fails");

        assert!(matches!(err, ExportError::Listing { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn lister_gives_up_when_pages_never_end() {
        let api = FakeApi::new("engineering", "team-eng").endless_channels();
        let team = resolve_team(&api, "engineering").await.expect("resolves");
        let pagination = Pagination {
            per_page: 50,
            max_pages: 5,
        };

        let err = list_public_channels(&api, &team, pagination)
            .await
            .expect_err("no empty page ever arrives");

        assert!(matches!(
            err,
            ExportError::Listing {
                source: CoreError::PageLimit { max_pages: 5, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn collector_skips_deactivated_accounts_even_with_bots() {
        let api = FakeApi::new("engineering", "team-eng")
            .with_channel("c1", "general")
            .with_members(
                "c1",
                vec![
                    member("alice"),
                    deactivated("dave"),
                    User { is_bot: true, ..deactivated("old-bot") },
                ],
            );
        let channels = vec![Channel {
            id: "c1".to_string(),
            name: "general".to_string(),
        }];

        let records = collect_members(&api, &channels, true, small_pages())
            .await
            .expect("collection succeeds");

        let usernames: Vec<&str> = records.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(usernames, vec!["alice"]);
    }

    #[tokio::test]
    async fn collector_includes_bots_only_when_asked() {
        let api = FakeApi::new("engineering", "team-eng")
            .with_members("c1", vec![member("alice"), bot("jenkins")]);
        let channels = vec![Channel {
            id: "c1".to_string(),
            name: "general".to_string(),
        }];

        let without = collect_members(&api, &channels, false, small_pages())
            .await
            .expect("collection succeeds");
        let with = collect_members(&api, &channels, true, small_pages())
            .await
            .expect("collection succeeds");

        assert_eq!(without.len(), 1);
        assert_eq!(with.len(), 2);
        assert_eq!(with[1].username, "jenkins");
    }

    #[tokio::test]
    async fn user_in_two_channels_yields_two_records() {
        let api = FakeApi::new("engineering", "team-eng")
            .with_members("c1", vec![member("alice")])
            .with_members("c2", vec![member("alice")]);
        let channels = vec![
            Channel {
                id: "c1".to_string(),
                name: "general".to_string(),
            },
            Channel {
                id: "c2".to_string(),
                name: "random".to_string(),
            },
        ];

        let records = collect_members(&api, &channels, false, small_pages())
            .await
            .expect("collection succeeds");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel_name, "general");
        assert_eq!(records[1].channel_name, "random");
        assert_eq!(records[0].user_id, records[1].user_id);
        assert_eq!(records[0].email, records[1].email);
    }

    #[tokio::test]
    async fn collector_paginates_each_channel_in_order() {
        let many: Vec<User> = (0..60).map(|i| member(&format!("user{i:02}"))).collect();
        let api = FakeApi::new("engineering", "team-eng")
            .with_members("c1", many)
            .with_members("c2", vec![member("zed")]);
        let channels = vec![
            Channel {
                id: "c1".to_string(),
                name: "big".to_string(),
            },
            Channel {
                id: "c2".to_string(),
                name: "small".to_string(),
            },
        ];

        let records = collect_members(&api, &channels, false, small_pages())
            .await
            .expect("collection succeeds");

        assert_eq!(records.len(), 61);
        assert_eq!(records[0].username, "user00");
        assert_eq!(records[59].username, "user59");
        assert_eq!(records[60].username, "zed");
        assert_eq!(
            api.requests(),
            vec![
                "members:c1:0",
                "members:c1:1",
                "members:c1:2",
                "members:c2:0",
                "members:c2:1",
            ]
        );
    }

    #[tokio::test]
    async fn collector_aborts_on_first_failing_channel() {
        let api = FakeApi::new("engineering", "team-eng")
            .with_members("c1", vec![member("alice")])
            .with_members("c3", vec![member("carol")])
            .failing_members_of("c2");
        let channels: Vec<Channel> = ["c1", "c2", "c3"]
            .iter()
            .map(|id| Channel {
                id: (*id).to_string(),
                name: format!("name-{id}"),
            })
            .collect();

        let err = collect_members(&api, &channels, false, small_pages())
            .await
            .expect_err("c2 fails");

        assert!(matches!(err, ExportError::Collection { ref channel, .. } if channel == "name-c2"));
        assert!(!api.requests().iter().any(|r| r.starts_with("members:c3")));
    }
}
