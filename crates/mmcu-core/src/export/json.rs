//! JSON serializer: records grouped by channel name.
//!
//! ```json
//! {
//!   "Channels": [
//!     { "Channel": { "ChannelName": "general", "Users": [ { "ChannelName": "general", ... } ] } }
//!   ]
//! }
//! ```
//!
//! Groups appear in the order their channel name is first seen in the input,
//! and users keep their input order within a group.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::export::UserRecord;
use crate::{CoreError, Result};

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    #[serde(rename = "Channels")]
    channels: Vec<JsonChannel<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonChannel<'a> {
    #[serde(rename = "Channel")]
    channel: ChannelWithUsers<'a>,
}

/// The users of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelWithUsers<'a> {
    /// Grouping key.
    #[serde(rename = "ChannelName")]
    pub channel_name: &'a str,
    /// Records whose channel name equals `channel_name`, in input order.
    #[serde(rename = "Users")]
    pub users: Vec<&'a UserRecord>,
}

/// Group records by channel name, preserving first-seen order.
#[must_use]
pub fn group_by_channel(records: &[UserRecord]) -> Vec<ChannelWithUsers<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ChannelWithUsers<'_>> = Vec::new();

    for record in records {
        let slot = *index
            .entry(record.channel_name.as_str())
            .or_insert_with(|| {
                groups.push(ChannelWithUsers {
                    channel_name: &record.channel_name,
                    users: Vec::new(),
                });
                groups.len() - 1
            });
        groups[slot].users.push(record);
    }

    groups
}

/// Write the grouped document, pretty-printed with two-space indentation and
/// a trailing newline.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_json<W: Write + ?Sized>(records: &[UserRecord], writer: &mut W) -> Result<()> {
    let output = JsonOutput {
        channels: group_by_channel(records)
            .into_iter()
            .map(|channel| JsonChannel { channel })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *writer, &output)
        .map_err(|e| CoreError::Serialization(format!("encoding JSON: {e}")))?;
    writeln!(writer)?;
    Ok(())
}
