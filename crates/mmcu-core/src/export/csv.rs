//! CSV serializer: a fixed header followed by one row per record.

use std::borrow::Cow;
use std::io::Write;

use crate::Result;
use crate::export::UserRecord;

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 7] = [
    "ChannelName",
    "UserID",
    "Username",
    "Email",
    "FirstName",
    "LastName",
    "Nickname",
];

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Quote a field if it contains the delimiter, a quote or a line break, or
/// starts with whitespace. Embedded quotes are doubled.
fn escape_field(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.contains([DELIMITER, QUOTE, '\r', '\n'])
        || value.starts_with([' ', '\t']);
    if needs_quotes {
        Cow::Owned(format!("{QUOTE}{}{QUOTE}", value.replace(QUOTE, "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn write_row<W: Write + ?Sized>(writer: &mut W, fields: &[&str]) -> Result<()> {
    let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
    writeln!(writer, "{}", line.join(","))?;
    Ok(())
}

/// Write the header and every record, in input order.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn write_csv<W: Write + ?Sized>(records: &[UserRecord], writer: &mut W) -> Result<()> {
    write_row(writer, &CSV_HEADER)?;
    for record in records {
        write_row(
            writer,
            &[
                record.channel_name.as_str(),
                record.user_id.as_str(),
                record.username.as_str(),
                record.email.as_str(),
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.nickname.as_str(),
            ],
        )?;
    }
    Ok(())
}
