//! Time related utils.
//!
//! Every signing operation captures one [`DateTime`] through [`now`] and derives
//! all of its date strings from it.

use crate::{Error, Result};
use chrono::format::{DelayedFormat, StrftimeItems};
use chrono::{SecondsFormat, TimeZone, Utc};

/// DateTime is the alias for `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

fn format(t: DateTime, fmt: &str) -> DelayedFormat<StrftimeItems<'_>> {
    t.format(fmt)
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    format(t, "%Y%m%d").to_string()
}

/// Format time into ISO8601 basic format: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    format(t, "%Y%m%dT%H%M%SZ").to_string()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    format(t, "%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Format time into RFC3339: `2022-03-13T07:20:04Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse time from RFC3339.
///
/// All offsets are converted into UTC.
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| {
            Error::unexpected("failed to parse RFC3339 time")
                .with_source(e)
                .with_context(format!("value: {s}"))
        })?
        .with_timezone(&Utc))
}

/// Parse time from seconds since the unix epoch, as returned by STS JSON responses.
pub fn parse_timestamp_secs(secs: i64) -> Result<DateTime> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        Error::unexpected("timestamp out of range").with_context(format!("value: {secs}"))
    })
}
