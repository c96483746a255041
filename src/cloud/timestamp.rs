//! Timestamp conversion

use chrono::{DateTime, SecondsFormat, Utc};

/// Format epoch seconds as RFC3339 in UTC without fractional seconds
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn format_rfc3339(epoch_secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Format epoch milliseconds as RFC3339, dropping the sub-second part
pub fn format_millis_rfc3339(epoch_millis: i64) -> Option<String> {
    format_rfc3339(epoch_millis / 1000)
}
