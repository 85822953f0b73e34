//! Event timestamp handling.
//!
//! Tweets carry `created_at` in the classic RFC-822-with-weekday wire form,
//! e.g. `Tue Oct 18 07:01:50 +0000 2016`. The destination tables expect
//! `2016-10-18 07:01:50` in UTC. Reformatting is best-effort: a value that
//! does not match the wire form is left for the caller to pass through
//! unchanged.

use chrono::{DateTime, Utc};

/// Wire format of the `created_at` field on incoming events.
pub const EVENT_TS_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Timestamp format expected by the destination tables (UTC).
pub const TABLE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reformat an event timestamp into the table format.
///
/// Returns `None` when the input does not match [`EVENT_TS_FORMAT`]; the
/// already-reformatted table form does not match it, which is what keeps
/// repeated normalization stable.
///
/// # Examples
///
/// ```
/// use common::time::reformat_event_timestamp;
///
/// assert_eq!(
///     reformat_event_timestamp("Tue Oct 18 07:01:50 +0000 2016").as_deref(),
///     Some("2016-10-18 07:01:50")
/// );
/// assert_eq!(reformat_event_timestamp("not-a-date"), None);
/// ```
pub fn reformat_event_timestamp(value: &str) -> Option<String> {
    let parsed = DateTime::parse_from_str(value, EVENT_TS_FORMAT).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .format(TABLE_TS_FORMAT)
            .to_string(),
    )
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// Tests
// =============================================================================
