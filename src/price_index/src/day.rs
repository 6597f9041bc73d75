//! Calendar-day parsing helpers.
//!
//! Every observation is reduced to a UTC calendar day before aggregation:
//! - `"2024-03-10"` is taken as-is.
//! - RFC-3339 timestamps are converted to UTC first, then truncated:
//!   `"2024-03-10T23:30:00-05:00"` -> `2024-03-11`.
//!
//! Day keys are rendered as `YYYY-MM-DD`, so lexicographic order on keys is the
//! same as chronological order.

use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Format used for day keys.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a day string (`YYYY-MM-DD` or RFC-3339 with offset) into a UTC calendar day.
pub fn parse_day(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    if let Ok(day) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
        return Ok(day);
    }
    let ts = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad day: {s:?}"))?;
    Ok(ts.with_timezone(&Utc).date_naive())
}

/// Render a day as its normalized `YYYY-MM-DD` key.
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Midnight UTC at the start of `day`.
pub fn day_start_utc(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// `day - n` calendar days, `None` if that falls off the representable range.
pub fn days_before(day: NaiveDate, n: u64) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(n))
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}
