//! Deadline arithmetic on calendar dates.
//!
//! Everything here works on `NaiveDate`, so "today" is a single calendar day
//! passed in by the caller and no wall-clock or DST effects leak in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::case::Extension;
use crate::error::CaseError;

/// Strict parse of a stored deadline. Accepts `YYYY-MM-DD`, a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` timestamp, or RFC 3339; the time part is dropped.
pub fn parse_base_deadline(raw: &str) -> Result<NaiveDate, CaseError> {
    let s = raw.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(CaseError::InvalidDate(s.to_string()))
}

/// Lenient parse used by the evaluator: a bad date resolves to `today`.
///
/// This makes a broken case look due today. Kept for compatibility with
/// stored data; the warning is the only trace of it.
pub fn resolve_base_deadline(raw: &str, today: NaiveDate) -> NaiveDate {
    match parse_base_deadline(raw) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, fallback = %today, "unparseable base deadline, using today");
            today
        }
    }
}

/// Base date plus the sum of all granted days.
pub fn effective_deadline(base: NaiveDate, extensions: &[Extension]) -> NaiveDate {
    let total = total_days_granted(extensions);
    if total == 0 {
        return base;
    }

    // Totals outside the date range saturate at NaiveDate::MAX / MIN.
    i64::try_from(total)
        .ok()
        .and_then(TimeDelta::try_days)
        .and_then(|delta| base.checked_add_signed(delta))
        .unwrap_or(if total > 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Sum of granted days, widened so store-supplied values cannot overflow.
pub fn total_days_granted(extensions: &[Extension]) -> i128 {
    extensions.iter().map(|e| i128::from(e.days_granted)).sum()
}

/// Signed whole days from `today` to `deadline`: 0 on the day itself,
/// negative once it has passed.
pub fn days_left(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

/// The local calendar day in `tz` at instant `now`.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}
