//! Due-date wording, computed in a fixed reference zone.
//!
//! Day arithmetic always happens on calendar dates in UTC+08:00
//! (Asia/Kuala_Lumpur, no daylight saving), whatever the local zone of the
//! machine running the client.
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// The reference zone, UTC+08:00.
pub const REFERENCE_ZONE: FixedOffset = match FixedOffset::east_opt(8 * 3600) {
    Some(zone) => zone,
    None => panic!("reference offset out of range"),
};

fn in_reference_zone(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&REFERENCE_ZONE)
}

/// Calendar date of `instant` in the reference zone.
pub fn reference_date(instant: DateTime<Utc>) -> NaiveDate {
    in_reference_zone(instant).date_naive()
}

/// Whole calendar days from today to the due date. Negative once the due date has passed.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (reference_date(due) - reference_date(now)).num_days()
}

/// "Today", "Tomorrow", or a short date such as "Jan 5, 2026".
pub fn due_label(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match days_until(due, now) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => reference_date(due).format("%b %-d, %Y").to_string(),
    }
}

/// "(Today)" or "(N days)" while the due date is not in the past.
pub fn days_badge(due: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    match days_until(due, now) {
        0 => Some("(Today)".to_string()),
        days if days > 0 => Some(format!("({days} days)")),
        _ => None,
    }
}

/// Creation time in the reference zone, e.g. "March 1, 2025, 09:30 AM".
pub fn long_timestamp(instant: DateTime<Utc>) -> String {
    in_reference_zone(instant)
        .format("%B %-d, %Y, %I:%M %p")
        .to_string()
}
