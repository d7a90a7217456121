use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Month-abbreviation translation table for one locale, keyed by the
/// lowercase English abbreviation ("jan" -> "sty"). Supplied from the
/// configuration; an empty table means no substitution.
pub type MonthTable = HashMap<String, String>;

/// Calendar parts of a publication date as the listing cards show them.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDate {
    pub time: String,
    pub day: String,
    pub month: String,
    pub year: String,
}

fn to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Splits a timestamp into the parts used by listing views. The month
/// comes out lowercase and localized through the table.
pub fn calendar_parts(timestamp: i64, months: &MonthTable) -> CalendarDate {
    let date = to_datetime(timestamp);
    let month = date.format("%b").to_string().to_lowercase();
    let month = months.get(&month).cloned().unwrap_or(month);

    CalendarDate {
        time: date.format("%Y-%m-%d %H:%M:%S").to_string(),
        day: date.format("%d").to_string(),
        month,
        year: date.format("%Y").to_string(),
    }
}

/// Renders the timestamp with a configurable chrono pattern and applies
/// the month substitution to the result. The output is lowercased first
/// so the table lookup never depends on how the pattern capitalizes
/// month names.
pub fn format_localized(timestamp: i64, pattern: &str, months: &MonthTable) -> String {
    let mut formatted = to_datetime(timestamp).format(pattern).to_string().to_lowercase();
    for (from, to) in months {
        if formatted.contains(from.as_str()) {
            formatted = formatted.replace(from.as_str(), to);
        }
    }
    formatted
}

/// RFC-822 style timestamp for feed entries. Always UTC, never
/// localized.
pub fn rfc822(timestamp: i64) -> String {
    to_datetime(timestamp).to_rfc2822()
}
