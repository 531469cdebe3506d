use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::warn;

const DATE_FORMAT: &str = "%b %e, %-l:%M %p";
const TRUNCATE_AT: usize = 50;

/// Human duration, largest unit first: `3_665_000` -> "1h 1m 5s".
///
/// Sub-second durations fall back to raw milliseconds ("0ms", "250ms").
pub fn duration(ms: u64) -> String {
    let hours = ms / (1000 * 60 * 60);
    let minutes = (ms / (1000 * 60)) % 60;
    let seconds = (ms / 1000) % 60;

    let parts: Vec<String> = [(hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value != 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        format!("{ms}ms")
    } else {
        parts.join(" ")
    }
}

/// Format a service timestamp in local time.
///
/// Unparsable input yields `None` so the caller can show the field as
/// absent instead of failing.
pub fn pretty_date(timestamp: Option<&str>) -> Option<String> {
    pretty_date_in(timestamp, &Local)
}

pub fn pretty_date_in<Tz>(timestamp: Option<&str>, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let timestamp = timestamp?;
    match parse_timestamp(timestamp) {
        Some(parsed) => Some(parsed.with_timezone(tz).format(DATE_FORMAT).to_string()),
        None => {
            warn!("Unparsable timestamp: {timestamp}");
            None
        }
    }
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Shorten long text for table cells.
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= TRUNCATE_AT {
        return text.to_string();
    }
    let head: String = text.chars().take(TRUNCATE_AT).collect();
    format!("{head}...")
}
