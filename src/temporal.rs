use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RecordError, RecordResult};

static CLOCK_24H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid 24h time regex"));
static CLOCK_12H_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(am|pm)$").expect("valid 12h time regex")
});
static HOUR_MERIDIEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})\s*(am|pm)$").expect("valid hour regex"));

// Anchor date for parsing bare times with the general datetime grammar.
const ANCHOR_DATE: &str = "2000-01-01";

const ANCHORED_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M:%S%p",
];

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const HUMAN_DATE_FORMATS: [&str; 7] = [
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Canonicalize a time of day to 24-hour `HH:mm`.
///
/// Tries `H:mm`/`HH:mm`, then `H:mm AM|PM`, then a general parse of the
/// input anchored to a fixed date. Anything else is a format error.
pub fn normalize_time(input: &str) -> RecordResult<String> {
    let cleaned = input.trim();

    if let Some(caps) = CLOCK_24H_RE.captures(cleaned) {
        let hour: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let minute: u32 = caps[2].parse().unwrap_or(u32::MAX);
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            return Ok(format_clock(time));
        }
    }

    if let Some(caps) = CLOCK_12H_RE.captures(cleaned) {
        let hour: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let minute: u32 = caps[2].parse().unwrap_or(u32::MAX);
        return meridiem_to_24h(hour, minute, &caps[3])
            .map(format_clock)
            .ok_or_else(|| RecordError::format("time", input));
    }

    parse_anchored_time(cleaned)
        .map(format_clock)
        .ok_or_else(|| RecordError::format("time", input))
}

/// Canonicalize a date to an ISO-8601 UTC timestamp, reading naive inputs as UTC.
pub fn normalize_date(input: &str) -> RecordResult<String> {
    normalize_date_in(input, chrono_tz::UTC)
}

/// Canonicalize a date to an ISO-8601 UTC timestamp.
///
/// Inputs carrying an offset keep it. A date with no time, in any accepted
/// spelling, is midnight UTC. A date-time without an offset is local
/// wall-clock time in `tz`.
pub fn normalize_date_in(input: &str, tz: Tz) -> RecordResult<String> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(RecordError::format("date", input));
    }
    parse_instant(cleaned, tz)
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| RecordError::format("date", input))
}

fn parse_instant(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS.iter() {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return to_utc(naive, tz);
        }
    }
    // Bare dates are midnight UTC whatever `tz` is.
    std::iter::once("%Y-%m-%d")
        .chain(HUMAN_DATE_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

fn parse_anchored_time(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = HOUR_MERIDIEM_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        return meridiem_to_24h(hour, 0, &caps[2]);
    }
    let anchored = format!("{ANCHOR_DATE} {text}");
    ANCHORED_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&anchored, fmt).ok())
        .map(|dt| dt.time())
}

fn meridiem_to_24h(hour: u32, minute: u32, period: &str) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (period.eq_ignore_ascii_case("pm"), hour) {
        (false, 12) => 0,
        (false, h) => h,
        (true, 12) => 12,
        (true, h) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn format_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
