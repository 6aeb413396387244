//! Calendar days, the reference clock, and the day windows every date-scoped
//! query is built from.
//!
//! A calendar day `d` is the half-open interval `[00:00, 24:00)` of `d` in a
//! fixed reference zone. Listing and summarizing both go through
//! [`DayWindow`], so a day's list and its summary always cover the same
//! entries.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::error::{LogError, Result};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now". Production uses [`SystemClock`]; tests pin time with
/// [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[must_use]
pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse a strict `YYYY-MM-DD` string into a calendar date.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let well_formed = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(LogError::validation(format!(
            "Invalid date '{s}'. Use YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(s, DAY_FORMAT)
        .map_err(|_| LogError::validation(format!("Invalid date '{s}'. No such calendar day")))
}

/// Parse a reference zone given as `+HH:MM`, `-HH:MM`, `Z` or `UTC`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    let invalid = || LogError::validation(format!("Invalid UTC offset '{s}'. Use +HH:MM or -HH:MM"));

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let two_digits = |p: &str| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// The calendar date `clock` is on, seen from `zone`.
#[must_use]
pub fn today(clock: &dyn Clock, zone: FixedOffset) -> NaiveDate {
    clock.now().with_timezone(&zone).date_naive()
}

/// One calendar day as a half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    #[must_use]
    pub fn new(day: NaiveDate, zone: FixedOffset) -> Self {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let offset = Duration::seconds(i64::from(zone.local_minus_utc()));
        let start = Utc.from_utc_datetime(&(local_midnight - offset));
        let end = start + Duration::days(1);
        Self { day, start, end }
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.day.format(DAY_FORMAT).to_string()
    }
}
