// src/data/datetime.rs

//! Clock-time parsing and the rolling "track date" used to turn in-log
//! times-of-day into full datetimes.
//!
//! Practice log lines carry only a leading `[HH:MM:SS]` and no date.
//! A [`TrackDate`] carries the calendar context: seeded from the archive
//! filename (or "today" for a plain or live log) and advanced by one day
//! whenever the time-of-day jumps backwards, which means the log crossed
//! midnight.
//!
//! The two common assumptions are that:
//! 1. log lines are in chronological order
//! 2. no single gap between consecutive lines spans a full day
//!
//! [`TrackDate`]: TrackDate

use ::chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// A datetime combined from the rolling [`TrackDate`] and an in-log
/// time-of-day. No timezone; practice logs are wall-clock local time.
pub type DateTimeRun = NaiveDateTime;
pub type DateTimeRunOpt = Option<DateTimeRun>;

/// Time-of-day extracted from a leading `[HH:MM:SS]`.
pub type ClockTime = NaiveTime;

/// `strftime` format of a [`DateTimeRun`] as stored and fingerprinted,
/// e.g. `2025-01-15 10:00:05`.
pub const DATETIME_RUN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `strptime` format of a `[HH:MM:SS]` payload.
pub const CLOCK_TIME_FORMAT: &str = "%H:%M:%S";

/// Parse a `HH:MM:SS` payload (the capture of the log-time pattern).
pub fn clock_time_parse(time_str: &str) -> Option<ClockTime> {
    NaiveTime::parse_from_str(time_str, CLOCK_TIME_FORMAT).ok()
}

/// Render a [`DateTimeRun`] in [`DATETIME_RUN_FORMAT`].
pub fn datetime_run_string(dt: &DateTimeRun) -> String {
    dt.format(DATETIME_RUN_FORMAT).to_string()
}

/// Parse a [`DATETIME_RUN_FORMAT`] string back to a [`DateTimeRun`].
/// Used by the store for session gap measurements and by import.
pub fn datetime_run_parse(s: &str) -> DateTimeRunOpt {
    NaiveDateTime::parse_from_str(s, DATETIME_RUN_FORMAT).ok()
}

/// Elapsed seconds from `start` to `end`, fractional.
pub fn seconds_between(start: &DateTimeRun, end: &DateTimeRun) -> f64 {
    (*end - *start).num_milliseconds() as f64 / 1000.0
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TrackDate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The rolling calendar context of one parsed log.
///
/// `combine` pairs a time-of-day with the current date. A time-of-day
/// strictly less than the previously combined one advances the date by one
/// day first (midnight rollover). Seeding a new date via [`set`] clears the
/// last-seen time so the first line after a seed never rolls over.
///
/// [`set`]: TrackDate#method.set
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrackDate {
    date: NaiveDate,
    last_time: Option<ClockTime>,
}

impl TrackDate {
    /// New `TrackDate` at the given calendar date.
    pub fn new(date: NaiveDate) -> TrackDate {
        TrackDate {
            date,
            last_time: None,
        }
    }

    /// New `TrackDate` at today's local date. For plain (un-dated)
    /// filenames and live streams.
    pub fn today() -> TrackDate {
        TrackDate::new(Local::now().date_naive())
    }

    /// Current calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Re-seed the calendar date and forget the last-seen time-of-day.
    pub fn set(&mut self, date: NaiveDate) {
        self.date = date;
        self.last_time = None;
    }

    /// Combine a time-of-day with the rolling date, advancing the date
    /// by one day on a backwards time jump.
    pub fn combine(&mut self, time: ClockTime) -> DateTimeRun {
        if let Some(last) = self.last_time {
            if time < last {
                // crossed midnight
                self.date = self.date.succ_opt().unwrap_or(self.date);
            }
        }
        self.last_time = Some(time);

        self.date.and_time(time)
    }
}
