// src/data/mod.rs

//! The `data` module is specialized data containers for run attempts.
//!
//! ## Definitions of data
//!
//! ### Attempt
//!
//! An "attempt" is one tower-climb try found in a practice log:
//!
//! * opened by an ender-pearl throw longer than the pearl threshold.
//! * closed by a `Standing Height:` line (a success) or by a
//!   death/reset/world-load line (a failure).
//!
//! A completed attempt is represented by a [`RunRecord`] and found by a
//! [`RunParser`].
//!
//! ### Track date
//!
//! Practice log lines carry only a time-of-day, `[HH:MM:SS]`. The calendar
//! date is a rolling context seeded from the archive filename (or "today")
//! and advanced across midnight; see [`TrackDate`].
//!
//! [`RunRecord`]: crate::data::runrecord::RunRecord
//! [`RunParser`]: crate::readers::runparser::RunParser
//! [`TrackDate`]: crate::data::datetime::TrackDate

pub mod datetime;
pub mod runrecord;
