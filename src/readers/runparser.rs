// src/readers/runparser.rs

//! Implements a [`RunParser`], the state machine that turns a sequential
//! stream of practice-log lines into completed [`RunRecord`]s.
//!
//! A parser is either _Idle_ (no attempt in progress) or _Attempting_ (an
//! attempt buffer is open). The sole opening trigger is an ender-pearl
//! throw longer than [`PEARL_DISTANCE_MIN`]. An attempt concludes as a
//! success on a `Standing Height:` line, or as a failure on a
//! death/reset/world-load line, subject to the [`FAIL_NOISE_SECONDS`]
//! filter.
//!
//! One parser instance is driven by one caller over one file (or one live
//! stream); lines must arrive in log order. The rolling date context
//! survives across attempts within the instance; see [`TrackDate`].
//!
//! This is an _mrtlib_ structure used by the binary program _mrt_.
//!
//! [`RunRecord`]: crate::data::runrecord::RunRecord
//! [`TrackDate`]: crate::data::datetime::TrackDate

use crate::common::{Height, RunTypeName, SessionId, SplitTag, TowerName};
use crate::data::datetime::{
    datetime_run_string,
    seconds_between,
    DateTimeRun,
    DateTimeRunOpt,
    TrackDate,
};
use crate::data::runrecord::{
    explosives_total,
    FailReason,
    RunRecord,
    EXPLOSIVES_UNKNOWN,
    RUN_TYPE_UNKNOWN,
    TOWER_UNKNOWN,
};
use crate::readers::patterns;
use crate::readers::patterns::{SplitSignal, DRAGON_KILL_MARK, TIME_MARK};

use ::chrono::NaiveDate;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Pearl throws at or under this distance (blocks) never open an attempt;
/// they are ordinary mid-run or lobby throws.
pub const PEARL_DISTANCE_MIN: f64 = 10.0;

/// Failures concluding in under this many seconds are noise (spurious
/// immediate resets) and are discarded unsaved.
pub const FAIL_NOISE_SECONDS: f64 = 2.0;

/// Fields accumulated for the attempt in progress. Every field is recorded
/// opportunistically, last write wins, whether or not an attempt is open;
/// the pearl-throw trigger clears the buffer so a new attempt never
/// inherits stale fields.
#[derive(Clone, Debug, Default, PartialEq)]
struct AttemptBuffer {
    /// Timestamp of the most recent parseable line.
    timestamp: DateTimeRunOpt,
    /// `Time:` run duration.
    time_sec: Option<f64>,
    /// `Explosives:` materials label.
    explosives: Option<String>,
    /// `Tower:` structure name.
    tower: Option<TowerName>,
    /// `Type:` sub-category.
    run_type: Option<RunTypeName>,
    /// `Standing Height:`, set just before success finalization.
    height: Option<Height>,
    /// `Dragon Killed!` seen. Informational; the height line that follows
    /// it in log order is what terminates the attempt.
    dragon_killed: bool,
}

/// The practice-log run state machine. See the [module documentation].
///
/// [module documentation]: crate::readers::runparser
pub struct RunParser {
    /// Ingestion batch this parser stamps onto emitted records.
    session_id: SessionId,
    /// Rolling calendar context for in-log times-of-day.
    track_date: TrackDate,
    /// Partial fields of the attempt in progress.
    buffer: AttemptBuffer,
    /// Is an attempt buffer open?
    is_attempting: bool,
    /// Timestamp of the opening pearl throw.
    attempt_start: DateTimeRunOpt,
    /// Most recent `1st Bed Placed` elapsed seconds.
    bed_time: Option<f64>,
    /// Active `split start`/`split end` bracket label, if inside one.
    split_tag: Option<SplitTag>,
}

impl RunParser {
    /// New parser for one ingested file. The session id is the filename;
    /// the date context is seeded from the archive-name date if the
    /// filename carries one (`YYYY-M-D-<n>.log.gz`), else today.
    pub fn for_file(filename: &str) -> RunParser {
        defñ!("({:?})", filename);
        let track_date: TrackDate = match patterns::archive_filename_date(filename) {
            Some(date) => TrackDate::new(date),
            None => TrackDate::today(),
        };

        RunParser::new(filename.to_string(), track_date)
    }

    /// New long-lived parser for an open-ended live stream tagged with a
    /// stable session id. Date context starts at today.
    pub fn for_live_session(session_id: &str) -> RunParser {
        defñ!("({:?})", session_id);

        RunParser::new(session_id.to_string(), TrackDate::today())
    }

    fn new(session_id: SessionId, track_date: TrackDate) -> RunParser {
        RunParser {
            session_id,
            track_date,
            buffer: AttemptBuffer::default(),
            is_attempting: false,
            attempt_start: None,
            bed_time: None,
            split_tag: None,
        }
    }

    /// Re-seed the rolling date context. Clears the last-seen time-of-day
    /// so the next line never rolls the date over.
    pub fn set_date_context(&mut self, date: NaiveDate) {
        self.track_date.set(date);
    }

    /// The session id stamped onto emitted records.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The active split tag, if inside a `split start` bracket.
    pub fn split_tag(&self) -> Option<&str> {
        self.split_tag.as_deref()
    }

    /// Is an attempt buffer open?
    pub fn is_attempting(&self) -> bool {
        self.is_attempting
    }

    /// Consume one log line; return the completed record if this line
    /// concluded an attempt.
    ///
    /// A line without a leading `[HH:MM:SS]` is inert; the parser cannot
    /// operate without a time anchor.
    pub fn process_line(&mut self, line: &str) -> Option<RunRecord> {
        let time = patterns::log_time(line)?;
        let current_dt: DateTimeRun = self.track_date.combine(time);
        self.buffer.timestamp = Some(current_dt);

        // a split marker line updates the bracket and nothing else
        if let Some(signal) = patterns::split_signal(line) {
            match signal {
                SplitSignal::Start(name) => {
                    self.split_tag = Some(match name.is_empty() {
                        // unnamed brackets group under their start moment
                        true => format!("Session {}", datetime_run_string(&current_dt)),
                        false => name,
                    });
                    defo!("split start {:?}", self.split_tag);
                }
                SplitSignal::End => {
                    defo!("split end (was {:?})", self.split_tag);
                    self.split_tag = None;
                }
            }

            return None;
        }

        // the sole attempt-opening trigger
        if let Some(distance) = patterns::pearl_distance(line) {
            if !self.is_attempting && distance > PEARL_DISTANCE_MIN {
                defo!("pearl {} blocks at {:?}; open attempt", distance, current_dt);
                self.is_attempting = true;
                self.attempt_start = Some(current_dt);
                self.bed_time = None;
                self.buffer = AttemptBuffer {
                    timestamp: Some(current_dt),
                    ..AttemptBuffer::default()
                };
            }
        }

        // opportunistic field accumulation; last write wins
        if line.contains("1st Bed Placed") {
            if let Some(seconds) = patterns::bed_time(line) {
                self.bed_time = Some(seconds);
            }
        }
        if line.contains(TIME_MARK) {
            if let Some(seconds) = patterns::run_time(line) {
                self.buffer.time_sec = Some(seconds);
            }
        }
        if line.contains("Explosives:") {
            if let Some(label) = patterns::explosives_label(line) {
                self.buffer.explosives = Some(label);
            }
        }
        if line.contains("Tower:") {
            if let Some(name) = patterns::tower_name(line) {
                self.buffer.tower = Some(name);
            }
        }
        if line.contains("Type:") {
            if let Some(name) = patterns::run_type_name(line) {
                self.buffer.run_type = Some(name);
            }
        }

        // the only success-terminating signal
        if line.contains("Standing Height:") {
            if let Some(height) = patterns::standing_height(line) {
                self.buffer.height = Some(height);

                return Some(self.finish_success(current_dt));
            }
        }

        if patterns::is_dragon_kill(line) {
            self.buffer.dragon_killed = true;
        }

        // failure classification; `Time:` and dragon-kill lines are
        // excluded to not misclassify informational continuation lines
        if self.is_attempting
            && !line.contains(DRAGON_KILL_MARK)
            && !line.contains(TIME_MARK)
        {
            if let Some(reason) = patterns::fail_reason(line) {
                let duration: f64 = match self.attempt_start {
                    Some(start) => seconds_between(&start, &current_dt),
                    None => 0.0,
                };

                return self.finish_fail(duration, reason, current_dt);
            }
        }

        None
    }

    /// Conclude the open buffer as a success and reset to _Idle_.
    fn finish_success(&mut self, current_dt: DateTimeRun) -> RunRecord {
        defn!("at {:?}", current_dt);
        let buffer: AttemptBuffer = std::mem::take(&mut self.buffer);
        let explosives: String = buffer
            .explosives
            .unwrap_or_else(|| EXPLOSIVES_UNKNOWN.to_string());
        let total_explosives: i64 = explosives_total(&explosives);

        let record = RunRecord {
            timestamp: buffer.timestamp.unwrap_or(current_dt),
            time_sec: buffer.time_sec.unwrap_or(0.0),
            explosives,
            total_explosives,
            tower: buffer.tower.unwrap_or_else(|| TOWER_UNKNOWN.to_string()),
            run_type: buffer
                .run_type
                .unwrap_or_else(|| RUN_TYPE_UNKNOWN.to_string()),
            height: buffer.height.unwrap_or(0),
            bed_time: self.bed_time,
            is_success: true,
            fail_reason: None,
            session_id: self.session_id.clone(),
            split_tag: self.split_tag.clone(),
        };
        self.reset_state();
        defx!("success {:?} height {}", record.tower, record.height);

        record
    }

    /// Conclude the open attempt as a failure and reset to _Idle_.
    ///
    /// A duration under [`FAIL_NOISE_SECONDS`] is noise: nothing is saved
    /// and the attempt stays open, so a later real failure still records.
    fn finish_fail(
        &mut self,
        duration: f64,
        reason: FailReason,
        current_dt: DateTimeRun,
    ) -> Option<RunRecord> {
        defn!("duration {} reason {:?}", duration, reason);
        if duration < FAIL_NOISE_SECONDS {
            defx!("noise, discarded");

            return None;
        }

        let record = RunRecord {
            timestamp: current_dt,
            time_sec: (duration * 100.0).round() / 100.0,
            explosives: EXPLOSIVES_UNKNOWN.to_string(),
            total_explosives: 0,
            tower: TOWER_UNKNOWN.to_string(),
            run_type: RUN_TYPE_UNKNOWN.to_string(),
            height: 0,
            bed_time: self.bed_time,
            is_success: false,
            fail_reason: Some(reason),
            session_id: self.session_id.clone(),
            split_tag: self.split_tag.clone(),
        };
        self.reset_state();
        defx!("failure {:?}", reason);

        Some(record)
    }

    /// Back to _Idle_. The rolling date context and the split bracket are
    /// preserved across attempts; everything per-attempt is cleared.
    fn reset_state(&mut self) {
        self.is_attempting = false;
        self.attempt_start = None;
        self.bed_time = None;
        self.buffer = AttemptBuffer::default();
    }
}
