// src/readers/patterns.rs

//! The fixed table of line-recognition rules for practice logs.
//!
//! Each signal is an independent regular-expression test over one line of
//! log text; a line may carry several signals. Extraction is pure; no
//! state, no side effects. Unmatched lines carry no signal.
//!
//! The game's log format is externally fixed, so the patterns are a closed
//! set compiled once into statics.

use crate::common::Height;
use crate::data::datetime::{clock_time_parse, ClockTime};
use crate::data::runrecord::FailReason;

use ::chrono::NaiveDate;
use ::lazy_static::lazy_static;
use ::regex::Regex;

lazy_static! {
    /// Leading `[HH:MM:SS]` of every parseable line.
    static ref REGEX_LOG_TIME: Regex = Regex::new(r"^\[(\d{2}:\d{2}:\d{2})\]").unwrap();
    /// `<float>s 1st Bed Placed` elapsed-seconds milestone.
    static ref REGEX_BED: Regex = Regex::new(r"(\d+\.\d+)s 1st Bed Placed").unwrap();
    /// `Pearled to <target> (<float> Blocks)` throw distance.
    static ref REGEX_PEARL: Regex = Regex::new(r"Pearled to .*? \((\d+\.\d+) Blocks\)").unwrap();
    /// `Time: <float>s` run duration.
    static ref REGEX_TIME: Regex = Regex::new(r"Time: (\d+\.\d+)s").unwrap();
    /// `Explosives: <text>` materials label.
    static ref REGEX_EXPLOSIVES: Regex = Regex::new(r"Explosives: (.+)").unwrap();
    /// `Tower: <text>` structure name.
    static ref REGEX_TOWER: Regex = Regex::new(r"Tower: (.+)").unwrap();
    /// `Type: <text>` run sub-category.
    static ref REGEX_TYPE: Regex = Regex::new(r"Type: (.+)").unwrap();
    /// `Standing Height: <int>`, the success-terminating signal.
    static ref REGEX_HEIGHT: Regex = Regex::new(r"Standing Height: (\d+)").unwrap();
    /// `Loaded <n> advancements`, a world (re)load.
    static ref REGEX_ADVANCEMENT_RESET: Regex = Regex::new(r"Loaded \d+ advancements").unwrap();
    /// The death messages the game emits for a failed climb.
    static ref REGEX_DEATH: Regex = Regex::new(
        r"was slain by|was killed by|fell from a high place|hit the ground too hard"
    ).unwrap();
    /// `Saving and pausing game`, a manual quit-to-menu.
    static ref REGEX_MANUAL_RESET: Regex = Regex::new(r"Saving and pausing game").unwrap();
    /// Date prefix of a rotated archive name, `YYYY-M-D-<n>.log.gz`.
    static ref REGEX_GZ_FILENAME: Regex =
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})-\d+\.log\.gz").unwrap();
    /// Chat-triggered `split start <name>` marker; the name may be empty.
    static ref REGEX_SPLIT_START: Regex =
        Regex::new(r"(?i)\[CHAT\].*?split start\s*(.*)").unwrap();
    /// Chat-triggered `split end` marker.
    static ref REGEX_SPLIT_END: Regex = Regex::new(r"(?i)\[CHAT\].*?split end").unwrap();
}

/// Substring the dragon-kill marker line carries.
pub const DRAGON_KILL_MARK: &str = "Dragon Killed!";
/// Substring of a run-duration line, also the failure-classification
/// exclusion mark.
pub const TIME_MARK: &str = "Time:";

/// A chat-triggered split marker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SplitSignal {
    /// `split start <name>`; the captured name is trimmed and may be empty.
    Start(String),
    /// `split end`.
    End,
}

/// First capture of `re` in `line`, parsed as `T`.
fn capture1_parse<T: std::str::FromStr>(
    re: &Regex,
    line: &str,
) -> Option<T> {
    re.captures(line)?.get(1)?.as_str().parse::<T>().ok()
}

/// Time-of-day of the leading `[HH:MM:SS]`, or `None` for a line without a
/// time anchor (such lines are inert to the parser).
pub fn log_time(line: &str) -> Option<ClockTime> {
    let caps = REGEX_LOG_TIME.captures(line)?;

    clock_time_parse(caps.get(1)?.as_str())
}

/// Distance in blocks of a pearl-throw line.
pub fn pearl_distance(line: &str) -> Option<f64> {
    capture1_parse::<f64>(&REGEX_PEARL, line)
}

/// Elapsed seconds of a `1st Bed Placed` milestone line.
pub fn bed_time(line: &str) -> Option<f64> {
    capture1_parse::<f64>(&REGEX_BED, line)
}

/// Run duration of a `Time:` line.
pub fn run_time(line: &str) -> Option<f64> {
    capture1_parse::<f64>(&REGEX_TIME, line)
}

/// Trimmed materials label of an `Explosives:` line.
pub fn explosives_label(line: &str) -> Option<String> {
    Some(REGEX_EXPLOSIVES.captures(line)?.get(1)?.as_str().trim().to_string())
}

/// Trimmed structure name of a `Tower:` line.
pub fn tower_name(line: &str) -> Option<String> {
    Some(REGEX_TOWER.captures(line)?.get(1)?.as_str().trim().to_string())
}

/// Trimmed sub-category of a `Type:` line.
pub fn run_type_name(line: &str) -> Option<String> {
    Some(REGEX_TYPE.captures(line)?.get(1)?.as_str().trim().to_string())
}

/// Height of a `Standing Height:` line.
pub fn standing_height(line: &str) -> Option<Height> {
    capture1_parse::<Height>(&REGEX_HEIGHT, line)
}

/// Does the line carry the dragon-kill marker?
pub fn is_dragon_kill(line: &str) -> bool {
    line.contains(DRAGON_KILL_MARK)
}

/// Classify a line as a failure signal.
///
/// Priority order when a line could match several patterns:
/// `Death` then `Reset` then `WorldLoad`; first match wins.
pub fn fail_reason(line: &str) -> Option<FailReason> {
    if REGEX_DEATH.is_match(line) {
        return Some(FailReason::Death);
    }
    if REGEX_MANUAL_RESET.is_match(line) {
        return Some(FailReason::Reset);
    }
    if REGEX_ADVANCEMENT_RESET.is_match(line) {
        return Some(FailReason::WorldLoad);
    }

    None
}

/// Classify a chat line as a split marker. `split start` is checked before
/// `split end`.
pub fn split_signal(line: &str) -> Option<SplitSignal> {
    if let Some(caps) = REGEX_SPLIT_START.captures(line) {
        let name: String = caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        return Some(SplitSignal::Start(name));
    }
    if REGEX_SPLIT_END.is_match(line) {
        return Some(SplitSignal::End);
    }

    None
}

/// Calendar date embedded in a rotated archive filename,
/// `YYYY-M-D-<n>.log.gz`. `None` for any other filename shape.
pub fn archive_filename_date(filename: &str) -> Option<NaiveDate> {
    let caps = REGEX_GZ_FILENAME.captures(filename)?;
    let year: i32 = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse::<u32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}
