// src/tests/common.rs

//! Common helpers for tests.

use crate::common::Height;
use crate::data::datetime::DateTimeRun;
use crate::data::runrecord::{
    explosives_total,
    FailReason,
    RunRecord,
    EXPLOSIVES_UNKNOWN,
    RUN_TYPE_UNKNOWN,
    TOWER_UNKNOWN,
};

use ::chrono::NaiveDate;

/// shorthand `DateTimeRun` constructor
pub fn dt(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> DateTimeRun {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// a plausible success record
pub fn success_record(
    session_id: &str,
    timestamp: DateTimeRun,
    time_sec: f64,
    explosives: &str,
    tower: &str,
    run_type: &str,
    height: Height,
) -> RunRecord {
    RunRecord {
        timestamp,
        time_sec,
        explosives: explosives.to_string(),
        total_explosives: explosives_total(explosives),
        tower: tower.to_string(),
        run_type: run_type.to_string(),
        height,
        bed_time: None,
        is_success: true,
        fail_reason: None,
        session_id: session_id.to_string(),
        split_tag: None,
    }
}

/// a plausible failure record
pub fn fail_record(
    session_id: &str,
    timestamp: DateTimeRun,
    time_sec: f64,
    reason: FailReason,
) -> RunRecord {
    RunRecord {
        timestamp,
        time_sec,
        explosives: EXPLOSIVES_UNKNOWN.to_string(),
        total_explosives: 0,
        tower: TOWER_UNKNOWN.to_string(),
        run_type: RUN_TYPE_UNKNOWN.to_string(),
        height: 0,
        bed_time: None,
        is_success: false,
        fail_reason: Some(reason),
        session_id: session_id.to_string(),
        split_tag: None,
    }
}
