// src/tests/datetime_tests.rs

//! tests for `datetime.rs` functions

use crate::data::datetime::{
    clock_time_parse,
    datetime_run_parse,
    datetime_run_string,
    seconds_between,
    TrackDate,
};
use crate::tests::common::dt;

use ::chrono::NaiveDate;
use ::test_case::test_case;

#[test_case("10:00:00", true)]
#[test_case("23:59:59", true)]
#[test_case("00:00:00", true)]
#[test_case("24:00:00", false; "hour 24")]
#[test_case("10:00", false; "missing seconds")]
#[test_case("banana", false)]
fn test_clock_time_parse(input: &str, expect: bool) {
    assert_eq!(clock_time_parse(input).is_some(), expect);
}

#[test]
fn test_datetime_run_string_roundtrip() {
    let dt1 = dt(2025, 1, 15, 10, 0, 5);
    let s: String = datetime_run_string(&dt1);
    assert_eq!(s, "2025-01-15 10:00:05");
    assert_eq!(datetime_run_parse(&s), Some(dt1));
}

#[test]
fn test_datetime_run_parse_bad() {
    assert_eq!(datetime_run_parse("not a datetime"), None);
}

#[test]
fn test_seconds_between() {
    let start = dt(2025, 1, 15, 10, 0, 0);
    let end = dt(2025, 1, 15, 10, 0, 5);
    assert_eq!(seconds_between(&start, &end), 5.0);
}

#[test]
fn test_trackdate_same_day_no_rollover() {
    let mut track = TrackDate::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    let dt1 = track.combine(clock_time_parse("10:00:00").unwrap());
    let dt2 = track.combine(clock_time_parse("11:30:00").unwrap());
    assert_eq!(dt1, dt(2025, 1, 15, 10, 0, 0));
    assert_eq!(dt2, dt(2025, 1, 15, 11, 30, 0));
}

#[test]
fn test_trackdate_midnight_rollover() {
    // 23:59:58 then 00:00:02 must land on two consecutive calendar days
    let mut track = TrackDate::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    let dt1 = track.combine(clock_time_parse("23:59:58").unwrap());
    let dt2 = track.combine(clock_time_parse("00:00:02").unwrap());
    assert_eq!(dt1, dt(2025, 1, 15, 23, 59, 58));
    assert_eq!(dt2, dt(2025, 1, 16, 0, 0, 2));
    assert!(dt1 < dt2);
}

#[test]
fn test_trackdate_equal_time_no_rollover() {
    // equal times are not "strictly less"; stay on the same day
    let mut track = TrackDate::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    track.combine(clock_time_parse("10:00:05").unwrap());
    let dt2 = track.combine(clock_time_parse("10:00:05").unwrap());
    assert_eq!(dt2, dt(2025, 1, 15, 10, 0, 5));
}

#[test]
fn test_trackdate_set_forgets_last_time() {
    let mut track = TrackDate::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    track.combine(clock_time_parse("23:59:58").unwrap());
    track.set(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    // an earlier time right after a seed must not roll the date over
    let dt1 = track.combine(clock_time_parse("00:10:00").unwrap());
    assert_eq!(dt1, dt(2025, 2, 1, 0, 10, 0));
}

#[test]
fn test_trackdate_rollover_twice() {
    let mut track = TrackDate::new(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    track.combine(clock_time_parse("23:00:00").unwrap());
    let dt1 = track.combine(clock_time_parse("01:00:00").unwrap());
    assert_eq!(dt1, dt(2025, 2, 1, 1, 0, 0));
    track.combine(clock_time_parse("23:30:00").unwrap());
    let dt2 = track.combine(clock_time_parse("00:15:00").unwrap());
    assert_eq!(dt2, dt(2025, 2, 2, 0, 15, 0));
}
