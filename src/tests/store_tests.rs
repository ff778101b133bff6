// src/tests/store_tests.rs

//! tests for `store.rs`, the run store and its query surface

use crate::data::runrecord::{FailReason, RunRecord};
use crate::store::{
    session_durations,
    RunStore,
    SessionKind,
    SessionSummary,
};
use crate::tests::common::{dt, fail_record, success_record};

use ::tempfile::TempDir;
use ::test_case::test_case;

#[test]
fn test_save_and_count() {
    let store = RunStore::open_in_memory().unwrap();
    let record = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    assert!(store.save_run(&record).unwrap());
    assert_eq!(store.row_count().unwrap(), 1);
}

#[test]
fn test_duplicate_fingerprint_rejected() {
    let store = RunStore::open_in_memory().unwrap();
    let record = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    assert!(store.save_run(&record).unwrap());
    assert!(!store.save_run(&record).unwrap());
    assert_eq!(store.row_count().unwrap(), 1);
}

#[test]
fn test_dedup_key_ignores_other_fields() {
    // same session+timestamp+duration but different explosives: still a
    // duplicate; the first insert wins. Documented quirk of the
    // fingerprint, not a bug.
    let store = RunStore::open_in_memory().unwrap();
    let first = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    let mut second = first.clone();
    second.explosives = "9+9".to_string();
    assert!(store.save_run(&first).unwrap());
    assert!(!store.save_run(&second).unwrap());
    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].record.explosives, "8+12");
}

#[test]
fn test_fingerprint_differs_on_duration() {
    let store = RunStore::open_in_memory().unwrap();
    let first = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    let mut second = first.clone();
    second.time_sec = 5.5;
    assert!(store.save_run(&first).unwrap());
    assert!(store.save_run(&second).unwrap());
    assert_eq!(store.row_count().unwrap(), 2);
}

#[test]
fn test_recent_ordering() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8", "Obsidian", "Blind", 100,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 11, 0, 0), 6.0, "9", "Obsidian", "Blind", 100,
        ))
        .unwrap();
    // same timestamp as the second; id breaks the tie, newest insert first
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 11, 0, 0), 7.0, "10", "Obsidian", "Blind", 100,
        ))
        .unwrap();

    let recent = store.recent(10).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].record.time_sec, 7.0);
    assert_eq!(recent[1].record.time_sec, 6.0);
    assert_eq!(recent[2].record.time_sec, 5.0);
    assert!(recent[0].id > recent[1].id);
}

#[test]
fn test_recent_limit() {
    let store = RunStore::open_in_memory().unwrap();
    for minute in 0..5 {
        store
            .save_run(&success_record(
                "a.log", dt(2025, 1, 15, 10, minute, 0), 5.0, "8", "T", "B", 100,
            ))
            .unwrap();
    }
    assert_eq!(store.recent(3).unwrap().len(), 3);
}

#[test]
fn test_stats_by_height() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8+12", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 5, 0), 7.0, "15", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 10, 0), 4.0, "30", "Cobble", "Open", 90,
        ))
        .unwrap();
    // failures never contribute to height stats
    store
        .save_run(&fail_record(
            "a.log", dt(2025, 1, 15, 10, 15, 0), 12.0, FailReason::Death,
        ))
        .unwrap();

    let stats = store.stats_by_height().unwrap();
    assert_eq!(stats.len(), 2);
    // ascending by height
    assert_eq!(stats[0].height, 90);
    assert_eq!(stats[0].count, 1);
    assert_eq!(stats[1].height, 120);
    assert_eq!(stats[1].count, 2);
    assert_eq!(stats[1].min_time, 5.0);
    assert_eq!(stats[1].avg_time, 6.0);
    assert_eq!(stats[1].min_explosives, 15);
    assert_eq!(stats[1].avg_explosives, 17.5);
}

#[test]
fn test_stats_by_tower_excludes_unknown() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    // success with the sentinel tower is excluded
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 5, 0), 6.0, "9", "Unknown", "Blind", 100,
        ))
        .unwrap();
    store
        .save_run(&fail_record(
            "a.log", dt(2025, 1, 15, 10, 10, 0), 12.0, FailReason::Reset,
        ))
        .unwrap();

    let stats = store.stats_by_tower().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].tower, "Obsidian");
    assert_eq!(stats[0].count, 1);
    assert_eq!(stats[0].min_time, 5.0);
}

#[test]
fn test_runs_by_tower_ascending() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 11, 0, 0), 6.0, "9", "Obsidian", "Blind", 100,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8", "Obsidian", "Blind", 100,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 30, 0), 4.0, "7", "Cobble", "Open", 90,
        ))
        .unwrap();

    let runs = store.runs_by_tower("Obsidian").unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs[0].record.timestamp < runs[1].record.timestamp);
}

#[test]
fn test_runs_by_height_successes_only() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8", "Obsidian", "Blind", 100,
        ))
        .unwrap();
    store
        .save_run(&fail_record(
            "a.log", dt(2025, 1, 15, 10, 5, 0), 12.0, FailReason::Death,
        ))
        .unwrap();

    let runs = store.runs_by_height(100).unwrap();
    assert_eq!(runs.len(), 1);
    // a failure's height is 0 and is_success filters it anyway
    assert_eq!(store.runs_by_height(0).unwrap().len(), 0);
}

#[test]
fn test_runs_by_session_kinds() {
    let store = RunStore::open_in_memory().unwrap();
    let mut tagged = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8", "Obsidian", "Blind", 100,
    );
    tagged.split_tag = Some("grinding".to_string());
    store.save_run(&tagged).unwrap();
    store
        .save_run(&success_record(
            "b.log", dt(2025, 1, 15, 11, 0, 0), 6.0, "9", "Cobble", "Open", 90,
        ))
        .unwrap();

    let by_file = store.runs_by_session("a.log", SessionKind::File).unwrap();
    assert_eq!(by_file.len(), 1);
    assert_eq!(by_file[0].record.tower, "Obsidian");
    let by_split = store
        .runs_by_session("grinding", SessionKind::Split)
        .unwrap();
    assert_eq!(by_split.len(), 1);
    assert_eq!(by_split[0].record.session_id, "a.log");
}

#[test]
fn test_personal_bests_per_tower_type_pair() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 0), 5.0, "8+12", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 5, 0), 6.0, "15", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 10, 0), 7.0, "30", "Obsidian", "Open", 120,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 15, 0), 8.0, "40", "Unknown", "Blind", 100,
        ))
        .unwrap();

    let mut pbs = store.personal_bests().unwrap();
    pbs.sort_by(|a, b| (a.tower.clone(), a.run_type.clone())
        .cmp(&(b.tower.clone(), b.run_type.clone())));
    assert_eq!(pbs.len(), 2);
    assert_eq!(pbs[0].run_type, "Blind");
    assert_eq!(pbs[0].best_explosives, 15);
    assert_eq!(pbs[1].run_type, "Open");
    assert_eq!(pbs[1].best_explosives, 30);
}

#[test]
fn test_session_durations_empty() {
    assert_eq!(session_durations(&[], 1800.0), (0, 0));
}

#[test]
fn test_session_durations_single_run() {
    let runs = [(dt(2025, 1, 15, 10, 0, 0), 60.0)];
    assert_eq!(session_durations(&runs, 1800.0), (60, 60));
}

#[test]
fn test_session_durations_chunks_on_gap() {
    let runs = [
        (dt(2025, 1, 15, 10, 0, 0), 60.0),
        // 29 minutes after the first run ends: same chunk
        (dt(2025, 1, 15, 10, 30, 0), 60.0),
        // two hours later: new chunk
        (dt(2025, 1, 15, 12, 31, 0), 60.0),
    ];
    let (duration, play_time) = session_durations(&runs, 1800.0);
    // chunk one spans 10:00:00..10:31:00, chunk two spans one minute
    assert_eq!(duration, 1860 + 60);
    assert_eq!(play_time, 180);
}

#[test]
fn test_session_durations_unsorted_input() {
    let runs = [
        (dt(2025, 1, 15, 10, 30, 0), 60.0),
        (dt(2025, 1, 15, 10, 0, 0), 60.0),
    ];
    assert_eq!(session_durations(&runs, 1800.0), (1860, 120));
}

#[test]
fn test_session_index_files_and_splits() {
    let store = RunStore::open_in_memory().unwrap();
    let mut tagged = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    tagged.split_tag = Some("grinding".to_string());
    store.save_run(&tagged).unwrap();
    store
        .save_run(&fail_record(
            "a.log", dt(2025, 1, 15, 10, 30, 0), 30.0, FailReason::Death,
        ))
        .unwrap();
    store
        .save_run(&success_record(
            "b.log", dt(2025, 1, 16, 9, 0, 0), 6.0, "15", "Cobble", "Open", 90,
        ))
        .unwrap();

    let index = store.session_index().unwrap();
    // two file sessions plus one split group
    assert_eq!(index.len(), 3);
    // newest-starting first
    assert_eq!(index[0].id, "b.log");
    assert_eq!(index[0].kind, SessionKind::File);

    let a: &SessionSummary = index.iter().find(|s| s.id == "a.log").unwrap();
    assert_eq!(a.kind, SessionKind::File);
    assert_eq!(a.count, 2);
    assert_eq!(a.success_count, 1);
    assert_eq!(a.best_time, Some(5.0));
    assert_eq!(a.best_explosives, Some(20));
    assert_eq!(a.start, dt(2025, 1, 15, 10, 0, 5));
    assert_eq!(a.end, dt(2025, 1, 15, 10, 30, 0));
    // 10:00:05 .. 10:30:30 in one chunk
    assert_eq!(a.duration_sec, 1825);
    assert_eq!(a.play_time_sec, 35);

    let split: &SessionSummary = index.iter().find(|s| s.id == "grinding").unwrap();
    assert_eq!(split.kind, SessionKind::Split);
    assert_eq!(split.count, 1);
    assert_eq!(split.success_count, 1);
}

#[test]
fn test_session_index_excludes_successless_splits() {
    let store = RunStore::open_in_memory().unwrap();
    let mut record = fail_record(
        "a.log", dt(2025, 1, 15, 10, 0, 0), 12.0, FailReason::Death,
    );
    record.split_tag = Some("warmup".to_string());
    store.save_run(&record).unwrap();

    let index = store.session_index().unwrap();
    // the file session remains; the successless split does not
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].kind, SessionKind::File);
}

#[test]
fn test_export_import_roundtrip_idempotent() {
    let store = RunStore::open_in_memory().unwrap();
    let mut tagged = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8+12", "Obsidian", "Blind", 120,
    );
    tagged.bed_time = Some(2.35);
    tagged.split_tag = Some("grinding".to_string());
    store.save_run(&tagged).unwrap();
    store
        .save_run(&fail_record(
            "a.log", dt(2025, 1, 15, 10, 30, 0), 30.0, FailReason::WorldLoad,
        ))
        .unwrap();

    let json: String = store.export_json().unwrap();

    let restored = RunStore::open_in_memory().unwrap();
    assert_eq!(restored.import_json(&json).unwrap(), 2);
    // importing the same backup again inserts nothing
    assert_eq!(restored.import_json(&json).unwrap(), 0);
    assert_eq!(restored.row_count().unwrap(), 2);

    let runs = restored.recent(10).unwrap();
    let success = runs.iter().find(|r| r.record.is_success).unwrap();
    assert_eq!(success.record, tagged);
    let failure = runs.iter().find(|r| !r.record.is_success).unwrap();
    assert_eq!(failure.record.fail_reason, Some(FailReason::WorldLoad));
}

#[test]
fn test_import_legacy_field_names() {
    let json = r#"[{
        "timestamp": "2025-01-15 10:00:05",
        "time": 5.0,
        "expl": "8+12",
        "tower": "Obsidian",
        "run_type": "Blind",
        "height": 120,
        "is_success": 1,
        "session_id": "old-backup.log"
    }]"#;
    let store = RunStore::open_in_memory().unwrap();
    assert_eq!(store.import_json(json).unwrap(), 1);

    let record: RunRecord = store.recent(1).unwrap().remove(0).record;
    assert_eq!(record.time_sec, 5.0);
    assert_eq!(record.explosives, "8+12");
    // total_explosives is recomputed, never trusted from the document
    assert_eq!(record.total_explosives, 20);
    assert_eq!(record.run_type, "Blind");
    assert!(record.is_success);
}

#[test]
fn test_import_fills_missing_fields_with_defaults() {
    let json = r#"[{"timestamp": "2025-01-15 10:00:05", "time_sec": 3.5}]"#;
    let store = RunStore::open_in_memory().unwrap();
    assert_eq!(store.import_json(json).unwrap(), 1);

    let record: RunRecord = store.recent(1).unwrap().remove(0).record;
    assert_eq!(record.tower, "Unknown");
    assert_eq!(record.run_type, "Unknown");
    assert_eq!(record.explosives, "?");
    assert_eq!(record.height, 0);
    assert!(!record.is_success);
}

#[test]
fn test_import_rejects_malformed_json() {
    let store = RunStore::open_in_memory().unwrap();
    assert!(store.import_json("this is not json").is_err());
}

#[test_case("8+12", 20)]
#[test_case("15", 15)]
#[test_case("?", 0)]
#[test_case("abc", 0)]
#[test_case("8+abc", 0)]
#[test_case("1+2+3", 6)]
fn test_total_explosives_recomputed_on_save(label: &str, expect: i64) {
    let store = RunStore::open_in_memory().unwrap();
    let mut record = success_record(
        "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, label, "Obsidian", "Blind", 120,
    );
    // poison the derived column; save must recompute it
    record.total_explosives = 9999;
    store.save_run(&record).unwrap();
    assert_eq!(store.recent(1).unwrap()[0].record.total_explosives, expect);
}

#[test]
fn test_clear() {
    let store = RunStore::open_in_memory().unwrap();
    store
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8", "Obsidian", "Blind", 120,
        ))
        .unwrap();
    store.clear().unwrap();
    assert_eq!(store.row_count().unwrap(), 0);
}

#[test]
fn test_open_on_disk_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runs.db");
    {
        let store = RunStore::open(&path).unwrap();
        store
            .save_run(&success_record(
                "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8", "Obsidian", "Blind", 120,
            ))
            .unwrap();
    }
    let reopened = RunStore::open(&path).unwrap();
    assert_eq!(reopened.row_count().unwrap(), 1);
    // schema creation is idempotent and the duplicate is still rejected
    assert!(!reopened
        .save_run(&success_record(
            "a.log", dt(2025, 1, 15, 10, 0, 5), 5.0, "8", "Obsidian", "Blind", 120,
        ))
        .unwrap());
}
