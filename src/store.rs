// src/store.rs

//! The `store` module is the relational table of [`RunRecord`]s with
//! duplicate-safe insertion and the fixed aggregate/query surface the
//! analytics views consume.
//!
//! A [`RunStore`] wraps one rusqlite [`Connection`], explicitly constructed
//! and passed to (or owned by) the ingestion pipeline; there is no global
//! connection. The `fingerprint` column's `UNIQUE` constraint is the sole
//! duplicate-prevention mechanism: [`save_run`] is an `INSERT OR IGNORE`,
//! so the check-then-insert executes as one statement and re-ingesting a
//! file never creates duplicate rows.
//!
//! [`RunRecord`]: crate::data::runrecord::RunRecord
//! [`Connection`]: rusqlite::Connection
//! [`save_run`]: RunStore#method.save_run

use std::io::{Error, ErrorKind};
use std::path::Path;

use crate::common::{Count, Height, RowId, SessionId, TowerName};
use crate::data::datetime::{
    datetime_run_parse,
    datetime_run_string,
    DateTimeRun,
};
use crate::data::runrecord::{
    explosives_total,
    ExportRecord,
    FailReason,
    RunRecord,
    TOWER_UNKNOWN,
};

use ::chrono::NaiveDateTime;
use ::rusqlite::{params, Connection, Result, Row};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Runs of one session separated by a pause longer than this are counted
/// as separate active chunks by the session duration estimate.
pub const SESSION_GAP_LIMIT_MINUTES: i64 = 30;

/// Explicit column list; `SELECT *` would couple row mapping to schema
/// column order.
const COLUMNS: &str = "id, timestamp, time_sec, explosives, total_explosives, \
     tower, type, height, bed_time, is_success, fail_reason, \
     session_id, split_tag";

/// A stored record and its store-assigned sequence id.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRun {
    pub id: RowId,
    pub record: RunRecord,
}

/// What a session identifier names: one ingested file, or one split-tag
/// group.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionKind {
    File,
    Split,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::File => "file",
            SessionKind::Split => "split",
        }
    }
}

/// Per-height aggregate over successful records.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightStats {
    pub height: Height,
    pub count: Count,
    pub min_time: f64,
    pub avg_time: f64,
    pub min_explosives: i64,
    pub avg_explosives: f64,
}

/// Per-tower aggregate over successful records (excluding the `Unknown`
/// sentinel).
#[derive(Clone, Debug, PartialEq)]
pub struct TowerStats {
    pub tower: TowerName,
    pub min_time: f64,
    pub avg_time: f64,
    pub min_explosives: i64,
    pub avg_explosives: f64,
    pub count: Count,
}

/// Minimum total-explosives among successes for one (tower, run type)
/// pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonalBest {
    pub tower: TowerName,
    pub run_type: String,
    pub best_explosives: i64,
}

/// One row of the session index: summary of one ingested file or one
/// split-tag group.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub kind: SessionKind,
    /// Earliest record timestamp.
    pub start: DateTimeRun,
    /// Latest record timestamp.
    pub end: DateTimeRun,
    pub count: Count,
    pub success_count: Count,
    /// Best/average success duration; `None` when the session has no
    /// successes (possible for `File` sessions).
    pub best_time: Option<f64>,
    pub avg_time: Option<f64>,
    pub best_explosives: Option<i64>,
    pub avg_explosives: Option<f64>,
    /// Estimated active wall-clock seconds; see [`session_durations`].
    pub duration_sec: i64,
    /// Plain sum of run durations, seconds.
    pub play_time_sec: i64,
}

/// Estimate active time for one session's runs.
///
/// `runs` are (conclusion timestamp, duration seconds) pairs in any order.
/// Runs are grouped into wall-clock chunks; a gap between one run's end
/// and the next run's start longer than `gap_limit_secs` starts a new
/// chunk. Returns `(duration_sec, play_time_sec)`: summed chunk spans, and
/// the plain sum of durations.
pub fn session_durations(
    runs: &[(DateTimeRun, f64)],
    gap_limit_secs: f64,
) -> (i64, i64) {
    if runs.is_empty() {
        return (0, 0);
    }
    let mut sorted: Vec<&(DateTimeRun, f64)> = runs.iter().collect();
    sorted.sort_by_key(|(dt, _)| *dt);

    let epoch_secs = |dt: &DateTimeRun| -> f64 { dt.and_utc().timestamp() as f64 };

    let mut play_time: f64 = 0.0;
    let mut total: f64 = 0.0;
    let mut chunk_start: f64 = epoch_secs(&sorted[0].0);
    let mut chunk_end: f64 = chunk_start + sorted[0].1;
    play_time += sorted[0].1;

    for (dt, duration) in sorted.iter().skip(1) {
        play_time += duration;
        let run_start: f64 = epoch_secs(dt);
        let run_end: f64 = run_start + duration;
        let gap: f64 = run_start - chunk_end;
        if gap > gap_limit_secs {
            total += chunk_end - chunk_start;
            chunk_start = run_start;
            chunk_end = run_end;
        } else if run_end > chunk_end {
            chunk_end = run_end;
        }
    }
    total += chunk_end - chunk_start;

    (total.floor() as i64, play_time.floor() as i64)
}

/// wrap a `rusqlite::Error` for an `std::io::Result` signature
fn err_from_sql(err: rusqlite::Error) -> Error {
    Error::new(ErrorKind::Other, format!("sqlite error: {}", err))
}

/// wrap a `serde_json::Error` for an `std::io::Result` signature
fn err_from_json(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::InvalidData, format!("json error: {}", err))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RunStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The run-record store. See the [module documentation].
///
/// [module documentation]: crate::store
pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    /// Open (or create) the store database at `path`.
    pub fn open(path: &Path) -> Result<RunStore> {
        defñ!("({:?})", path);
        let conn: Connection = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        RunStore::init_schema(&conn)?;

        Ok(RunStore { conn })
    }

    /// Open an in-memory store. Used by tests and by hosts that persist
    /// the table elsewhere.
    pub fn open_in_memory() -> Result<RunStore> {
        defñ!();
        let conn: Connection = Connection::open_in_memory()?;
        RunStore::init_schema(&conn)?;

        Ok(RunStore { conn })
    }

    /// Create the `attempts` table and indexes. Idempotent.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS attempts (
                id               INTEGER PRIMARY KEY,
                timestamp        TEXT NOT NULL,
                time_sec         REAL NOT NULL,
                explosives       TEXT NOT NULL,
                total_explosives INTEGER NOT NULL,
                tower            TEXT NOT NULL,
                type             TEXT NOT NULL,
                height           INTEGER NOT NULL,
                bed_time         REAL,
                is_success       INTEGER NOT NULL,
                fail_reason      TEXT,
                session_id       TEXT,
                split_tag        TEXT,
                fingerprint      TEXT UNIQUE
            );

            CREATE INDEX IF NOT EXISTS idx_attempts_success_height
                ON attempts(is_success, height);
            CREATE INDEX IF NOT EXISTS idx_attempts_pb
                ON attempts(tower, type, total_explosives);",
        )
    }

    /// Insert one record; `Ok(false)` means a record with the same
    /// fingerprint already exists and nothing was inserted. Never an error
    /// for a duplicate.
    ///
    /// `total_explosives` is recomputed from the label here so the stored
    /// column always satisfies the derivation invariant.
    pub fn save_run(&self, record: &RunRecord) -> Result<bool> {
        let fingerprint: String = record.fingerprint();
        defñ!("fingerprint {:?}", fingerprint);
        let total_explosives: i64 = explosives_total(&record.explosives);
        let session_id: Option<&str> = match record.session_id.is_empty() {
            true => None,
            false => Some(record.session_id.as_str()),
        };

        let changed: usize = self.conn.execute(
            "INSERT OR IGNORE INTO attempts (
                timestamp, time_sec, explosives, total_explosives,
                tower, type, height, bed_time,
                is_success, fail_reason, session_id, split_tag, fingerprint
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                datetime_run_string(&record.timestamp),
                record.time_sec,
                record.explosives,
                total_explosives,
                record.tower,
                record.run_type,
                record.height,
                record.bed_time,
                record.is_success as i64,
                record.fail_reason.map(|r| r.as_str()),
                session_id,
                record.split_tag,
                fingerprint,
            ],
        )?;

        Ok(changed == 1)
    }

    /// Total stored records.
    pub fn row_count(&self) -> Result<Count> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM attempts", [], |row| row.get(0))?;

        Ok(count as Count)
    }

    /// Bulk clear; removes every record.
    pub fn clear(&self) -> Result<()> {
        defñ!();
        self.conn.execute("DELETE FROM attempts", [])?;

        Ok(())
    }

    /// Most recent `limit` records, newest first (id breaks timestamp
    /// ties).
    pub fn recent(&self, limit: u32) -> Result<Vec<StoredRun>> {
        self.query_runs(
            &format!(
                "SELECT {} FROM attempts ORDER BY timestamp DESC, id DESC LIMIT {}",
                COLUMNS, limit
            ),
            params![],
        )
    }

    /// All records for one tower, oldest first.
    pub fn runs_by_tower(&self, tower: &str) -> Result<Vec<StoredRun>> {
        self.query_runs(
            &format!(
                "SELECT {} FROM attempts WHERE tower = ?1 ORDER BY timestamp ASC",
                COLUMNS
            ),
            params![tower],
        )
    }

    /// All successful records at one standing height, oldest first.
    pub fn runs_by_height(&self, height: Height) -> Result<Vec<StoredRun>> {
        self.query_runs(
            &format!(
                "SELECT {} FROM attempts WHERE height = ?1 AND is_success = 1 \
                 ORDER BY timestamp ASC",
                COLUMNS
            ),
            params![height],
        )
    }

    /// All records of one session (a file's ingestion batch, or a
    /// split-tag group), newest first.
    pub fn runs_by_session(
        &self,
        id: &str,
        kind: SessionKind,
    ) -> Result<Vec<StoredRun>> {
        let column: &str = match kind {
            SessionKind::File => "session_id",
            SessionKind::Split => "split_tag",
        };

        self.query_runs(
            &format!(
                "SELECT {} FROM attempts WHERE {} = ?1 ORDER BY timestamp DESC",
                COLUMNS, column
            ),
            params![id],
        )
    }

    /// Aggregates per distinct standing height among successful records.
    pub fn stats_by_height(&self) -> Result<Vec<HeightStats>> {
        let mut statement = self.conn.prepare(
            "SELECT height, COUNT(*), MIN(time_sec), AVG(time_sec),
                    MIN(total_explosives), AVG(total_explosives)
             FROM attempts
             WHERE is_success = 1 AND height > 0
             GROUP BY height
             ORDER BY height ASC",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(HeightStats {
                height: row.get(0)?,
                count: row.get::<_, i64>(1)? as Count,
                min_time: row.get(2)?,
                avg_time: row.get(3)?,
                min_explosives: row.get(4)?,
                avg_explosives: row.get(5)?,
            })
        })?;

        rows.collect()
    }

    /// Aggregates per tower among successful records, excluding the
    /// `Unknown` sentinel, most-attempted tower first.
    pub fn stats_by_tower(&self) -> Result<Vec<TowerStats>> {
        let mut statement = self.conn.prepare(
            "SELECT tower, MIN(time_sec), AVG(time_sec),
                    MIN(total_explosives), AVG(total_explosives), COUNT(*)
             FROM attempts
             WHERE is_success = 1 AND tower != ?1
             GROUP BY tower
             ORDER BY COUNT(*) DESC",
        )?;
        let rows = statement.query_map(params![TOWER_UNKNOWN], |row| {
            Ok(TowerStats {
                tower: row.get(0)?,
                min_time: row.get(1)?,
                avg_time: row.get(2)?,
                min_explosives: row.get(3)?,
                avg_explosives: row.get(4)?,
                count: row.get::<_, i64>(5)? as Count,
            })
        })?;

        rows.collect()
    }

    /// Minimum total-explosives per (tower, run type) pair among
    /// successful non-`Unknown`-tower records.
    pub fn personal_bests(&self) -> Result<Vec<PersonalBest>> {
        let mut statement = self.conn.prepare(
            "SELECT tower, type, MIN(total_explosives)
             FROM attempts
             WHERE is_success = 1 AND tower != ?1
             GROUP BY tower, type",
        )?;
        let rows = statement.query_map(params![TOWER_UNKNOWN], |row| {
            Ok(PersonalBest {
                tower: row.get(0)?,
                run_type: row.get(1)?,
                best_explosives: row.get(2)?,
            })
        })?;

        rows.collect()
    }

    /// The session index: one summary per distinct session id (kind
    /// `File`) plus one per distinct split tag with at least one success
    /// (kind `Split`), merged and sorted newest-starting first.
    pub fn session_index(&self) -> Result<Vec<SessionSummary>> {
        defn!();
        let mut summaries: Vec<SessionSummary> =
            self.session_summaries("session_id", SessionKind::File, false)?;
        summaries.extend(self.session_summaries(
            "split_tag",
            SessionKind::Split,
            true,
        )?);
        summaries.sort_by(|a, b| b.start.cmp(&a.start));
        defx!("{} summaries", summaries.len());

        Ok(summaries)
    }

    /// Grouped summaries over one session column. `successes_only`
    /// excludes groups with zero successes (split tags are only listed
    /// once something succeeded under them).
    fn session_summaries(
        &self,
        column: &str,
        kind: SessionKind,
        successes_only: bool,
    ) -> Result<Vec<SessionSummary>> {
        let having: &str = match successes_only {
            true => "HAVING SUM(is_success) > 0",
            false => "",
        };
        let mut statement = self.conn.prepare(&format!(
            "SELECT {0}, MIN(timestamp), MAX(timestamp), COUNT(*), SUM(is_success),
                    MIN(CASE WHEN is_success = 1 THEN time_sec END),
                    AVG(CASE WHEN is_success = 1 THEN time_sec END),
                    MIN(CASE WHEN is_success = 1 THEN total_explosives END),
                    AVG(CASE WHEN is_success = 1 THEN total_explosives END)
             FROM attempts
             WHERE {0} IS NOT NULL
             GROUP BY {0} {1}",
            column, having
        ))?;
        let rows = statement.query_map([], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                kind,
                start: text_to_datetime(row.get::<_, String>(1)?),
                end: text_to_datetime(row.get::<_, String>(2)?),
                count: row.get::<_, i64>(3)? as Count,
                success_count: row.get::<_, i64>(4)? as Count,
                best_time: row.get(5)?,
                avg_time: row.get(6)?,
                best_explosives: row.get(7)?,
                avg_explosives: row.get(8)?,
                duration_sec: 0,
                play_time_sec: 0,
            })
        })?;
        let mut summaries: Vec<SessionSummary> = rows.collect::<Result<Vec<_>>>()?;

        // estimate active time from the session's own runs
        let gap_limit_secs: f64 = (SESSION_GAP_LIMIT_MINUTES * 60) as f64;
        for summary in summaries.iter_mut() {
            let runs: Vec<(DateTimeRun, f64)> = self
                .runs_by_session(&summary.id, kind)?
                .iter()
                .map(|stored| (stored.record.timestamp, stored.record.time_sec))
                .collect();
            let (duration_sec, play_time_sec) =
                session_durations(&runs, gap_limit_secs);
            summary.duration_sec = duration_sec;
            summary.play_time_sec = play_time_sec;
        }

        Ok(summaries)
    }

    /// Full ordered dump of every record as a JSON document list.
    pub fn export_json(&self) -> std::io::Result<String> {
        defn!();
        let stored: Vec<StoredRun> = self
            .query_runs(
                &format!(
                    "SELECT {} FROM attempts ORDER BY timestamp ASC, id ASC",
                    COLUMNS
                ),
                params![],
            )
            .map_err(err_from_sql)?;
        let documents: Vec<ExportRecord> = stored
            .iter()
            .map(|s| ExportRecord::from_record(s.id, &s.record))
            .collect();
        defx!("{} documents", documents.len());

        serde_json::to_string_pretty(&documents).map_err(err_from_json)
    }

    /// Restore a prior export: each document routes through the same
    /// insert-or-skip path as live parsing, so imports are idempotent.
    /// Returns the count actually inserted.
    pub fn import_json(&self, data: &str) -> std::io::Result<Count> {
        defn!("({} bytes)", data.len());
        let documents: Vec<ExportRecord> =
            serde_json::from_str(data).map_err(err_from_json)?;
        let mut imported: Count = 0;
        for document in documents {
            let record: RunRecord = document.into_record();
            if self.save_run(&record).map_err(err_from_sql)? {
                imported += 1;
            }
        }
        defx!("imported {}", imported);

        Ok(imported)
    }

    /// Run a full-column query and map the rows.
    fn query_runs(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<StoredRun>> {
        let mut statement = self.conn.prepare(sql)?;
        let rows = statement.query_map(params, row_to_stored)?;

        rows.collect()
    }
}

/// Stored `TEXT` timestamp back to a [`DateTimeRun`]. Stored timestamps
/// are written by [`datetime_run_string`] so this only falls back for
/// rows hand-edited outside the program.
fn text_to_datetime(text: String) -> DateTimeRun {
    datetime_run_parse(&text).unwrap_or(NaiveDateTime::UNIX_EPOCH)
}

/// Map one full-column row to a [`StoredRun`].
fn row_to_stored(row: &Row) -> Result<StoredRun> {
    let fail_reason: Option<FailReason> = row
        .get::<_, Option<String>>(10)?
        .as_deref()
        .and_then(FailReason::from_str_opt);

    Ok(StoredRun {
        id: row.get(0)?,
        record: RunRecord {
            timestamp: text_to_datetime(row.get::<_, String>(1)?),
            time_sec: row.get(2)?,
            explosives: row.get(3)?,
            total_explosives: row.get(4)?,
            tower: row.get(5)?,
            run_type: row.get(6)?,
            height: row.get(7)?,
            bed_time: row.get(8)?,
            is_success: row.get::<_, i64>(9)? != 0,
            fail_reason,
            session_id: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
            split_tag: row.get(12)?,
        },
    })
}
