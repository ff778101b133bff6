// src/data/runrecord.rs

//! A [`RunRecord`] is one completed tower-climb attempt, success or failure,
//! as emitted by a [`RunParser`] and stored in a [`RunStore`].
//!
//! Also here: the failure taxonomy ([`FailReason`]), the explosives-label
//! summation, the deduplication fingerprint, and the JSON backup document
//! type ([`ExportRecord`]) with its legacy field aliases.
//!
//! [`RunParser`]: crate::readers::runparser::RunParser
//! [`RunStore`]: crate::store::RunStore

use crate::common::{
    Height,
    RowId,
    RunTypeName,
    SessionId,
    SplitTag,
    TowerName,
};
use crate::data::datetime::{
    datetime_run_parse,
    datetime_run_string,
    DateTimeRun,
};

use ::chrono::NaiveDateTime;
use ::serde::{Deserialize, Deserializer, Serialize};

/// Sentinel tower name for failures and unlabeled successes.
pub const TOWER_UNKNOWN: &str = "Unknown";
/// Sentinel run type for failures and unlabeled successes.
pub const RUN_TYPE_UNKNOWN: &str = "Unknown";
/// Sentinel explosives label when the materials are unknown (failures).
pub const EXPLOSIVES_UNKNOWN: &str = "?";
/// Session id substituted into a fingerprint when none is set.
pub const SESSION_LIVE: &str = "live";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FailReason
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a failed attempt ended. Classification priority when one line could
/// match several patterns is `Death` then `Reset` then `WorldLoad`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailReason {
    /// The player died (slain, killed, fall damage).
    Death,
    /// `Saving and pausing game` - the player quit to the menu.
    Reset,
    /// `Loaded <n> advancements` - a world (re)load.
    WorldLoad,
}

impl FailReason {
    /// Stored/exported text of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::Death => "Death",
            FailReason::Reset => "Reset",
            FailReason::WorldLoad => "World Load",
        }
    }

    /// Inverse of [`as_str`]; `None` for unrecognized text.
    ///
    /// [`as_str`]: FailReason#method.as_str
    pub fn from_str_opt(s: &str) -> Option<FailReason> {
        match s {
            "Death" => Some(FailReason::Death),
            "Reset" => Some(FailReason::Reset),
            "World Load" => Some(FailReason::WorldLoad),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RunRecord
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One completed attempt. Created once by the parser at completion time,
/// never mutated after insertion into the store.
///
/// A record is either a success (`is_success`, `height > 0` expected, no
/// `fail_reason`) or a failure (`height == 0`, `fail_reason` set).
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    /// Wall-clock moment the attempt concluded.
    pub timestamp: DateTimeRun,
    /// Elapsed seconds of the attempt; `0.0` for a success if no `Time:`
    /// line was seen (should not normally happen).
    pub time_sec: f64,
    /// Free-text materials label, e.g. `"8+12"`; [`EXPLOSIVES_UNKNOWN`]
    /// for failures.
    pub explosives: String,
    /// Sum of the `+`-separated integers in `explosives`; `0` if
    /// unparseable. Redundant but indexed for personal-best queries.
    pub total_explosives: i64,
    pub tower: TowerName,
    pub run_type: RunTypeName,
    /// Standing height reached; `0` for failures.
    pub height: Height,
    /// Elapsed seconds until `1st Bed Placed`, if observed.
    pub bed_time: Option<f64>,
    pub is_success: bool,
    pub fail_reason: Option<FailReason>,
    pub session_id: SessionId,
    pub split_tag: Option<SplitTag>,
}

impl RunRecord {
    /// Composite deduplication key: `<session>_<timestamp>_<duration>`.
    ///
    /// An empty session id is keyed as [`SESSION_LIVE`]. The duration uses
    /// the shortest decimal rendering, so `5.0` seconds keys as `5`. Two
    /// records differing only in other fields share a fingerprint; the
    /// store keeps the first.
    pub fn fingerprint(&self) -> String {
        let session: &str = match self.session_id.is_empty() {
            true => SESSION_LIVE,
            false => self.session_id.as_str(),
        };

        format!(
            "{}_{}_{}",
            session,
            datetime_run_string(&self.timestamp),
            self.time_sec,
        )
    }
}

/// Sum a `+`-separated explosives label, e.g. `"8+12"` is `20`.
/// Any unparseable part makes the whole label worth `0`.
pub fn explosives_total(label: &str) -> i64 {
    if label.is_empty() || label == EXPLOSIVES_UNKNOWN {
        return 0;
    }
    let mut total: i64 = 0;
    for part in label.split('+') {
        match part.trim().parse::<i64>() {
            Ok(n) => total += n,
            Err(_) => return 0,
        }
    }

    total
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ExportRecord
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn default_explosives() -> String {
    EXPLOSIVES_UNKNOWN.to_string()
}

fn default_unknown() -> String {
    TOWER_UNKNOWN.to_string()
}

/// Accept a JSON `true`/`false`, or the `0`/`1` integers older backups
/// carry (SQLite has no boolean affinity).
fn de_is_success<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        _ => false,
    })
}

/// One record of a JSON backup.
///
/// Serializes with the canonical column names (`time_sec`, `explosives`,
/// `type`). Deserializes those plus one legacy alias each (`time`, `expl`,
/// `run_type`) so older exports import cleanly. Missing fields fall back to
/// defaults rather than rejecting the document.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExportRecord {
    #[serde(default)]
    pub id: Option<RowId>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, alias = "time")]
    pub time_sec: f64,
    #[serde(default = "default_explosives", alias = "expl")]
    pub explosives: String,
    #[serde(default)]
    pub total_explosives: i64,
    #[serde(default = "default_unknown")]
    pub tower: String,
    #[serde(rename = "type", alias = "run_type", default = "default_unknown")]
    pub run_type: String,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub bed_time: Option<f64>,
    #[serde(default, deserialize_with = "de_is_success")]
    pub is_success: bool,
    #[serde(default)]
    pub fail_reason: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub split_tag: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl ExportRecord {
    /// Backup document for a stored record.
    pub fn from_record(id: RowId, record: &RunRecord) -> ExportRecord {
        ExportRecord {
            id: Some(id),
            timestamp: datetime_run_string(&record.timestamp),
            time_sec: record.time_sec,
            explosives: record.explosives.clone(),
            total_explosives: record.total_explosives,
            tower: record.tower.clone(),
            run_type: record.run_type.clone(),
            height: record.height,
            bed_time: record.bed_time,
            is_success: record.is_success,
            fail_reason: record.fail_reason.map(|r| r.as_str().to_string()),
            session_id: Some(record.session_id.clone()),
            split_tag: record.split_tag.clone(),
            fingerprint: Some(record.fingerprint()),
        }
    }

    /// Map an imported document onto a [`RunRecord`].
    ///
    /// `total_explosives` and `fingerprint` are recomputed, never trusted.
    /// An unparseable timestamp falls back to the Unix epoch. The stored
    /// `id` is dropped; the store assigns a fresh sequence id.
    pub fn into_record(self) -> RunRecord {
        let timestamp: DateTimeRun = datetime_run_parse(&self.timestamp)
            .unwrap_or_else(|| NaiveDateTime::UNIX_EPOCH);
        let total_explosives: i64 = explosives_total(&self.explosives);
        let fail_reason: Option<FailReason> = self
            .fail_reason
            .as_deref()
            .and_then(FailReason::from_str_opt);

        RunRecord {
            timestamp,
            time_sec: self.time_sec,
            explosives: self.explosives,
            total_explosives,
            tower: self.tower,
            run_type: self.run_type,
            height: self.height,
            bed_time: self.bed_time,
            is_success: self.is_success,
            fail_reason,
            session_id: self.session_id.unwrap_or_default(),
            split_tag: self.split_tag,
        }
    }
}
