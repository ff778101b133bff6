// src/common.rs
//
// common imports, type aliases, and other globals (avoids circular imports)

/// `F`ake `Path` or `F`ile `Path`
pub type FPath = String;
pub type FPaths = Vec<FPath>;

/// A general-purpose counter, e.g. "rows inserted".
pub type Count = u64;

/// Identifier of one ingestion batch; the source filename for file
/// ingestion, or a stable tag for a live stream.
pub type SessionId = String;

/// Name of the structure attempted. Sentinel value is
/// [`TOWER_UNKNOWN`](crate::data::runrecord::TOWER_UNKNOWN).
pub type TowerName = String;

/// Sub-category of an attempt. Sentinel value is
/// [`RUN_TYPE_UNKNOWN`](crate::data::runrecord::RUN_TYPE_UNKNOWN).
pub type RunTypeName = String;

/// User-defined label bracketing runs between `split start`/`split end`
/// chat markers.
pub type SplitTag = String;

/// Standing height reached by a successful attempt, in blocks.
pub type Height = i64;

/// Store-assigned sequence number, insertion order. Tie-break in
/// time-ordered sorts.
pub type RowId = i64;
