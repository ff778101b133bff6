// src/readers/ingest.rs

//! The `ingest` module turns one file's raw bytes into parsed, stored run
//! records.
//!
//! Per file: decompress (gzip archives, by filename suffix), decode as
//! UTF-8 discarding invalid sequences, split into lines, and feed each line
//! in order to a fresh [`RunParser`] seeded with the filename as session id
//! and the archive-name date as date context. Completed records go through
//! [`RunStore::save_run`], which skips duplicates, so re-ingesting a file
//! is idempotent.
//!
//! Decompression failure aborts that one file only (an [`Error`] to the
//! caller, zero records for the file); a batch of other files proceeds.
//!
//! [`RunParser`]: crate::readers::runparser::RunParser
//! [`RunStore::save_run`]: crate::store::RunStore#method.save_run
//! [`Error`]: std::io::Error

use std::io::{Error, ErrorKind, Read, Result};

use crate::common::{Count, FPath};
use crate::data::runrecord::RunRecord;
use crate::readers::runparser::RunParser;
use crate::store::RunStore;

// `flate2` is for gzip files.
use ::flate2::read::GzDecoder;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Filename suffix that selects gzip decompression.
const SUFFIX_GZ: &str = ".gz";

/// wrap a `rusqlite::Error` for an `std::io::Result` signature
fn err_from_sql(err: rusqlite::Error) -> Error {
    Error::new(ErrorKind::Other, format!("sqlite error: {}", err))
}

/// Decode one file's bytes to text: gzip-decompress when the filename ends
/// in `.gz`, otherwise treat as plain text. Invalid UTF-8 sequences are
/// replaced, never fatal; only a failed decompression errors.
fn decode_content(
    filename: &str,
    content: &[u8],
) -> Result<String> {
    defñ!("({:?}, {} bytes)", filename, content.len());
    if !filename.ends_with(SUFFIX_GZ) {
        return Ok(String::from_utf8_lossy(content).into_owned());
    }

    let mut decoder: GzDecoder<&[u8]> = GzDecoder::new(content);
    let mut decompressed: Vec<u8> = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|err| {
            Error::new(
                err.kind(),
                format!("gzip decompress failed for {:?}: {}", filename, err),
            )
        })?;

    Ok(String::from_utf8_lossy(&decompressed).into_owned())
}

/// Process one uploaded file's content: parse every line, store every
/// completed record, return the count of records newly inserted
/// (duplicates skipped by fingerprint do not count).
///
/// `on_record` is called once per completed record with whether it was
/// newly inserted; presentation layers use it to refresh.
pub fn process_file_content<F>(
    store: &RunStore,
    filename: &str,
    content: &[u8],
    mut on_record: F,
) -> Result<Count>
where
    F: FnMut(&RunRecord, bool),
{
    defn!("({:?}, {} bytes)", filename, content.len());
    let text: String = decode_content(filename, content)?;
    let mut parser: RunParser = RunParser::for_file(filename);
    let mut saved: Count = 0;
    // `str::lines` splits on `\n` and strips a trailing `\r`
    for line in text.lines() {
        if let Some(record) = parser.process_line(line) {
            let inserted: bool = store
                .save_run(&record)
                .map_err(err_from_sql)?;
            if inserted {
                saved += 1;
            }
            on_record(&record, inserted);
        }
    }
    defx!("{:?}: saved {}", filename, saved);

    Ok(saved)
}

/// Convenience wrapper over [`process_file_content`]: read the file at
/// `path` from disk and ingest it under its file name.
pub fn process_file(
    store: &RunStore,
    path: &FPath,
) -> Result<Count> {
    defñ!("({:?})", path);
    let content: Vec<u8> = std::fs::read(path)
        .map_err(|err| Error::new(err.kind(), format!("read failed for {:?}: {}", path, err)))?;
    let filename: &str = match path.rsplit(['/', '\\']).next() {
        Some(name) => name,
        None => path.as_str(),
    };

    process_file_content(store, filename, &content, |_record, _inserted| {})
}
