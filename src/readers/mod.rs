// src/readers/mod.rs

//! "Readers" for _mrtlib_.
//!
//! ## Overview of readers
//!
//! * [`ingest`] turns one file's raw bytes into a sequence of text lines
//!   (decompressing gzip archives) and drives a fresh [`RunParser`] over
//!   them, one parser instance per file.
//! * A [`RunParser`] consumes lines one at a time and emits a completed
//!   [`RunRecord`] whenever an attempt concludes.
//! * [`patterns`] is the fixed table of line-recognition regexes the parser
//!   classifies lines with. Pure extraction, no state.
//!
//! The _mrt_ binary program calls [`process_file_content`], one call per
//! file, to drive ingestion into a [`RunStore`].
//!
//! _These are not rust "Readers"; these modules do not implement the trait
//! [`Read`]. These are "readers" in an informal sense._
//!
//! [`ingest`]: crate::readers::ingest
//! [`patterns`]: crate::readers::patterns
//! [`RunParser`]: crate::readers::runparser::RunParser
//! [`RunRecord`]: crate::data::runrecord::RunRecord
//! [`RunStore`]: crate::store::RunStore
//! [`process_file_content`]: crate::readers::ingest::process_file_content
//! [`Read`]: std::io::Read

pub mod ingest;
pub mod patterns;
pub mod runparser;
