// src/bin/mrt.rs

//! Driver program _mrt_, the Minecraft speedrun tower-practice run tracker.
//!
//! Thin presentation glue over _mrtlib_: ingest practice log files
//! (plain `.log` or rotated `.log.gz` archives) into the run store, then
//! print the analytics report (recent runs, height stats, tower stats,
//! personal bests, session index). Also exports and imports JSON backups.
//!
//! A file that fails to decompress is reported and skipped; the rest of
//! the batch proceeds.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use ::anyhow::Context;
use ::clap::Parser;
use ::const_format::concatcp;
use ::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use ::mrtlib::common::{Count, FPath};
use ::mrtlib::readers::ingest::process_file;
use ::mrtlib::store::{
    HeightStats,
    PersonalBest,
    RunStore,
    SessionSummary,
    StoredRun,
    TowerStats,
};

#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    name = "mrt",
    // write expanded information for the `--version` output
    version = concatcp!(
        "(MCSR Run Tracker)\n",
        "Version: ", env!("CARGO_PKG_VERSION"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
        "Repository: ", env!("CARGO_PKG_REPOSITORY"), "\n",
    ),
    verbatim_doc_comment,
)]
#[allow(non_camel_case_types)]
struct CLI_Args {
    /// Path(s) of practice log files to ingest, plain or `.gz`.
    /// Re-ingesting a file is harmless; duplicate runs are skipped.
    #[clap(verbatim_doc_comment)]
    paths: Vec<FPath>,

    /// Path of the store database. Created if absent.
    /// If not passed then an in-memory store is used (report only lives
    /// for this invocation).
    #[clap(short = 'd', long, verbatim_doc_comment)]
    database: Option<FPath>,

    /// How many rows of the recent-runs table to print.
    #[clap(short = 'r', long, default_value_t = 10)]
    recent: u32,

    /// Export every stored run to this JSON backup file.
    #[clap(short = 'e', long)]
    export: Option<FPath>,

    /// Import a JSON backup file before ingesting. Idempotent; records
    /// already present are skipped by fingerprint.
    #[clap(short = 'i', long, verbatim_doc_comment)]
    import: Option<FPath>,

    /// Delete every stored run first.
    #[clap(long)]
    clear: bool,
}

/// print a colored section header
fn print_header(
    out: &mut StandardStream,
    title: &str,
) -> std::io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(out, "\n=== {} ===", title)?;
    out.reset()
}

fn print_recent(
    out: &mut StandardStream,
    runs: &[StoredRun],
) -> std::io::Result<()> {
    print_header(out, "Recent Runs")?;
    for stored in runs.iter() {
        let record = &stored.record;
        let outcome: String = match record.is_success {
            true => format!("height {}", record.height),
            false => match record.fail_reason {
                Some(reason) => reason.as_str().to_string(),
                None => "?".to_string(),
            },
        };
        writeln!(
            out,
            "{}  {:>8.2}s  {:<12} {:<10} {:<10} {}",
            record.timestamp, record.time_sec, record.explosives,
            record.tower, record.run_type, outcome,
        )?;
    }

    Ok(())
}

fn print_heights(
    out: &mut StandardStream,
    stats: &[HeightStats],
) -> std::io::Result<()> {
    print_header(out, "Height Stats")?;
    writeln!(out, "{:>7} {:>6} {:>10} {:>10} {:>9} {:>9}",
        "height", "count", "best time", "avg time", "best expl", "avg expl")?;
    for s in stats.iter() {
        writeln!(
            out,
            "{:>7} {:>6} {:>9.2}s {:>9.2}s {:>9} {:>9.1}",
            s.height, s.count, s.min_time, s.avg_time,
            s.min_explosives, s.avg_explosives,
        )?;
    }

    Ok(())
}

fn print_towers(
    out: &mut StandardStream,
    stats: &[TowerStats],
) -> std::io::Result<()> {
    print_header(out, "Tower Stats")?;
    writeln!(out, "{:<16} {:>6} {:>10} {:>10} {:>9} {:>9}",
        "tower", "count", "best time", "avg time", "best expl", "avg expl")?;
    for s in stats.iter() {
        writeln!(
            out,
            "{:<16} {:>6} {:>9.2}s {:>9.2}s {:>9} {:>9.1}",
            s.tower, s.count, s.min_time, s.avg_time,
            s.min_explosives, s.avg_explosives,
        )?;
    }

    Ok(())
}

fn print_pbs(
    out: &mut StandardStream,
    pbs: &[PersonalBest],
) -> std::io::Result<()> {
    print_header(out, "Personal Bests (fewest explosives)")?;
    for pb in pbs.iter() {
        writeln!(out, "{:<16} {:<12} {}", pb.tower, pb.run_type, pb.best_explosives)?;
    }

    Ok(())
}

fn print_sessions(
    out: &mut StandardStream,
    sessions: &[SessionSummary],
) -> std::io::Result<()> {
    print_header(out, "Sessions")?;
    for s in sessions.iter() {
        writeln!(
            out,
            "[{:<5}] {:<28} {} .. {}  runs {:>4}  wins {:>4}  active {}s  play {}s",
            s.kind.as_str(), s.id, s.start, s.end,
            s.count, s.success_count, s.duration_sec, s.play_time_sec,
        )?;
    }

    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let args: CLI_Args = CLI_Args::parse();
    let mut out = StandardStream::stdout(ColorChoice::Auto);

    let store: RunStore = match &args.database {
        Some(path) => RunStore::open(Path::new(path))
            .with_context(|| format!("cannot open store database {:?}", path))?,
        None => RunStore::open_in_memory().context("cannot open in-memory store")?,
    };

    if args.clear {
        store.clear().context("clear failed")?;
        writeln!(out, "store cleared")?;
    }

    if let Some(path) = &args.import {
        let data: String = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read backup {:?}", path))?;
        let imported: Count = store
            .import_json(&data)
            .with_context(|| format!("import of {:?} failed", path))?;
        writeln!(out, "{} runs imported from {:?}", imported, path)?;
    }

    // a failed file yields "0 runs added" without blocking the others
    let mut failures: Count = 0;
    for path in args.paths.iter() {
        match process_file(&store, path) {
            Ok(saved) => {
                writeln!(out, "{} runs added from {:?}", saved, path)?;
            }
            Err(err) => {
                failures += 1;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                writeln!(out, "0 runs added from {:?}: {}", path, err)?;
                out.reset()?;
            }
        }
    }

    if let Some(path) = &args.export {
        let data: String = store.export_json().context("export failed")?;
        std::fs::write(path, data)
            .with_context(|| format!("cannot write backup {:?}", path))?;
        writeln!(out, "exported to {:?}", path)?;
    }

    print_recent(&mut out, &store.recent(args.recent)?)?;
    print_heights(&mut out, &store.stats_by_height()?)?;
    print_towers(&mut out, &store.stats_by_tower()?)?;
    print_pbs(&mut out, &store.personal_bests()?)?;
    print_sessions(&mut out, &store.session_index()?)?;
    writeln!(out, "\n{} runs stored", store.row_count()?)?;

    match failures {
        0 => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}
