//! Drives a [`FeedEngine`] over an input file and writes the transcript.
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::command::Command;
use crate::engine::FeedEngine;

/// Counters reported once a run finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Well-formed commands handed to the engine.
    pub commands: usize,
    /// Commands the engine refused.
    pub rejected: usize,
    /// Malformed lines that never reached the engine.
    pub skipped: usize,
}

/// Opens both files, then processes every input line with a fresh engine.
///
/// # Errors
///
/// Fails before any command runs if either file cannot be opened, and
/// afterwards only on read or write errors.
pub fn run(input: &Path, output: &Path) -> Result<RunStats> {
    let reader = File::open(input)
        .with_context(|| format!("failed to open input {}", input.display()))?;
    let writer = File::create(output)
        .with_context(|| format!("failed to create output {}", output.display()))?;

    let mut engine = FeedEngine::new();
    process(&mut engine, BufReader::new(reader), BufWriter::new(writer))
}

/// Feeds every line of `reader` through `engine`, writing result lines to
/// `writer`. Malformed lines are logged and skipped. Bytes that are not
/// valid UTF-8 are replaced with `U+FFFD`.
pub fn process<R: BufRead, W: Write>(
    engine: &mut FeedEngine,
    mut reader: R,
    mut writer: W,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut buf = Vec::new();
    let mut lineno = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("failed to read line {}", lineno + 1))?;
        if read == 0 {
            break;
        }
        lineno += 1;

        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            tracing::warn!(line = lineno, "replaced invalid UTF-8 in input line");
        }
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = lineno, error = %e, "skipping malformed line");
                stats.skipped += 1;
                continue;
            }
        };

        stats.commands += 1;
        let lines = match engine.execute(&cmd) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(line = lineno, verb = e.verb, reason = %e.reason, "command rejected");
                stats.rejected += 1;
                vec![e.to_string()]
            }
        };
        for out in lines {
            writeln!(writer, "{}", out)?;
        }
    }

    writer.flush()?;
    Ok(stats)
}
