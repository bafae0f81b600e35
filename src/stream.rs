use crate::config::RowErrorPolicy;
use crate::parser::{BlockParser, LineOutcome, ParseError};
use crate::registry::Registry;
use crate::row::RowError;
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: parse error: {source}")]
    Parse { line: u64, source: ParseError },
    #[error("line {line}: row error: {source}")]
    Row { line: u64, source: RowError },
}

/// Counters collected over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: u64,
    pub blocks: u64,
    pub rows: u64,
    pub rows_obfuscated: u64,
    pub row_errors: u64,
}

/// Copy `reader` to `writer` line by line, obfuscating targeted COPY rows.
///
/// Memory use is bounded by the longest line. A malformed COPY header stops
/// the run before that line is written.
pub fn process<R, W>(
    registry: &Registry,
    policy: RowErrorPolicy,
    mut reader: R,
    mut writer: W,
) -> Result<RunStats, ProcessError>
where
    R: BufRead,
    W: Write,
{
    let mut parser = BlockParser::new(registry);
    let mut stats = RunStats::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        stats.lines += 1;
        let line_number = stats.lines;

        let outcome = parser.feed(&mut line).map_err(|source| ProcessError::Parse {
            line: line_number,
            source,
        })?;
        match outcome {
            LineOutcome::Passthrough | LineOutcome::BlockEnd => {}
            LineOutcome::BlockStart => stats.blocks += 1,
            LineOutcome::Row { obfuscated } => {
                stats.rows += 1;
                if obfuscated {
                    stats.rows_obfuscated += 1;
                }
            }
            LineOutcome::RowError(source) => {
                stats.rows += 1;
                stats.row_errors += 1;
                match policy {
                    RowErrorPolicy::Skip => {
                        warn!(line = line_number, error = %source, "Row passed through unmodified");
                    }
                    RowErrorPolicy::Abort => {
                        return Err(ProcessError::Row {
                            line: line_number,
                            source,
                        });
                    }
                }
            }
        }
        writer.write_all(&line)?;
    }

    writer.flush()?;
    info!(
        lines = stats.lines,
        blocks = stats.blocks,
        rows = stats.rows,
        rows_obfuscated = stats.rows_obfuscated,
        row_errors = stats.row_errors,
        "Dump processed"
    );
    Ok(stats)
}
