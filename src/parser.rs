//! Line-driven state machine recognising `COPY ... FROM stdin;` blocks.

use crate::registry::Registry;
use crate::row::{transform_row, RowError};
use thiserror::Error;
use tracing::debug;

/// Prefix of a bulk-data block header line.
pub const COPY_BEGIN: &[u8] = b"COPY ";
/// Block terminator, without its newline.
pub const COPY_END: &[u8] = b"\\.";

const COPY_SYNTAX_DELIMITERS: &[char] = &[' ', '\n', '\'', '"', '(', ')', ',', ';'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("too few tokens in COPY statement: {header}")]
    TooFewTokens { header: String },
}

/// Table name and declared column order of one COPY block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub table: String,
    pub columns: Vec<String>,
}

impl BlockHeader {
    /// Tokenize a `COPY table (col, ...) FROM stdin;` line.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(line);
        let tokens: Vec<&str> = text
            .split(COPY_SYNTAX_DELIMITERS)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < 4 {
            return Err(ParseError::TooFewTokens {
                header: text.trim_end_matches('\n').to_string(),
            });
        }
        Ok(Self {
            table: tokens[1].to_string(),
            columns: tokens[2..tokens.len() - 2]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Scanning,
    InBlock(BlockHeader),
}

/// What happened to one input line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Line outside any block, copied verbatim.
    Passthrough,
    BlockStart,
    BlockEnd,
    /// Data row; `obfuscated` is false for rows of untargeted tables.
    Row { obfuscated: bool },
    /// Data row that could not be transformed; the line is left untouched.
    RowError(RowError),
}

pub fn is_block_end(line: &[u8]) -> bool {
    line.strip_suffix(b"\n").unwrap_or(line) == COPY_END
}

pub struct BlockParser<'r> {
    registry: &'r Registry,
    state: ParserState,
}

impl<'r> BlockParser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            state: ParserState::Scanning,
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Advance the machine by one line, rewriting `line` in place when it is a
    /// targeted data row. `line` carries its trailing newline, if any.
    pub fn feed(&mut self, line: &mut Vec<u8>) -> Result<LineOutcome, ParseError> {
        match &self.state {
            ParserState::Scanning => {
                if !line.starts_with(COPY_BEGIN) {
                    return Ok(LineOutcome::Passthrough);
                }
                let header = BlockHeader::parse(line)?;
                debug!(
                    table = %header.table,
                    columns = header.columns.len(),
                    targeted = self.registry.is_targeted(&header.table),
                    "COPY block start"
                );
                self.state = ParserState::InBlock(header);
                Ok(LineOutcome::BlockStart)
            }
            ParserState::InBlock(header) => {
                if is_block_end(line) {
                    debug!(table = %header.table, "COPY block end");
                    self.state = ParserState::Scanning;
                    return Ok(LineOutcome::BlockEnd);
                }
                let Some(rules) = self.registry.rules_for(&header.table) else {
                    return Ok(LineOutcome::Row { obfuscated: false });
                };

                let has_newline = line.last() == Some(&b'\n');
                let row = if has_newline {
                    &line[..line.len() - 1]
                } else {
                    &line[..]
                };
                if row.is_empty() {
                    return Ok(LineOutcome::Row { obfuscated: false });
                }

                match transform_row(self.registry, &header.table, rules, &header.columns, row) {
                    Ok(mut rewritten) => {
                        if has_newline {
                            rewritten.push(b'\n');
                        }
                        *line = rewritten;
                        Ok(LineOutcome::Row { obfuscated: true })
                    }
                    Err(e) => Ok(LineOutcome::RowError(e)),
                }
            }
        }
    }
}
