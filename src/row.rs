//! Per-row field substitution inside a COPY block.

use crate::registry::{ColumnRule, Registry};
use thiserror::Error;

pub const FIELD_SEPARATOR: u8 = b'\t';

/// COPY text representation of NULL.
pub const NULL_MARKER: &[u8] = b"\\N";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("number of columns ({expected}) does not match number of data fields ({found})")]
    FieldCount { expected: usize, found: usize },
    #[error("target column {column:?} not found in header of table {table:?}")]
    ColumnNotFound { table: String, column: String },
}

/// True for values that are never handed to a scramble function.
pub fn is_blank(value: &[u8]) -> bool {
    value.is_empty() || value == NULL_MARKER
}

/// Apply `rules` to one data row (without its trailing newline).
///
/// Returns the rewritten row. On error nothing is returned and the caller
/// decides whether to keep the original bytes.
pub fn transform_row(
    registry: &Registry,
    table: &str,
    rules: &[ColumnRule],
    columns: &[String],
    line: &[u8],
) -> Result<Vec<u8>, RowError> {
    let mut fields: Vec<Vec<u8>> = line
        .split(|&b| b == FIELD_SEPARATOR)
        .map(<[u8]>::to_vec)
        .collect();
    if fields.len() != columns.len() {
        return Err(RowError::FieldCount {
            expected: columns.len(),
            found: fields.len(),
        });
    }

    for rule in rules {
        let index = columns
            .iter()
            .position(|c| *c == rule.column)
            .ok_or_else(|| RowError::ColumnNotFound {
                table: table.to_string(),
                column: rule.column.clone(),
            })?;
        if is_blank(&fields[index]) {
            continue;
        }
        let scrambled = registry.apply(rule.strategy, &fields[index]);
        fields[index] = scrambled;
    }

    Ok(fields.join(&FIELD_SEPARATOR))
}
