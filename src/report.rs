//! Cursor position report parsing.
//!
//! A terminal answers the `ESC [ 6 n` status query with a cursor position
//! report: `ESC [ <row> ; <col> R`. This module holds the parsed position
//! type and a strict parser for the report payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based cursor location reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaretPosition {
    /// Row (line) index, counted from 1 at the top.
    pub row: u16,
    /// Column index, counted from 1 at the left.
    pub col: u16,
}

impl CaretPosition {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CaretPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}, Column {}", self.row, self.col)
    }
}

/// Which numeric field of a report an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Row,
    Column,
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportField::Row => write!(f, "row"),
            ReportField::Column => write!(f, "column"),
        }
    }
}

/// Error type for report parsing, one variant per point the grammar can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Report does not start with ESC '['")]
    MissingIntroducer,

    #[error("Unexpected byte 0x{byte:02x} at offset {at}")]
    UnexpectedByte { at: usize, byte: u8 },

    #[error("Report has an empty {field} field")]
    EmptyField { field: ReportField },

    #[error("Report {field} does not fit in 16 bits")]
    Overflow { field: ReportField },

    #[error("Trailing data after the report at offset {at}")]
    TrailingData { at: usize },

    #[error("Report ended before it was complete")]
    Truncated,
}

/// Parse a cursor position report payload.
///
/// The accepted grammar is `ESC '[' <digits> ';' <digits>` with an optional
/// trailing `'R'`. The probe strips the terminator while reading, but payloads
/// captured elsewhere may still carry it, so both forms parse. Anything else
/// is rejected with the variant naming the first point the input went wrong.
///
/// Values are checked against `u16`; `0` is accepted as digits because range
/// policy (positions are 1-based on the wire) belongs to the caller, not the
/// grammar.
pub fn parse_report(bytes: &[u8]) -> Result<CaretPosition, ParseError> {
    match bytes {
        [] | [0x1b] => return Err(ParseError::Truncated),
        [0x1b, b'[', ..] => {},
        _ => return Err(ParseError::MissingIntroducer),
    }

    let mut at = 2;
    let row = take_number(bytes, &mut at, ReportField::Row)?;

    match bytes.get(at) {
        Some(&b';') => at += 1,
        Some(&byte) => return Err(ParseError::UnexpectedByte { at, byte }),
        None => return Err(ParseError::Truncated),
    }

    let col = take_number(bytes, &mut at, ReportField::Column)?;

    if let Some(&byte) = bytes.get(at) {
        if byte == b'R' {
            at += 1;
        } else {
            return Err(ParseError::UnexpectedByte { at, byte });
        }
    }
    if at != bytes.len() {
        return Err(ParseError::TrailingData { at });
    }

    Ok(CaretPosition { row, col })
}

/// Consume a run of ASCII digits at `*at` and return its value.
fn take_number(bytes: &[u8], at: &mut usize, field: ReportField) -> Result<u16, ParseError> {
    let start = *at;
    let mut value: u16 = 0;

    while let Some(&byte) = bytes.get(*at) {
        if !byte.is_ascii_digit() {
            break;
        }
        let digit = u16::from(byte - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseError::Overflow { field })?;
        *at += 1;
    }

    if *at == start {
        // No digits at all: distinguish a truncated report, a present but
        // empty field, and outright junk.
        return match bytes.get(*at) {
            None => Err(ParseError::Truncated),
            Some(&b';') | Some(&b'R') => Err(ParseError::EmptyField { field }),
            Some(&byte) => Err(ParseError::UnexpectedByte { at: *at, byte }),
        };
    }

    Ok(value)
}
