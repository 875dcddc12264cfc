//! Terminal caret position probe
//!
//! Determines where the terminal cursor is by speaking the ANSI protocol
//! directly: write the `ESC [ 6 n` status query, read the cursor position
//! report back one byte at a time under a raw-mode guard, and parse it
//! strictly. This crate provides:
//!
//! - `probe`: the query/read/restore orchestration
//! - `report`: the report grammar and the parsed position type
//! - `tty`: terminal mode control and timed byte reads
//! - `width`: byte/codepoint/grapheme/column measurement of printed text
//! - `error`: shared error and result types

pub mod error;
pub mod probe;
pub mod report;
pub mod tty;
pub mod width;
