//! The cursor position probe.
//!
//! Writes the `ESC [ 6 n` status query to the terminal and collects the
//! reply one byte at a time under a raw-mode guard, so the reply is neither
//! line-buffered nor echoed back at the user.

use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{ProbeError, ProbeResult};
use crate::report::{parse_report, CaretPosition};
use crate::tty::{RawModeGuard, Tty};

/// The cursor position query, `ESC [ 6 n`.
pub const CURSOR_POSITION_QUERY: &[u8] = b"\x1b[6n";

/// Terminator of a cursor position report.
const REPORT_TERMINATOR: u8 = b'R';

/// Default wait for each reply byte.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default upper bound on reply length. A well-formed report is at most 11
/// bytes before the terminator; anything far past that is a terminal
/// spraying junk, and the buffer must not grow with it.
pub const MAX_REPLY_LEN: usize = 32;

/// Asks a terminal where its cursor is.
pub struct CursorProbe {
    read_timeout: Duration,
    max_reply: usize,
}

impl CursorProbe {
    pub fn new() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_reply: MAX_REPLY_LEN,
        }
    }

    /// Override the per-byte read timeout.
    pub fn with_timeout(read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            max_reply: MAX_REPLY_LEN,
        }
    }

    /// Query the cursor position of `tty`.
    ///
    /// Returns `Ok(None)` when the terminal does not answer: the first byte
    /// that fails to arrive within the timeout abandons the probe. The
    /// timeout is per byte, not cumulative, so a slow terminal that keeps
    /// trickling bytes still completes. A reply that arrives but does not
    /// parse is an error, never `None`.
    ///
    /// The terminal's input modes are restored on every path out of this
    /// function, including unwinds.
    pub fn probe<T: Tty>(&self, tty: &mut T) -> ProbeResult<Option<CaretPosition>> {
        let mut guard = RawModeGuard::new(tty)?;

        guard.tty().write_all(CURSOR_POSITION_QUERY)?;
        debug!("cursor position query written");

        let mut payload: Vec<u8> = Vec::with_capacity(16);
        loop {
            match guard.tty().read_byte(self.read_timeout)? {
                Some(REPORT_TERMINATOR) => break,
                Some(byte) => {
                    trace!("reply byte 0x{:02x}", byte);
                    if payload.len() == self.max_reply {
                        return Err(ProbeError::ReplyTooLong {
                            limit: self.max_reply,
                        });
                    }
                    payload.push(byte);
                },
                None => {
                    debug!("cursor position query went unanswered");
                    guard.finish()?;
                    return Ok(None);
                },
            }
        }

        // Restore before parsing; a malformed reply must not leave the
        // terminal raw.
        guard.finish()?;

        let position = parse_report(&payload)?;
        debug!("cursor position: {}", position);
        Ok(Some(position))
    }
}

impl Default for CursorProbe {
    fn default() -> Self {
        Self::new()
    }
}
