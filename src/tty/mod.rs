//! Terminal access for the probe.
//!
//! [`Tty`] is the seam between probe logic and a concrete terminal: the real
//! controlling terminal on Unix, or a scripted fake in tests. [`RawModeGuard`]
//! scopes the raw-mode window so the saved modes come back on every exit path.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::FdTty;

use std::time::Duration;

use crate::error::ProbeResult;

/// A terminal the probe can talk to.
pub trait Tty {
    /// Snapshot of the terminal's input modes, opaque to the probe.
    type Modes;

    /// Read the current input modes.
    fn current_modes(&self) -> ProbeResult<Self::Modes>;

    /// Switch input to raw (non-canonical, no-echo) mode.
    fn set_raw(&mut self) -> ProbeResult<()>;

    /// Reapply a previously captured mode snapshot.
    fn restore_modes(&mut self, modes: &Self::Modes) -> ProbeResult<()>;

    /// Write `bytes` so they reach the device before this returns.
    fn write_all(&mut self, bytes: &[u8]) -> ProbeResult<()>;

    /// Read one byte, waiting at most `timeout` for it.
    ///
    /// `Ok(None)` means the timeout elapsed with nothing to read. That is an
    /// expected outcome, not an error.
    fn read_byte(&mut self, timeout: Duration) -> ProbeResult<Option<u8>>;
}

/// RAII guard for raw terminal mode.
///
/// Construction snapshots the modes and enters raw mode. [`finish`] restores
/// them and surfaces any failure; the drop handler is the backstop for early
/// returns and unwinds. Whichever runs first takes the snapshot, so restore
/// happens exactly once.
///
/// [`finish`]: RawModeGuard::finish
pub struct RawModeGuard<'a, T: Tty> {
    tty: &'a mut T,
    saved: Option<T::Modes>,
}

impl<'a, T: Tty> RawModeGuard<'a, T> {
    /// Snapshot the current modes and enter raw mode.
    pub fn new(tty: &'a mut T) -> ProbeResult<Self> {
        let saved = tty.current_modes()?;
        tty.set_raw()?;
        Ok(Self {
            tty,
            saved: Some(saved),
        })
    }

    /// Access the guarded terminal.
    pub fn tty(&mut self) -> &mut T {
        self.tty
    }

    /// Restore the saved modes now, propagating any failure.
    pub fn finish(mut self) -> ProbeResult<()> {
        match self.saved.take() {
            Some(modes) => self.tty.restore_modes(&modes),
            None => Ok(()),
        }
    }
}

impl<T: Tty> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(modes) = self.saved.take() {
            if let Err(e) = self.tty.restore_modes(&modes) {
                tracing::warn!("failed to restore terminal modes: {}", e);
            }
        }
    }
}
