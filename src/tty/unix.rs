//! Unix terminal implementation
//!
//! Talks to the terminal through a pair of file descriptors using POSIX
//! termios for mode control and poll(2) for timed reads.

use std::os::fd::BorrowedFd;
use std::os::unix::io::RawFd;
use std::time::Duration;

use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use nix::unistd::{read, write};

use crate::error::{ProbeError, ProbeResult};
use crate::tty::Tty;

/// The real terminal, addressed as an input/output descriptor pair.
///
/// The descriptors are borrowed, not owned: the caller keeps them open for
/// the life of the `FdTty`. Mode control applies to the input descriptor,
/// which is the one that must stop echoing while a reply is read.
pub struct FdTty {
    input: RawFd,
    output: RawFd,
}

impl FdTty {
    /// The process's controlling terminal via stdin/stdout.
    pub fn stdio() -> Self {
        Self {
            input: STDIN_FILENO,
            output: STDOUT_FILENO,
        }
    }

    /// Wrap an arbitrary descriptor pair, e.g. the slave side of a PTY.
    pub fn from_fds(input: RawFd, output: RawFd) -> Self {
        Self { input, output }
    }

    /// Wait for input to become readable, up to `timeout`.
    ///
    /// Returns false if the timeout expired first. A descriptor that turned
    /// readable because of an error or hangup still reports true; the
    /// follow-up read is what classifies it.
    fn poll_input(&self, timeout: Duration) -> ProbeResult<bool> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        // SAFETY: The caller keeps the input fd open for the lifetime of
        // this FdTty
        let borrowed_fd = unsafe { BorrowedFd::borrow_raw(self.input) };
        loop {
            let mut fds = [PollFd::new(&borrowed_fd, PollFlags::POLLIN)];
            match poll(&mut fds, timeout_ms) {
                Ok(n) => {
                    return Ok(n > 0 && fds[0].revents().is_some_and(|r| !r.is_empty()));
                },
                // A signal restarts the wait with a fresh timeout
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(ProbeError::Poll(e)),
            }
        }
    }

    fn input_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: The caller keeps the input fd open for the lifetime of
        // this FdTty
        unsafe { BorrowedFd::borrow_raw(self.input) }
    }
}

impl Tty for FdTty {
    type Modes = Termios;

    fn current_modes(&self) -> ProbeResult<Termios> {
        termios::tcgetattr(self.input_fd()).map_err(ProbeError::GetModes)
    }

    fn set_raw(&mut self) -> ProbeResult<()> {
        let mut raw = termios::tcgetattr(self.input_fd()).map_err(ProbeError::GetModes)?;

        // Disable canonical mode and echo
        raw.local_flags.remove(LocalFlags::ICANON);
        raw.local_flags.remove(LocalFlags::ECHO);
        raw.local_flags.remove(LocalFlags::ISIG);
        raw.local_flags.remove(LocalFlags::IEXTEN);

        // Deliver single bytes without an inter-byte timer; poll(2) does the
        // waiting
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(self.input_fd(), SetArg::TCSANOW, &raw).map_err(ProbeError::SetRaw)
    }

    fn restore_modes(&mut self, modes: &Termios) -> ProbeResult<()> {
        // TCSADRAIN lets queued output land before the modes flip back
        termios::tcsetattr(self.input_fd(), SetArg::TCSADRAIN, modes)
            .map_err(ProbeError::RestoreModes)
    }

    fn write_all(&mut self, bytes: &[u8]) -> ProbeResult<()> {
        let mut rest = bytes;
        while !rest.is_empty() {
            match write(self.output, rest) {
                Ok(n) => rest = &rest[n..],
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(ProbeError::Write(e)),
            }
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> ProbeResult<Option<u8>> {
        if !self.poll_input(timeout)? {
            return Ok(None);
        }

        let mut buf = [0u8; 1];
        loop {
            match read(self.input, &mut buf) {
                // EOF after a successful poll means the peer hung up, which
                // is not the same finding as silence
                Ok(0) => return Err(ProbeError::ClosedTty),
                Ok(_) => return Ok(Some(buf[0])),
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(ProbeError::Read(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::io::AsRawFd;

    use nix::pty::openpty;

    #[test]
    fn test_read_byte_times_out_on_silence() {
        let pty = openpty(None, None).expect("Failed to open PTY");
        let mut tty = FdTty::from_fds(pty.slave.as_raw_fd(), pty.slave.as_raw_fd());

        let got = tty
            .read_byte(Duration::from_millis(10))
            .expect("Failed to read");
        assert_eq!(got, None);
    }

    #[test]
    fn test_read_byte_delivers_data() {
        let pty = openpty(None, None).expect("Failed to open PTY");
        let mut tty = FdTty::from_fds(pty.slave.as_raw_fd(), pty.slave.as_raw_fd());

        // Canonical mode would hold partial lines back from poll
        tty.set_raw().expect("Failed to set raw");
        write(pty.master.as_raw_fd(), b"x").expect("Failed to write");

        let got = tty
            .read_byte(Duration::from_millis(500))
            .expect("Failed to read");
        assert_eq!(got, Some(b'x'));
    }

    #[test]
    fn test_write_all_reaches_the_device() {
        let pty = openpty(None, None).expect("Failed to open PTY");
        let mut tty = FdTty::from_fds(pty.slave.as_raw_fd(), pty.slave.as_raw_fd());

        tty.write_all(b"\x1b[6n").expect("Failed to write");

        let mut seen = Vec::new();
        let mut buf = [0u8; 8];
        while seen.len() < 4 {
            let n = read(pty.master.as_raw_fd(), &mut buf).expect("Failed to read");
            seen.extend_from_slice(&buf[..n]);
        }
        assert_eq!(seen, b"\x1b[6n");
    }

    #[test]
    fn test_raw_mode_clears_canonical_and_echo() {
        let pty = openpty(None, None).expect("Failed to open PTY");
        let mut tty = FdTty::from_fds(pty.slave.as_raw_fd(), pty.slave.as_raw_fd());

        let saved = tty.current_modes().expect("Failed to get modes");
        assert!(saved.local_flags.contains(LocalFlags::ICANON));
        assert!(saved.local_flags.contains(LocalFlags::ECHO));

        tty.set_raw().expect("Failed to set raw");
        let raw = tty.current_modes().expect("Failed to get modes");
        assert!(!raw.local_flags.contains(LocalFlags::ICANON));
        assert!(!raw.local_flags.contains(LocalFlags::ECHO));

        tty.restore_modes(&saved).expect("Failed to restore");
        let back = tty.current_modes().expect("Failed to get modes");
        assert!(back.local_flags.contains(LocalFlags::ICANON));
        assert!(back.local_flags.contains(LocalFlags::ECHO));
    }
}
