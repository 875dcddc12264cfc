//! Probe tests against a real PTY.
//!
//! The slave side of an openpty pair stands in for the controlling terminal;
//! a thread on the master side plays the terminal's role and answers the
//! status query with a cursor position report.

#![cfg(unix)]

use std::os::fd::OwnedFd;
use std::os::unix::io::AsRawFd;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::pty::openpty;
use nix::sys::termios::{self, LocalFlags, SetArg};
use nix::unistd::{read, write};

use caretprobe::probe::{CursorProbe, CURSOR_POSITION_QUERY};
use caretprobe::report::CaretPosition;
use caretprobe::tty::FdTty;

/// Answer the first cursor position query on `master` with `reply`.
///
/// Returns the bytes captured before the reply was sent, so the test can
/// check what actually went over the wire. The thread holds the master fd
/// open until `release` disconnects, keeping the slave side readable while
/// the probe drains the reply.
fn answer_query(
    master: OwnedFd,
    reply: &'static [u8],
    release: mpsc::Receiver<()>,
) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut seen = Vec::new();
        let mut buf = [0u8; 64];
        while !seen.windows(4).any(|w| w == CURSOR_POSITION_QUERY) {
            let n = read(master.as_raw_fd(), &mut buf).expect("Failed to read query");
            seen.extend_from_slice(&buf[..n]);
        }
        write(master.as_raw_fd(), reply).expect("Failed to write reply");
        // Hold the fd open until the probing side is done.
        let _ = release.recv();
        seen
    })
}

#[test]
fn test_probe_roundtrip_over_pty() {
    let pty = openpty(None, None).expect("Failed to open PTY");
    let slave = pty.slave;
    let slave_fd = slave.as_raw_fd();

    let before = termios::tcgetattr(&slave).expect("Failed to get modes");
    assert!(before.local_flags.contains(LocalFlags::ICANON));

    let (hold, release) = mpsc::channel();
    let terminal = answer_query(pty.master, b"\x1b[24;80R", release);

    let mut tty = FdTty::from_fds(slave_fd, slave_fd);
    let probe = CursorProbe::with_timeout(Duration::from_millis(2000));
    let pos = probe.probe(&mut tty).expect("Probe failed");

    assert_eq!(pos, Some(CaretPosition::new(24, 80)));

    // Canonical mode and echo are back once the probe returns.
    let after = termios::tcgetattr(&slave).expect("Failed to get modes");
    assert!(after.local_flags.contains(LocalFlags::ICANON));
    assert!(after.local_flags.contains(LocalFlags::ECHO));

    drop(hold);
    let seen = terminal.join().expect("Terminal thread panicked");
    assert!(seen.windows(4).any(|w| w == CURSOR_POSITION_QUERY));
}

#[test]
fn test_probe_times_out_on_mute_pty() {
    let pty = openpty(None, None).expect("Failed to open PTY");
    let slave_fd = pty.slave.as_raw_fd();

    let mut tty = FdTty::from_fds(slave_fd, slave_fd);
    let probe = CursorProbe::with_timeout(Duration::from_millis(30));
    let pos = probe.probe(&mut tty).expect("Probe failed");

    // Nobody on the master side answers; that is the sentinel, not an error.
    assert_eq!(pos, None);
}

#[test]
fn test_probe_preserves_custom_modes() {
    let pty = openpty(None, None).expect("Failed to open PTY");
    let slave_fd = pty.slave.as_raw_fd();

    // Start from a non-default state so the restore provably reapplies the
    // snapshot rather than some assumed default.
    let mut custom = termios::tcgetattr(&pty.slave).expect("Failed to get modes");
    custom.local_flags.remove(LocalFlags::ICANON);
    custom.local_flags.remove(LocalFlags::ECHO);
    termios::tcsetattr(&pty.slave, SetArg::TCSANOW, &custom).expect("Failed to set modes");

    // With the slave already non-canonical, a reply seeded ahead of the
    // query is immediately readable and no answering thread is needed.
    write(pty.master.as_raw_fd(), b"\x1b[5;9R").expect("Failed to write reply");

    let mut tty = FdTty::from_fds(slave_fd, slave_fd);
    let pos = CursorProbe::new().probe(&mut tty).expect("Probe failed");
    assert_eq!(pos, Some(CaretPosition::new(5, 9)));

    let after = termios::tcgetattr(&pty.slave).expect("Failed to get modes");
    assert!(!after.local_flags.contains(LocalFlags::ICANON));
    assert!(!after.local_flags.contains(LocalFlags::ECHO));
}
