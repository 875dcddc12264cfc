//! Error and result types shared across the probe.

use crate::report::ParseError;

/// Error type for probe operations
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to read terminal modes: {0}")]
    GetModes(#[source] nix::Error),

    #[error("Failed to enter raw mode: {0}")]
    SetRaw(#[source] nix::Error),

    #[error("Failed to restore terminal modes: {0}")]
    RestoreModes(#[source] nix::Error),

    #[error("Failed to write to terminal: {0}")]
    Write(#[source] nix::Error),

    #[error("Failed to poll terminal: {0}")]
    Poll(#[source] nix::Error),

    #[error("Failed to read from terminal: {0}")]
    Read(#[source] nix::Error),

    #[error("Terminal closed before the reply completed")]
    ClosedTty,

    #[error("Reply exceeded {limit} bytes without a terminator")]
    ReplyTooLong { limit: usize },

    #[error("Malformed cursor position report: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
