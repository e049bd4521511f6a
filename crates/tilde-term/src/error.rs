// SPDX-License-Identifier: MIT
//
// Error kinds for the terminal core.
//
// None of these are recoverable inside the core: they mean the environment
// is not a usable terminal. The caller's job is to scrub the screen, restore
// the terminal and exit (see `terminal::die` and `RawMode::die`). The one
// benign read outcome, "no byte yet", never becomes an `Error`; `read_key`
// retries it.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while driving the terminal.
#[derive(Error, Debug)]
pub enum Error {
    /// `tcgetattr` failed: the current terminal configuration could not be read.
    #[error("tcgetattr: {0}")]
    TerminalQuery(#[source] io::Error),

    /// `tcsetattr` failed: raw mode (or the restore) could not be applied.
    #[error("tcsetattr: {0}")]
    TerminalConfig(#[source] io::Error),

    /// A read or write on the terminal failed for a reason other than
    /// "no data yet".
    #[error("{op}: {source}")]
    Io {
        /// The operation that failed (`read`, `write`, ...).
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Neither the window-size ioctl nor the cursor probe produced a size.
    #[error("get_window_size: {0}")]
    DimensionQuery(#[source] io::Error),

    /// The cursor position report did not look like `ESC [ rows ; cols`.
    #[error("get_cursor_position: malformed reply \"{}\"", .0.escape_ascii())]
    MalformedResponse(Vec<u8>),
}

impl Error {
    /// Wrap an I/O failure, naming the operation that produced it.
    #[must_use]
    pub const fn io(op: &'static str, source: io::Error) -> Self {
        Self::Io { op, source }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Tests ───────────────────────────────────────────────────────────────────
