// SPDX-License-Identifier: MIT
//
// Screen dimensions.
//
// The window-size ioctl is the fast path. Some terminals (serial consoles,
// a few emulators over odd transports) answer it with zeros or not at all,
// so there is a fallback that asks the terminal itself: park the cursor in
// the bottom-right corner and request a cursor position report. The
// corner's 1-indexed coordinates are the screen size.

use std::io::{self, Write};

use tracing::debug;

use crate::ansi;
use crate::error::{Error, Result};
use crate::input::{ByteSource, ESC};

/// Longest cursor position report we read, `R` included.
const REPLY_LIMIT: usize = 32;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// A device that can report its window size directly (`TIOCGWINSZ`).
pub trait WindowSize {
    /// Ask the driver for the window size. May report zeros.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the query itself fails.
    fn window_size(&self) -> io::Result<Size>;
}

/// Query the screen size, falling back to the cursor probe.
///
/// The probe runs when the ioctl fails or reports a zero dimension. It
/// needs raw mode: the reply must arrive unechoed and unbuffered.
///
/// # Errors
///
/// [`Error::DimensionQuery`] if the probe cannot be sent or reports zero,
/// [`Error::MalformedResponse`] if the reply can't be parsed.
pub fn query_size<D>(device: &mut D) -> Result<Size>
where
    D: WindowSize + ByteSource + Write,
{
    match device.window_size() {
        Ok(size) if !size.is_empty() => return Ok(size),
        Ok(size) => debug!(?size, "window size ioctl reported zero cells, probing"),
        Err(err) => debug!(%err, "window size ioctl failed, probing"),
    }

    device
        .write_all(ansi::CURSOR_FAR_CORNER)
        .and_then(|()| device.flush())
        .map_err(Error::DimensionQuery)?;
    let size = cursor_position(device)?;
    debug!(?size, "size from cursor probe");
    Ok(size)
}

/// Ask the terminal where the cursor is, as a 1-indexed `(rows, cols)`.
///
/// Sends DSR 6 and reads the reply one byte at a time until `R`, a read
/// timeout, or 31 bytes.
///
/// # Errors
///
/// [`Error::DimensionQuery`] if the request or a read fails, or the
/// position has a zero coordinate; [`Error::MalformedResponse`] if the
/// reply is not `ESC [ rows ; cols R`.
pub fn cursor_position<D>(device: &mut D) -> Result<Size>
where
    D: ByteSource + Write,
{
    device
        .write_all(ansi::REQUEST_CURSOR_POSITION)
        .and_then(|()| device.flush())
        .map_err(Error::DimensionQuery)?;

    let mut reply = Vec::with_capacity(REPLY_LIMIT);
    while reply.len() < REPLY_LIMIT - 1 {
        match device.read_byte().map_err(Error::DimensionQuery)? {
            Some(b'R') | None => break,
            Some(b) => reply.push(b),
        }
    }

    parse_cursor_report(&reply)
}

/// Parse `ESC [ rows ; cols` (the report with its final `R` stripped).
///
/// # Errors
///
/// [`Error::MalformedResponse`] on a wrong prefix or unparsable numbers,
/// [`Error::DimensionQuery`] if either number is zero.
pub fn parse_cursor_report(reply: &[u8]) -> Result<Size> {
    let malformed = || Error::MalformedResponse(reply.to_vec());

    let body = reply.strip_prefix(&[ESC, b'[']).ok_or_else(malformed)?;
    let (rows, cols) = std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.split_once(';'))
        .ok_or_else(malformed)?;
    let rows: u16 = rows.parse().map_err(|_| malformed())?;
    let cols: u16 = cols.parse().map_err(|_| malformed())?;

    let size = Size::new(rows, cols);
    if size.is_empty() {
        return Err(Error::DimensionQuery(io::Error::other(format!(
            "cursor probe reported {rows} rows, {cols} columns"
        ))));
    }
    Ok(size)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
