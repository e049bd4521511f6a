// SPDX-License-Identifier: MIT
//
// Frame rendering — one screen, one write.
//
// A frame is assembled completely in memory and handed to the terminal in
// a single `write()`:
//
//   hide cursor, home
//   row 0 content, erase to end of line, CR LF
//   ...
//   row N-1 content, erase to end of line
//   position cursor, show cursor
//
// Hiding the cursor while the rows go out, erasing each line instead of
// clearing the screen up front, and never writing a partial frame are what
// keep the redraw from flickering.

use std::io::{self, Write};

use tracing::trace;

use crate::ansi;
use crate::error::{Error, Result};
use crate::size::Size;

/// Title shown by [`Welcome`].
pub const TITLE: &str = concat!("Tilde editor -- version ", env!("CARGO_PKG_VERSION"));

/// Row placeholder for lines past the end of the content.
pub const FILLER: u8 = b'~';

// ─── Position ────────────────────────────────────────────────────────────────

/// A cursor position on screen, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub row: u16,
    pub col: u16,
}

impl Position {
    #[inline]
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

// ─── Frame ───────────────────────────────────────────────────────────────────

/// A frame's worth of output bytes, written to the terminal in one call.
///
/// Backed by a `Vec<u8>`, so appends are amortized O(1). The frame is only
/// ever written whole, by [`write_once`](Self::write_once).
#[derive(Debug, Default)]
pub struct Frame {
    buf: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// A frame pre-sized for `size`: every cell plus per-row directives.
    #[must_use]
    pub fn for_size(size: Size) -> Self {
        let per_row = usize::from(size.cols) + ansi::ERASE_LINE.len() + ansi::NEWLINE.len();
        Self {
            buf: Vec::with_capacity(usize::from(size.rows) * per_row + 32),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the frame is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append bytes.
    #[inline]
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append one byte.
    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append `byte` `count` times.
    pub fn push_repeat(&mut self, byte: u8, count: usize) {
        self.buf.resize(self.buf.len() + count, byte);
    }

    /// Append at most `max` bytes of `bytes`. Returns how many were taken.
    pub fn push_clipped(&mut self, bytes: &[u8], max: usize) -> usize {
        let n = bytes.len().min(max);
        self.buf.extend_from_slice(&bytes[..n]);
        n
    }

    /// Append a cursor-position directive for `pos`.
    pub fn cursor_to(&mut self, pos: Position) {
        // Writing into a Vec cannot fail.
        let _ = ansi::cursor_to(&mut self.buf, pos.row, pos.col);
    }

    /// Hand the whole frame to `out` in a single `write` call.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the write fails, or writes fewer bytes than the
    /// frame holds. Short writes are not retried.
    pub fn write_once(&self, out: &mut impl Write) -> Result<()> {
        let written = out.write(&self.buf).map_err(|e| Error::io("write", e))?;
        if written != self.buf.len() {
            return Err(Error::io(
                "write",
                io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {written} of {} bytes", self.buf.len()),
                ),
            ));
        }
        out.flush().map_err(|e| Error::io("write", e))
    }
}

impl Write for Frame {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// Supplies the text of each screen row.
///
/// `draw_row` appends row `row`'s bytes to `frame`. It should append no
/// more than `size.cols` bytes and no line breaks; the renderer adds the
/// erase and the separator.
pub trait Content {
    fn draw_row(&mut self, row: u16, size: Size, frame: &mut Frame);
}

impl<F: FnMut(u16, Size, &mut Frame)> Content for F {
    fn draw_row(&mut self, row: u16, size: Size, frame: &mut Frame) {
        self(row, size, frame);
    }
}

/// The empty-editor screen: a `~` on every row and a centred title a
/// third of the way down.
#[derive(Debug, Clone, Copy)]
pub struct Welcome<'a> {
    pub title: &'a str,
}

impl Welcome<'static> {
    /// The welcome screen with the default [`TITLE`].
    pub const DEFAULT: Self = Self { title: TITLE };
}

impl Default for Welcome<'static> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Content for Welcome<'_> {
    fn draw_row(&mut self, row: u16, size: Size, frame: &mut Frame) {
        if row != size.rows / 3 {
            frame.push_byte(FILLER);
            return;
        }

        let cols = usize::from(size.cols);
        let title = &self.title.as_bytes()[..self.title.len().min(cols)];
        let mut padding = (cols - title.len()) / 2;
        if padding > 0 {
            frame.push_byte(FILLER);
            padding -= 1;
        }
        frame.push_repeat(b' ', padding);
        frame.push(title);
    }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Assemble one frame: every row from `content`, then the cursor at `cursor`.
#[must_use]
pub fn build_frame(size: Size, cursor: Position, content: &mut impl Content) -> Frame {
    let mut frame = Frame::for_size(size);
    frame.push(ansi::HIDE_CURSOR);
    frame.push(ansi::CURSOR_HOME);

    for row in 0..size.rows {
        content.draw_row(row, size, &mut frame);
        frame.push(ansi::ERASE_LINE);
        if row + 1 < size.rows {
            frame.push(ansi::NEWLINE);
        }
    }

    frame.cursor_to(cursor);
    frame.push(ansi::SHOW_CURSOR);
    frame
}

/// Build a frame and write it to `out` in exactly one `write` call.
///
/// # Errors
///
/// [`Error::Io`] if the write fails or is short.
pub fn render_frame(
    out: &mut impl Write,
    size: Size,
    cursor: Position,
    content: &mut impl Content,
) -> Result<()> {
    let frame = build_frame(size, cursor, content);
    trace!(bytes = frame.len(), ?size, ?cursor, "frame");
    frame.write_once(out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
