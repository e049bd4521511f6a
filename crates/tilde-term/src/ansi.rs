// SPDX-License-Identifier: MIT
//
// ANSI escape sequences — the complete set this crate sends.
//
// Byte constants for the fixed directives, plus the two writers that need
// more than a constant: cursor positioning and the clear-and-home scrub.
// Nothing here decides *when* to emit; the renderer, the size query and the
// fatal path do that.
//
// Positions are 0-indexed in our API and converted to 1-indexed for the
// terminal (ANSI CUP is 1-based).

use std::io::{self, Write};

// ─── Directives ──────────────────────────────────────────────────────────────

/// Hide the cursor (DECTCEM reset).
pub const HIDE_CURSOR: &[u8] = b"\x1b[?25l";

/// Show the cursor (DECTCEM set).
pub const SHOW_CURSOR: &[u8] = b"\x1b[?25h";

/// Move the cursor to the top-left cell (CUP with no parameters).
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Erase from the cursor to the end of the line (EL 0).
pub const ERASE_LINE: &[u8] = b"\x1b[K";

/// Clear the entire screen (ED 2).
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Push the cursor as far right and down as it will go.
///
/// CUF and CUD stop at the screen edge, so 999 of each parks the cursor
/// in the bottom-right cell whatever the screen size. CUP with 999;999
/// is not used because its behaviour past the edge is not specified.
pub const CURSOR_FAR_CORNER: &[u8] = b"\x1b[999C\x1b[999B";

/// Device Status Report 6: ask the terminal where the cursor is.
///
/// The terminal answers on stdin with `ESC [ row ; col R`.
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// Line separator between rows. `OPOST` is off in raw mode, so a bare
/// `\n` would move down without returning to column 0.
pub const NEWLINE: &[u8] = b"\r\n";

// ─── Writers ─────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using CUP.
///
/// Our coordinates are 0-indexed; the terminal's are 1-indexed.
///
/// # Errors
///
/// Whatever `w` returns.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(row) + 1, u32::from(col) + 1)
}

/// Clear the screen and home the cursor, as one write.
///
/// Used on quit and on the fatal-error path so the shell prompt (or the
/// error message) starts on a clean screen.
///
/// # Errors
///
/// Whatever `w` returns from the write or the flush.
pub fn scrub(w: &mut impl Write) -> io::Result<()> {
    w.write_all(&[CLEAR_SCREEN, CURSOR_HOME].concat())?;
    w.flush()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
