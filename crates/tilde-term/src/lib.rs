// SPDX-License-Identifier: MIT
//
// tilde-term — terminal I/O core for tilde.
//
// The three things a full-screen terminal program cannot do without:
// put the terminal into raw mode and get it back out again on every exit
// path, turn the bytes the keyboard sends into keys, and redraw the whole
// screen in one write so the user never sees a half-painted frame.
//
// This crate talks to the terminal directly through
// termios and ANSI escape sequences. Every device interaction sits behind a
// small trait (`TermiosDevice`, `ByteSource`, `WindowSize`, `io::Write`),
// so the decoder, the renderer and the size probe can all be driven from
// memory in tests. The real device is `tty::Tty`.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod render;
pub mod size;
pub mod terminal;
#[cfg(unix)]
pub mod tty;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
