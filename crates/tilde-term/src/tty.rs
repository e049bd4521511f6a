// SPDX-License-Identifier: MIT
//
// The controlling terminal, through termios and raw file descriptors.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ) and raw fd reads and writes. These are
// the standard POSIX interfaces for terminal control; there is no safe
// alternative in std. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// Reads and writes go straight to fds 0 and 1 with `read(2)`/`write(2)`,
// bypassing std's buffered handles: a frame must leave in exactly one
// syscall, and a read must honour the VMIN/VTIME timeout rather than a
// buffer's idea of how much to fetch.
//
// The panic hook: unwinding drops the `RawMode` guard, but only after the
// default hook has printed the panic message into a raw-mode terminal
// (no CR before LF, so it staircases across the screen). Our hook scrubs
// the screen and restores termios from a global backup first, then
// delegates to the original hook.

use std::fmt;
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::{Mutex, Once};

use crate::input::ByteSource;
use crate::size::{Size, WindowSize};
use crate::terminal::{ReadPolicy, TermiosDevice};

// ─── TerminalState ───────────────────────────────────────────────────────────

/// A termios snapshot.
#[derive(Clone, Copy)]
pub struct TerminalState(libc::termios);

impl PartialEq for TerminalState {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.0, &other.0);
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }
}

impl Eq for TerminalState {}

impl fmt::Debug for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalState")
            .field("c_iflag", &format_args!("{:#x}", self.0.c_iflag))
            .field("c_oflag", &format_args!("{:#x}", self.0.c_oflag))
            .field("c_cflag", &format_args!("{:#x}", self.0.c_cflag))
            .field("c_lflag", &format_args!("{:#x}", self.0.c_lflag))
            .field("vmin", &self.0.c_cc[libc::VMIN])
            .field("vtime", &self.0.c_cc[libc::VTIME])
            .finish()
    }
}

/// Derive the raw-mode termios from `original`.
///
/// Turns off: CR→NL translation (ICRNL), XON/XOFF flow control (IXON),
/// break-to-SIGINT (BRKINT), parity checking (INPCK), 8th-bit stripping
/// (ISTRIP), output post-processing (OPOST), echo (ECHO), canonical input
/// (ICANON), Ctrl-V literal-next (IEXTEN) and signal characters (ISIG).
/// Sets 8-bit characters (CS8) and the VMIN/VTIME pair from `policy`.
#[must_use]
pub const fn raw_termios(original: &libc::termios, policy: ReadPolicy) -> libc::termios {
    let mut raw = *original;
    raw.c_iflag &= !(libc::ICRNL | libc::IXON | libc::BRKINT | libc::INPCK | libc::ISTRIP);
    raw.c_oflag &= !libc::OPOST;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    raw.c_cflag |= libc::CS8;
    raw.c_cc[libc::VMIN] = policy.min_bytes;
    raw.c_cc[libc::VTIME] = policy.timeout_deciseconds;
    raw
}

// ─── Panic-Safe Terminal Restore ─────────────────────────────────────────────

/// Copy of the original termios for the panic hook, which can't reach the
/// `RawMode` that owns the real one.
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Panic hook guard: install at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Written straight to fd 1 by the panic hook: show cursor, clear, home.
const EMERGENCY_SCRUB: &[u8] = b"\x1b[?25h\x1b[2J\x1b[H";

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            original(info);
        }));
    });
}

/// Scrub the screen and restore termios from the backup, if raw mode is
/// still on. Best-effort.
///
/// Goes through `Tty` rather than `io::stdout()` so a panic raised while
/// the stdout lock is held can't deadlock here.
fn emergency_restore() {
    // A poisoned lock still holds a valid termios.
    let guard = TERMIOS_BACKUP
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let backup = (*guard).map(TerminalState);
    restore_from_backup(&mut Tty::new(), backup.as_ref());
}

/// With a backup: scrub `device`, then put the backup back. Without one
/// raw mode has already been released, and the screen is left alone.
fn restore_from_backup<D>(device: &mut D, backup: Option<&D::State>)
where
    D: TermiosDevice + Write,
{
    let Some(original) = backup else {
        return;
    };
    let _ = device.write_all(EMERGENCY_SCRUB);
    let _ = device.set_state(original);
}

// ─── Tty ─────────────────────────────────────────────────────────────────────

/// The process's controlling terminal: input on one fd, output on another.
#[derive(Debug, Clone, Copy)]
pub struct Tty {
    input: RawFd,
    output: RawFd,
}

impl Tty {
    /// stdin for input and termios, stdout for output and the size ioctl.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: libc::STDIN_FILENO,
            output: libc::STDOUT_FILENO,
        }
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::new()
    }
}

impl TermiosDevice for Tty {
    type State = TerminalState;

    fn get_state(&self) -> io::Result<TerminalState> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(self.input, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(TerminalState(termios))
    }

    fn set_state(&mut self, state: &TerminalState) -> io::Result<()> {
        // TCSAFLUSH: wait for pending output, discard unread input, then apply.
        if unsafe { libc::tcsetattr(self.input, libc::TCSAFLUSH, &raw const state.0) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn make_raw(&self, original: &TerminalState, policy: ReadPolicy) -> TerminalState {
        TerminalState(raw_termios(&original.0, policy))
    }

    fn backup(&self, original: &TerminalState) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(original.0);
        }
        install_panic_hook();
    }

    fn clear_backup(&self) {
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }
    }
}

impl ByteSource for Tty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(self.input, (&raw mut byte).cast::<libc::c_void>(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                // Some platforms report the VTIME timeout as EAGAIN.
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.output, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Unbuffered: every write is already a syscall.
        Ok(())
    }
}

impl WindowSize for Tty {
    fn window_size(&self) -> io::Result<Size> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        if unsafe { libc::ioctl(self.output, libc::TIOCGWINSZ, &raw mut ws) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Size::new(ws.ws_row, ws.ws_col))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
