// SPDX-License-Identifier: MIT
//
// Terminal mode control — raw mode as an owned guard.
//
// `enable_raw_mode` snapshots the device's line discipline, switches it to
// raw mode, and hands back a `RawMode` guard that owns the device. Dropping
// the guard puts the snapshot back, so every exit path that unwinds through
// the owner restores the terminal. The paths that do *not* unwind
// (`process::exit`) go through `RawMode::die`, which takes the guard by
// value and runs `shutdown` (scrub, then restore) before exiting.
//
// The device itself is a trait so the snapshot/restore contract can be
// checked against an in-memory fake. `tty::Tty` is the termios-backed one.

use std::io::{self, Write};
use std::process;

use tracing::{debug, error};

use crate::ansi;
use crate::error::{Error, Result};

// ─── Read Policy ─────────────────────────────────────────────────────────────

/// How `read()` behaves once raw mode is on: the termios VMIN/VTIME pair.
///
/// The default (`VMIN = 0`, `VTIME = 1`) makes every read return as soon as
/// a byte is available, or with zero bytes after 100ms. That bound is what
/// lets a lone ESC resolve to the Escape key instead of hanging forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    /// Minimum bytes before `read()` returns (VMIN).
    pub min_bytes: u8,
    /// Read timeout in tenths of a second (VTIME).
    pub timeout_deciseconds: u8,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            min_bytes: 0,
            timeout_deciseconds: 1,
        }
    }
}

// ─── Device ──────────────────────────────────────────────────────────────────

/// A device with a line-discipline configuration that can be saved and set.
pub trait TermiosDevice {
    /// Snapshot of the device configuration.
    type State: Clone;

    /// Read the current configuration.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the device cannot be queried.
    fn get_state(&self) -> io::Result<Self::State>;

    /// Apply a configuration, after pending output has drained.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the configuration is rejected.
    fn set_state(&mut self, state: &Self::State) -> io::Result<()>;

    /// Derive the raw-mode configuration from `original`.
    fn make_raw(&self, original: &Self::State, policy: ReadPolicy) -> Self::State;

    /// Called with the snapshot right after it is taken. Devices that need
    /// restoring from a panic hook keep a copy here.
    fn backup(&self, _original: &Self::State) {}

    /// Called once the snapshot has been restored.
    fn clear_backup(&self) {}
}

// ─── RawMode ─────────────────────────────────────────────────────────────────

/// Raw-mode guard. Owns the device; restores its configuration on drop.
///
/// # Example
///
/// ```no_run
/// use tilde_term::terminal::{enable_raw_mode, ReadPolicy};
/// use tilde_term::tty::Tty;
///
/// let raw = enable_raw_mode(Tty::new(), ReadPolicy::default())?;
/// // ... read keys, render frames through raw.device_mut() ...
/// drop(raw); // terminal is back in cooked mode
/// # Ok::<(), tilde_term::Error>(())
/// ```
pub struct RawMode<D: TermiosDevice> {
    device: D,
    /// Configuration captured before raw mode was applied. `None` once
    /// restored.
    original: Option<D::State>,
}

/// Switch `device` into raw mode.
///
/// Captures the current configuration, then disables CR→NL translation,
/// software flow control, parity checking, stripping and break signals,
/// output post-processing, echo, canonical input, extended input
/// processing and signal characters; sets 8-bit characters and applies
/// `policy` to reads.
///
/// # Errors
///
/// [`Error::TerminalQuery`] if the configuration cannot be read,
/// [`Error::TerminalConfig`] if the raw configuration cannot be applied.
pub fn enable_raw_mode<D: TermiosDevice>(device: D, policy: ReadPolicy) -> Result<RawMode<D>> {
    let original = device.get_state().map_err(Error::TerminalQuery)?;
    device.backup(&original);

    let raw = device.make_raw(&original, policy);

    // Guard first: if tcsetattr half-applies and fails, the drop still
    // puts the original back.
    let mut guard = RawMode {
        device,
        original: Some(original),
    };
    guard
        .device
        .set_state(&raw)
        .map_err(Error::TerminalConfig)?;

    debug!(?policy, "raw mode enabled");
    Ok(guard)
}

impl<D: TermiosDevice> RawMode<D> {
    /// Restore the captured configuration.
    ///
    /// Idempotent: once restored, further calls (and the eventual drop)
    /// do nothing.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalConfig`] if the device rejects the restore. The
    /// snapshot is kept, so the drop will try again.
    pub fn disable(&mut self) -> Result<()> {
        if let Some(original) = &self.original {
            self.device
                .set_state(original)
                .map_err(Error::TerminalConfig)?;
            self.device.clear_backup();
            self.original = None;
            debug!("raw mode disabled");
        }
        Ok(())
    }

    /// Whether the device is still in raw mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.original.is_some()
    }

    /// The configuration captured before raw mode, while still active.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> Option<&D::State> {
        self.original.as_ref()
    }

    /// The device, for reads and writes while in raw mode.
    #[inline]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Mutable access to the device.
    #[inline]
    pub const fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: TermiosDevice + Write> RawMode<D> {
    /// Scrub the screen, then restore the terminal, consuming the guard.
    ///
    /// The scrub is best-effort and goes out while raw mode is still on, so
    /// it is not translated or echoed.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalConfig`] if the restore fails. The drop at the end
    /// of this call tries it once more.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = ansi::scrub(&mut self.device);
        self.disable()
    }

    /// Fatal-error exit: [`shutdown`](Self::shutdown), report `err` on
    /// stderr and exit with status 1.
    pub fn die(self, err: &Error) -> ! {
        let _ = self.shutdown();
        report(err)
    }
}

impl<D: TermiosDevice> Drop for RawMode<D> {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}

// ─── Fatal Path ──────────────────────────────────────────────────────────────

/// Fatal-error exit for code that holds no [`RawMode`] (raw mode failed
/// to start, or was already released): scrub `out`, report, exit 1.
pub fn die(out: &mut impl Write, err: &Error) -> ! {
    let _ = ansi::scrub(out);
    report(err)
}

fn report(err: &Error) -> ! {
    error!(%err, "fatal terminal error");
    eprintln!("tilde: {err}");
    process::exit(1)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
