// SPDX-License-Identifier: MIT
//
// Event loop — render, read a key, dispatch, repeat.
//
// The loop is single-threaded and has exactly one suspension point: the
// timed read inside `read_key`. Each iteration:
//
//   1. renders the application's rows into one frame and writes it,
//   2. blocks until one key is decoded,
//   3. hands the key to the application, which mutates its own state
//      and says whether to keep going.
//
// The loop owns the `RawMode` guard, and through it the device. Dropping
// the loop restores the terminal; `die` is the one way out that skips the
// drop (`process::exit`), so it takes the loop by value and restores first.
//
// Resizes are not detected. Call `refresh_size` to re-query.

use std::io::Write;

use tracing::debug;

use crate::ansi;
use crate::error::{Error, Result};
use crate::input::{ByteSource, Decoder, KeyEvent};
use crate::render::{Content, Frame, Position, TITLE, Welcome, render_frame};
use crate::size::{Size, WindowSize, query_size};
use crate::terminal::{RawMode, ReadPolicy, TermiosDevice, enable_raw_mode};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Clear the screen and leave the loop.
    Quit,
}

/// The editor-state owner the loop drives.
///
/// Only [`on_key`](App::on_key) is required. By default the cursor sits at
/// the origin and the rows are the [`Welcome`] screen with the title from
/// [`LoopConfig`].
pub trait App {
    /// Handle one decoded key. `size` is the current screen size.
    fn on_key(&mut self, key: KeyEvent, size: Size) -> Action;

    /// Where to leave the cursor after the frame is drawn.
    fn cursor(&self) -> Position {
        Position::default()
    }

    /// Append row `row`'s content to `frame`. `welcome` is the loop's
    /// configured welcome screen.
    fn draw_row(&mut self, row: u16, size: Size, frame: &mut Frame, welcome: Welcome<'_>) {
        let mut welcome = welcome;
        welcome.draw_row(row, size, frame);
    }
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Event loop configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Read behaviour in raw mode. The timeout is also how long a lone
    /// ESC waits before it counts as the Escape key.
    pub policy: ReadPolicy,
    /// Title on the default welcome screen.
    pub title: &'static str,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            policy: ReadPolicy::default(),
            title: TITLE,
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// # Example
///
/// ```no_run
/// use tilde_term::event_loop::{Action, App, EventLoop};
/// use tilde_term::input::KeyEvent;
/// use tilde_term::size::Size;
///
/// struct Quitter;
///
/// impl App for Quitter {
///     fn on_key(&mut self, key: KeyEvent, _size: Size) -> Action {
///         if key.is_ctrl(b'q') { Action::Quit } else { Action::Continue }
///     }
/// }
///
/// let mut event_loop = EventLoop::new()?;
/// if let Err(e) = event_loop.run(&mut Quitter) {
///     event_loop.die(&e);
/// }
/// # Ok::<(), tilde_term::Error>(())
/// ```
pub struct EventLoop<D: TermiosDevice> {
    raw: RawMode<D>,
    size: Size,
    decoder: Decoder,
    welcome: Welcome<'static>,
}

impl<D> EventLoop<D>
where
    D: TermiosDevice + ByteSource + WindowSize + Write,
{
    /// Enter raw mode on `device` and query the screen size.
    ///
    /// # Errors
    ///
    /// Raw-mode errors from [`enable_raw_mode`], size errors from
    /// [`query_size`]. On a size error the terminal has already been
    /// restored.
    pub fn with_device(device: D, config: LoopConfig) -> Result<Self> {
        let mut raw = enable_raw_mode(device, config.policy)?;
        let size = query_size(raw.device_mut())?;
        debug!(?size, "event loop ready");
        Ok(Self {
            raw,
            size,
            decoder: Decoder::new(),
            welcome: Welcome {
                title: config.title,
            },
        })
    }

    /// The current screen size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the screen size, e.g. after SIGWINCH.
    ///
    /// # Errors
    ///
    /// As [`query_size`]. The cached size is kept on error.
    pub fn refresh_size(&mut self) -> Result<Size> {
        self.size = query_size(self.raw.device_mut())?;
        Ok(self.size)
    }

    /// The raw-mode guard (and through it, the device).
    #[inline]
    pub const fn raw_mode(&mut self) -> &mut RawMode<D> {
        &mut self.raw
    }

    /// Render one frame from `app`'s current state.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the write fails or is short.
    pub fn render(&mut self, app: &mut impl App) -> Result<()> {
        let cursor = app.cursor();
        let welcome = self.welcome;
        let mut rows =
            |row: u16, size: Size, frame: &mut Frame| app.draw_row(row, size, frame, welcome);
        render_frame(self.raw.device_mut(), self.size, cursor, &mut rows)
    }

    /// Run until the application returns [`Action::Quit`].
    ///
    /// On quit the screen is cleared and the cursor homed. The terminal
    /// stays in raw mode until the loop is dropped.
    ///
    /// # Errors
    ///
    /// The first render or read error. Nothing is retried.
    pub fn run(&mut self, app: &mut impl App) -> Result<()> {
        loop {
            self.render(app)?;
            let key = self.decoder.read_key(self.raw.device_mut())?;
            if app.on_key(key, self.size) == Action::Quit {
                debug!("quit");
                return ansi::scrub(self.raw.device_mut()).map_err(|e| Error::io("write", e));
            }
        }
    }

    /// Fatal-error exit: scrub, restore the terminal, report, exit 1.
    ///
    /// See [`RawMode::die`].
    pub fn die(self, err: &Error) -> ! {
        self.raw.die(err)
    }
}

#[cfg(unix)]
impl EventLoop<crate::tty::Tty> {
    /// Event loop on the controlling terminal with default configuration.
    ///
    /// # Errors
    ///
    /// As [`with_device`](Self::with_device).
    pub fn new() -> Result<Self> {
        Self::with_device(crate::tty::Tty::new(), LoopConfig::default())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
