// SPDX-License-Identifier: MIT
//
// tilde — a minimal full-screen terminal viewer built on tilde-term.
//
// The binary is the editor-state owner that tilde-term's event loop
// drives: it holds the cursor, turns keys into cursor moves, and quits on
// Ctrl-C or Ctrl-Q. Everything terminal-shaped (raw mode, decoding,
// rendering, restore on exit) lives in the library.
//
//   main → EventLoop::new (raw mode + size) → run(Editor) → drop (restore)
//
// Logging: the screen is the UI, so tracing output goes to a file, and
// only when TILDE_LOG is set (an EnvFilter directive, e.g.
// `TILDE_LOG=tilde_term=trace`). TILDE_LOG_FILE overrides the path.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tilde_term::event_loop::{Action, App, EventLoop};
use tilde_term::input::KeyEvent;
use tilde_term::render::Position;
use tilde_term::size::Size;
use tilde_term::terminal;
use tilde_term::tty::Tty;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ─── Editor ─────────────────────────────────────────────────────────────────

/// Cursor direction for a single-cell move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Editor state: just the cursor, for now.
#[derive(Debug, Default)]
struct Editor {
    cursor: Position,
}

impl Editor {
    /// Move one cell, staying on screen. Rows are bounded by the row count,
    /// columns by the column count.
    const fn move_cursor(&mut self, direction: Direction, size: Size) {
        let Position { row, col } = self.cursor;
        match direction {
            Direction::Up => self.cursor.row = row.saturating_sub(1),
            Direction::Down if row + 1 < size.rows => self.cursor.row = row + 1,
            Direction::Left => self.cursor.col = col.saturating_sub(1),
            Direction::Right if col + 1 < size.cols => self.cursor.col = col + 1,
            Direction::Down | Direction::Right => {}
        }
    }

    /// Move a screenful: `size.rows` single-row steps, clamped at the edge.
    fn page(&mut self, direction: Direction, size: Size) {
        for _ in 0..size.rows {
            self.move_cursor(direction, size);
        }
    }
}

impl App for Editor {
    fn on_key(&mut self, key: KeyEvent, size: Size) -> Action {
        match key {
            k if k.is_ctrl(b'c') || k.is_ctrl(b'q') => return Action::Quit,
            KeyEvent::ArrowUp => self.move_cursor(Direction::Up, size),
            KeyEvent::ArrowDown => self.move_cursor(Direction::Down, size),
            KeyEvent::ArrowLeft => self.move_cursor(Direction::Left, size),
            KeyEvent::ArrowRight => self.move_cursor(Direction::Right, size),
            KeyEvent::PageUp => self.page(Direction::Up, size),
            KeyEvent::PageDown => self.page(Direction::Down, size),
            KeyEvent::Home => self.cursor.col = 0,
            KeyEvent::End => self.cursor.col = size.cols.saturating_sub(1),
            _ => {}
        }
        Action::Continue
    }

    fn cursor(&self) -> Position {
        self.cursor
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Install a file-backed tracing subscriber if `TILDE_LOG` is set.
///
/// Failure to open the log file is reported and otherwise ignored: logging
/// is never a reason not to start.
fn init_logging() {
    let Ok(directives) = env::var("TILDE_LOG") else {
        return;
    };

    let path = env::var_os("TILDE_LOG_FILE")
        .map_or_else(|| env::temp_dir().join("tilde.log"), PathBuf::from);
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("tilde: {}: {e}", path.display());
            return;
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() {
    init_logging();

    let mut event_loop = EventLoop::new().unwrap_or_else(|e| terminal::die(&mut Tty::new(), &e));
    let mut editor = Editor::default();
    info!(size = ?event_loop.size(), "tilde started");

    if let Err(e) = event_loop.run(&mut editor) {
        event_loop.die(&e);
    }
    info!("tilde exiting");
}

// ─── Tests ──────────────────────────────────────────────────────────────────
