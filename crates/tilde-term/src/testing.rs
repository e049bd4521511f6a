// SPDX-License-Identifier: MIT
//
// In-memory terminal for unit tests.
//
// `FakeTty` implements every device trait the crate uses. Input is a
// script of bytes and timeouts, output is recorded per `write` call, and
// the line-discipline state lives behind an `Rc` so a test can inspect it
// after the device has been moved into (and dropped with) a `RawMode`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

use crate::input::ByteSource;
use crate::size::{Size, WindowSize};
use crate::terminal::{ReadPolicy, TermiosDevice};

/// The slice of termios the fake models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeState {
    pub echo: bool,
    pub canonical: bool,
    pub vmin: u8,
    pub vtime: u8,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            echo: true,
            canonical: true,
            vmin: 1,
            vtime: 0,
        }
    }
}

/// A device interaction, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Write(Vec<u8>),
    SetState(FakeState),
}

/// Shared line-discipline bookkeeping.
#[derive(Debug, Default)]
pub struct FakeAttrs {
    pub current: FakeState,
    /// Every state successfully applied, in order.
    pub history: Vec<FakeState>,
    /// Successful writes and state changes, interleaved.
    pub events: Vec<FakeEvent>,
    /// Every `set_state` call, successful or not.
    pub set_attempts: usize,
    pub backup: Option<FakeState>,
}

#[allow(clippy::struct_excessive_bools)] // one switch per injectable failure
pub struct FakeTty {
    attrs: Rc<RefCell<FakeAttrs>>,
    /// `Some(byte)` delivers a byte, `None` is one read timing out.
    pub input: VecDeque<Option<u8>>,
    /// One entry per `write` call.
    pub writes: Vec<Vec<u8>>,
    /// Result of the window-size ioctl. `None` makes it fail.
    pub window: Option<Size>,
    pub fail_get: bool,
    pub fail_set: bool,
    pub fail_read: bool,
    pub fail_write: bool,
    /// Accept at most this many bytes per `write` call.
    pub short_write: Option<usize>,
}

impl FakeTty {
    pub fn new() -> Self {
        Self::with_state(FakeState::default())
    }

    pub fn with_state(state: FakeState) -> Self {
        Self {
            attrs: Rc::new(RefCell::new(FakeAttrs {
                current: state,
                ..FakeAttrs::default()
            })),
            input: VecDeque::new(),
            writes: Vec::new(),
            window: Some(Size::new(24, 80)),
            fail_get: false,
            fail_set: false,
            fail_read: false,
            fail_write: false,
            short_write: None,
        }
    }

    /// Script input: every byte of `bytes`, back to back.
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut tty = Self::new();
        tty.feed(bytes);
        tty
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied().map(Some));
    }

    pub fn timeout(&mut self) {
        self.input.push_back(None);
    }

    pub fn attrs(&self) -> Rc<RefCell<FakeAttrs>> {
        Rc::clone(&self.attrs)
    }

    /// Everything written, concatenated.
    pub fn output(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

impl TermiosDevice for FakeTty {
    type State = FakeState;

    fn get_state(&self) -> io::Result<FakeState> {
        if self.fail_get {
            return Err(io::Error::other("Inappropriate ioctl for device"));
        }
        Ok(self.attrs.borrow().current.clone())
    }

    fn set_state(&mut self, state: &FakeState) -> io::Result<()> {
        let mut attrs = self.attrs.borrow_mut();
        attrs.set_attempts += 1;
        if self.fail_set {
            return Err(io::Error::other("Invalid argument"));
        }
        attrs.current = state.clone();
        attrs.history.push(state.clone());
        attrs.events.push(FakeEvent::SetState(state.clone()));
        Ok(())
    }

    fn make_raw(&self, _original: &FakeState, policy: ReadPolicy) -> FakeState {
        FakeState {
            echo: false,
            canonical: false,
            vmin: policy.min_bytes,
            vtime: policy.timeout_deciseconds,
        }
    }

    fn backup(&self, original: &FakeState) {
        self.attrs.borrow_mut().backup = Some(original.clone());
    }

    fn clear_backup(&self) {
        self.attrs.borrow_mut().backup = None;
    }
}

impl ByteSource for FakeTty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.fail_read {
            return Err(io::Error::other("Input/output error"));
        }
        self.input.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "input script exhausted")
        })
    }
}

impl Write for FakeTty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_write {
            return Err(io::Error::other("Broken pipe"));
        }
        let n = self.short_write.map_or(buf.len(), |max| buf.len().min(max));
        self.writes.push(buf[..n].to_vec());
        self.attrs
            .borrow_mut()
            .events
            .push(FakeEvent::Write(buf[..n].to_vec()));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WindowSize for FakeTty {
    fn window_size(&self) -> io::Result<Size> {
        self.window
            .ok_or_else(|| io::Error::other("Inappropriate ioctl for device"))
    }
}
