// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// Turns raw stdin bytes into `KeyEvent`s. The set of keys is deliberately
// small: literal bytes (printable and control characters, passed through
// untouched) plus the navigation keys terminals send as escape sequences.
//
// # Design
//
// Disambiguation is a finite-state machine with a pure transition
// function, `transition(state, byte)`. `read_key` drives it from a
// `ByteSource` whose reads time out (VTIME = 1 in raw mode). A timeout in
// the middle of a sequence resolves to a bare Escape: a lone ESC keypress
// looks exactly like the start of a sequence that never finishes, and the
// user should not have to press another key to see it.
//
// Sequences recognised:
//
//   ESC [ A / B / C / D    arrows (up, down, right, left)
//   ESC [ 1 ~ / 7 ~        Home
//   ESC [ 3 ~              Delete
//   ESC [ 4 ~ / 8 ~        End
//   ESC [ 5 ~ / 6 ~        PageUp / PageDown
//   ESC O H / ESC O F      Home / End
//
// Anything else after ESC resolves to Escape. The bytes that were read up
// to that point are consumed, except a second ESC: it resolves the pending
// sequence to Escape and starts a new one, so `ESC ESC [ A` is Escape then
// ArrowUp. Keeping that second sequence across calls needs a long-lived
// `Decoder`; the free `read_key` starts from scratch every time.

use std::io;

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// The escape byte.
pub const ESC: u8 = 0x1B;

// ─── KeyEvent ────────────────────────────────────────────────────────────────

/// One logical keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// A byte as read: printable ASCII or a control character. Ctrl-letter
    /// combinations arrive as the letter with bits 5–7 cleared; see [`ctrl`].
    Byte(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    /// A bare Escape keypress, or an escape sequence we don't know.
    Escape,
}

impl KeyEvent {
    /// Whether this is Ctrl + `letter`.
    #[inline]
    #[must_use]
    pub const fn is_ctrl(self, letter: u8) -> bool {
        matches!(self, Self::Byte(b) if b == ctrl(letter))
    }
}

/// The byte a terminal sends for Ctrl + `letter`.
///
/// ASCII control characters are the letter with bits 5–7 cleared, so
/// Ctrl-Q is `b'q' & 0x1f` = 0x11. Case doesn't matter.
#[inline]
#[must_use]
pub const fn ctrl(letter: u8) -> u8 {
    letter & 0x1f
}

// ─── State Machine ───────────────────────────────────────────────────────────

/// Where the decoder is inside an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Between keys.
    #[default]
    Start,
    /// Read `ESC`.
    SawEscape,
    /// Read `ESC [`.
    SawBracket,
    /// Read `ESC [` and a digit (the digit is kept).
    SawBracketDigit(u8),
    /// Read `ESC O`.
    SawO,
}

/// Advance the decoder by one byte.
///
/// Returns the next state and, if this byte completed a key, the key. The
/// next state is [`State::Start`] when a key is returned, except for an ESC
/// in the middle of a sequence, which yields Escape and leaves the machine
/// in [`State::SawEscape`].
#[must_use]
pub const fn transition(state: State, byte: u8) -> (State, Option<KeyEvent>) {
    let key = match (state, byte) {
        (State::Start, ESC) => return (State::SawEscape, None),
        (State::Start, b) => KeyEvent::Byte(b),
        (_, ESC) => return (State::SawEscape, Some(KeyEvent::Escape)),

        (State::SawEscape, b'[') => return (State::SawBracket, None),
        (State::SawEscape, b'O') => return (State::SawO, None),

        (State::SawBracket, d @ b'0'..=b'9') => return (State::SawBracketDigit(d), None),
        (State::SawBracket, b'A') => KeyEvent::ArrowUp,
        (State::SawBracket, b'B') => KeyEvent::ArrowDown,
        (State::SawBracket, b'C') => KeyEvent::ArrowRight,
        (State::SawBracket, b'D') => KeyEvent::ArrowLeft,

        (State::SawBracketDigit(d), b'~') => tilde_key(d),

        (State::SawO, b'H') => KeyEvent::Home,
        (State::SawO, b'F') => KeyEvent::End,

        _ => KeyEvent::Escape,
    };
    (State::Start, Some(key))
}

/// What a read timeout means in `state`.
///
/// Between keys it means nothing (keep waiting). Mid-sequence it means the
/// sequence is never going to finish: the user pressed Escape.
#[must_use]
pub const fn on_timeout(state: State) -> Option<KeyEvent> {
    match state {
        State::Start => None,
        _ => Some(KeyEvent::Escape),
    }
}

/// `ESC [ d ~` → key, by digit.
const fn tilde_key(digit: u8) -> KeyEvent {
    match digit {
        b'1' | b'7' => KeyEvent::Home,
        b'3' => KeyEvent::Delete,
        b'4' | b'8' => KeyEvent::End,
        b'5' => KeyEvent::PageUp,
        b'6' => KeyEvent::PageDown,
        _ => KeyEvent::Escape,
    }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

/// Incremental decoder: the state machine plus its current state.
///
/// Feed it bytes with [`feed`](Self::feed) and read timeouts with
/// [`timeout`](Self::timeout); each returns the key it completed, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    state: State,
}

impl Decoder {
    /// A decoder between keys.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Start,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Consume one byte.
    pub fn feed(&mut self, byte: u8) -> Option<KeyEvent> {
        let (next, key) = transition(self.state, byte);
        if key == Some(KeyEvent::Escape) {
            debug!(state = ?self.state, byte, "escape sequence resolved to Escape");
        }
        self.state = next;
        key
    }

    /// A read returned no bytes.
    pub const fn timeout(&mut self) -> Option<KeyEvent> {
        let key = on_timeout(self.state);
        if key.is_some() {
            self.state = State::Start;
        }
        key
    }
}

// ─── Reading ─────────────────────────────────────────────────────────────────

/// A byte stream whose reads may time out.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// `Ok(None)` means no byte arrived in time: the "no data yet" outcome,
    /// which callers retry.
    ///
    /// # Errors
    ///
    /// Any failure other than "no data yet".
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl Decoder {
    /// Block until one key has been decoded, picking up from the current
    /// state.
    ///
    /// Loops over timed-out reads while between keys, so this can wait
    /// indefinitely; each underlying read is bounded by the read policy.
    /// Once an ESC has been read, a single timeout resolves to
    /// [`KeyEvent::Escape`].
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if a read fails. The state is kept.
    pub fn read_key(&mut self, source: &mut impl ByteSource) -> Result<KeyEvent> {
        loop {
            let key = match source.read_byte().map_err(|e| Error::io("read", e))? {
                Some(byte) => self.feed(byte),
                None => self.timeout(),
            };
            if let Some(key) = key {
                trace!(?key, "key");
                return Ok(key);
            }
        }
    }
}

/// Block until one key has been decoded, starting between keys.
///
/// A sequence left pending by this key (an ESC that followed another ESC)
/// is dropped; use a [`Decoder`] across calls to keep it.
///
/// # Errors
///
/// [`Error::Io`] if a read fails.
pub fn read_key(source: &mut impl ByteSource) -> Result<KeyEvent> {
    Decoder::new().read_key(source)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::FakeTty;

    /// Helper: run the pure machine over `bytes`, collecting keys.
    fn decode_all(bytes: &[u8]) -> Vec<KeyEvent> {
        let mut state = State::Start;
        let mut keys = Vec::new();
        for &b in bytes {
            let (next, key) = transition(state, b);
            keys.extend(key);
            state = next;
        }
        keys
    }

    /// Helper: `read_key` over a scripted device.
    fn read_one(bytes: &[u8]) -> KeyEvent {
        read_key(&mut FakeTty::with_input(bytes)).unwrap()
    }

    // ── Literal bytes ───────────────────────────────────────────────────

    #[test]
    fn printable_byte_is_literal() {
        assert_eq!(read_one(b"q"), KeyEvent::Byte(0x71));
    }

    #[test]
    fn control_bytes_pass_through_untouched() {
        for b in [0x00, 0x01, 0x03, 0x0D, 0x11, 0x1A, 0x7F] {
            assert_eq!(read_one(&[b]), KeyEvent::Byte(b));
        }
    }

    #[test]
    fn high_bytes_pass_through() {
        assert_eq!(read_one(&[0xC3]), KeyEvent::Byte(0xC3));
    }

    #[test]
    fn every_non_escape_byte_is_literal_from_start() {
        for b in (0u8..=255).filter(|&b| b != ESC) {
            assert_eq!(
                transition(State::Start, b),
                (State::Start, Some(KeyEvent::Byte(b)))
            );
        }
    }

    // ── Ctrl ────────────────────────────────────────────────────────────

    #[test]
    fn ctrl_clears_upper_bits() {
        assert_eq!(ctrl(b'q'), 0x11);
        assert_eq!(ctrl(b'c'), 0x03);
        assert_eq!(ctrl(b'Q'), 0x11);
    }

    #[test]
    fn is_ctrl_matches_only_that_letter() {
        assert!(KeyEvent::Byte(0x11).is_ctrl(b'q'));
        assert!(!KeyEvent::Byte(b'q').is_ctrl(b'q'));
        assert!(!KeyEvent::Byte(0x03).is_ctrl(b'q'));
        assert!(!KeyEvent::Escape.is_ctrl(b'['));
    }

    // ── Arrows ──────────────────────────────────────────────────────────

    #[test]
    fn arrow_sequences() {
        assert_eq!(read_one(b"\x1b[A"), KeyEvent::ArrowUp);
        assert_eq!(read_one(b"\x1b[B"), KeyEvent::ArrowDown);
        assert_eq!(read_one(b"\x1b[C"), KeyEvent::ArrowRight);
        assert_eq!(read_one(b"\x1b[D"), KeyEvent::ArrowLeft);
    }

    // ── Tilde sequences ─────────────────────────────────────────────────

    #[test]
    fn tilde_sequences_by_digit() {
        let cases = [
            (b'1', KeyEvent::Home),
            (b'3', KeyEvent::Delete),
            (b'4', KeyEvent::End),
            (b'5', KeyEvent::PageUp),
            (b'6', KeyEvent::PageDown),
            (b'7', KeyEvent::Home),
            (b'8', KeyEvent::End),
        ];
        for (digit, expected) in cases {
            assert_eq!(read_one(&[ESC, b'[', digit, b'~']), expected, "digit {}", digit as char);
        }
    }

    #[test]
    fn unmapped_tilde_digits_are_escape() {
        for digit in [b'0', b'2', b'9'] {
            assert_eq!(read_one(&[ESC, b'[', digit, b'~']), KeyEvent::Escape);
        }
    }

    #[test]
    fn digit_without_tilde_is_escape() {
        assert_eq!(read_one(b"\x1b[5A"), KeyEvent::Escape);
    }

    // ── SS3 ─────────────────────────────────────────────────────────────

    #[test]
    fn ss3_home_end() {
        assert_eq!(read_one(b"\x1bOH"), KeyEvent::Home);
        assert_eq!(read_one(b"\x1bOF"), KeyEvent::End);
    }

    #[test]
    fn unknown_ss3_is_escape() {
        assert_eq!(read_one(b"\x1bOP"), KeyEvent::Escape);
        assert_eq!(read_one(b"\x1bOA"), KeyEvent::Escape);
    }

    // ── Unknown continuations ───────────────────────────────────────────

    #[test]
    fn unknown_csi_final_is_escape() {
        for b in [b'Z', b'H', b'~', b'x', ESC] {
            assert_eq!(read_one(&[ESC, b'[', b]), KeyEvent::Escape);
        }
    }

    #[test]
    fn unknown_byte_after_escape_is_escape() {
        assert_eq!(read_one(b"\x1bx"), KeyEvent::Escape);
    }

    #[test]
    fn unknown_continuation_consumes_only_what_was_read() {
        // `ESC x` resolves on `x`; `y` is the next key.
        let mut tty = FakeTty::with_input(b"\x1bxy");
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Byte(b'y'));
    }

    // ── Timeouts ────────────────────────────────────────────────────────

    #[test]
    fn lone_escape_then_timeout_is_escape() {
        let mut tty = FakeTty::with_input(&[ESC]);
        tty.timeout();
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert!(tty.input.is_empty());
    }

    #[test]
    fn timeout_after_bracket_is_escape() {
        let mut tty = FakeTty::with_input(b"\x1b[");
        tty.timeout();
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
    }

    #[test]
    fn timeout_after_digit_is_escape() {
        let mut tty = FakeTty::with_input(b"\x1b[5");
        tty.timeout();
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
    }

    #[test]
    fn timeout_after_ss3_is_escape() {
        let mut tty = FakeTty::with_input(b"\x1bO");
        tty.timeout();
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
    }

    #[test]
    fn timeouts_between_keys_are_retried() {
        let mut tty = FakeTty::new();
        tty.timeout();
        tty.timeout();
        tty.timeout();
        tty.feed(b"a");
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Byte(b'a'));
    }

    #[test]
    fn on_timeout_by_state() {
        assert_eq!(on_timeout(State::Start), None);
        for state in [
            State::SawEscape,
            State::SawBracket,
            State::SawBracketDigit(b'3'),
            State::SawO,
        ] {
            assert_eq!(on_timeout(state), Some(KeyEvent::Escape));
        }
    }

    // ── Read errors ─────────────────────────────────────────────────────

    #[test]
    fn read_failure_is_io_error() {
        let mut tty = FakeTty::new();
        tty.fail_read = true;
        let err = read_key(&mut tty).unwrap_err();
        assert!(matches!(err, Error::Io { op: "read", .. }));
    }

    // ── Pure transitions ────────────────────────────────────────────────

    #[test]
    fn transition_walks_the_states() {
        assert_eq!(transition(State::Start, ESC), (State::SawEscape, None));
        assert_eq!(transition(State::SawEscape, b'['), (State::SawBracket, None));
        assert_eq!(transition(State::SawEscape, b'O'), (State::SawO, None));
        assert_eq!(
            transition(State::SawBracket, b'3'),
            (State::SawBracketDigit(b'3'), None)
        );
        assert_eq!(
            transition(State::SawBracketDigit(b'3'), b'~'),
            (State::Start, Some(KeyEvent::Delete))
        );
    }

    #[test]
    fn escape_mid_sequence_starts_a_new_one() {
        assert_eq!(
            transition(State::SawEscape, ESC),
            (State::SawEscape, Some(KeyEvent::Escape))
        );
        assert_eq!(
            transition(State::SawBracketDigit(b'5'), ESC),
            (State::SawEscape, Some(KeyEvent::Escape))
        );
        assert_eq!(
            decode_all(b"\x1b\x1b[A"),
            vec![KeyEvent::Escape, KeyEvent::ArrowUp]
        );
        assert_eq!(
            decode_all(b"\x1b[\x1bOH"),
            vec![KeyEvent::Escape, KeyEvent::Home]
        );
    }

    #[test]
    fn back_to_back_sequences() {
        assert_eq!(
            decode_all(b"\x1b[A\x1b[6~x\x1bOF"),
            vec![
                KeyEvent::ArrowUp,
                KeyEvent::PageDown,
                KeyEvent::Byte(b'x'),
                KeyEvent::End,
            ]
        );
    }

    // ── Decoder ─────────────────────────────────────────────────────────

    #[test]
    fn decoder_tracks_pending_sequence() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.feed(ESC), None);
        assert_eq!(decoder.state(), State::SawEscape);
        assert_eq!(decoder.feed(b'['), None);
        assert_eq!(decoder.state(), State::SawBracket);
        assert_eq!(decoder.feed(b'B'), Some(KeyEvent::ArrowDown));
        assert_eq!(decoder.state(), State::Start);
    }

    #[test]
    fn decoder_keeps_sequence_across_reads() {
        let mut tty = FakeTty::with_input(b"\x1b\x1b[A");
        let mut decoder = Decoder::new();
        assert_eq!(decoder.read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert_eq!(decoder.state(), State::SawEscape);
        assert_eq!(decoder.read_key(&mut tty).unwrap(), KeyEvent::ArrowUp);
        assert!(tty.input.is_empty());
    }

    #[test]
    fn decoder_escape_then_timeout_after_double_escape() {
        let mut tty = FakeTty::with_input(&[ESC, ESC]);
        tty.timeout();
        let mut decoder = Decoder::new();
        assert_eq!(decoder.read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert_eq!(decoder.read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert_eq!(decoder.state(), State::Start);
    }

    #[test]
    fn decoder_timeout_resets_to_start() {
        let mut decoder = Decoder::new();
        decoder.feed(ESC);
        assert_eq!(decoder.timeout(), Some(KeyEvent::Escape));
        assert_eq!(decoder.state(), State::Start);
        assert_eq!(decoder.timeout(), None);
    }

    // ── End to end ──────────────────────────────────────────────────────

    #[test]
    fn scripted_session() {
        let mut tty = FakeTty::with_input(&[0x1B, 0x5B, 0x41]);
        tty.feed(&[0x1B]);
        tty.timeout();
        tty.feed(&[0x71]);

        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::ArrowUp);
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Escape);
        assert_eq!(read_key(&mut tty).unwrap(), KeyEvent::Byte(0x71));
        assert!(tty.input.is_empty());
    }
}
