// SPDX-License-Identifier: MIT
//
// keys — print every decoded key until Ctrl-C.
//
// A raw-mode key viewer: useful for checking what a terminal actually
// sends for a key, and a minimal end-to-end exercise of the crate
// (raw mode, the decoder, direct fd writes, restore on exit).
//
// Usage:
//   cargo run -p tilde-term --example keys

use std::io::Write;

use tilde_term::input::{Decoder, KeyEvent};
use tilde_term::terminal::{ReadPolicy, die, enable_raw_mode};
use tilde_term::tty::Tty;
use tilde_term::Error;

fn main() {
    let mut raw = enable_raw_mode(Tty::new(), ReadPolicy::default())
        .unwrap_or_else(|e| die(&mut Tty::new(), &e));
    let mut decoder = Decoder::new();

    loop {
        let key = match decoder.read_key(raw.device_mut()) {
            Ok(key) => key,
            Err(e) => raw.die(&e),
        };

        // OPOST is off: lines need an explicit CR.
        let line = match key {
            KeyEvent::Byte(b) if b.is_ascii_graphic() => format!("{b} ({})\r\n", b as char),
            KeyEvent::Byte(b) => format!("{b}\r\n"),
            other => format!("{other:?}\r\n"),
        };
        if let Err(e) = raw.device_mut().write_all(line.as_bytes()) {
            raw.die(&Error::io("write", e));
        }

        if key.is_ctrl(b'c') {
            break;
        }
    }
}
