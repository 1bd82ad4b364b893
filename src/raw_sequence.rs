//! Raw-sequence listener: a secondary, lower-level intercept for escape
//! sequences the primary decoder never sees as semantic keys.
//!
//! Some terminals deliver option/meta word movement and word deletion as
//! vendor-specific escape sequences (modified arrows, classic `ESC b` /
//! `ESC f`, meta+Backspace). Hosts that surface raw bytes should offer each
//! chunk here *before* primary decoding, since this is the only place these
//! patterns are recognized. Anything that does not match a known pattern is
//! ignored silently; terminal input is inherently noisy.

use crate::decoder::InputEvent;

const ESC: u8 = 0x1b;

/// Focus-gated wrapper around [`recognize_sequence`]. The owning composer
/// disables the listener when it loses focus and drops it on teardown.
#[derive(Debug, Clone, Copy)]
pub struct RawSequenceListener {
    enabled: bool,
}

impl Default for RawSequenceListener {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl RawSequenceListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn recognize(&self, bytes: &[u8]) -> Option<InputEvent> {
        if !self.enabled {
            return None;
        }
        recognize_sequence(bytes)
    }
}

/// Map one raw byte sequence to a word-wise event. Only sequences beginning
/// with ESC are considered.
pub fn recognize_sequence(bytes: &[u8]) -> Option<InputEvent> {
    if bytes.first() != Some(&ESC) {
        return None;
    }
    match &bytes[1..] {
        b"b" | b"B" => Some(InputEvent::WordLeft),
        b"f" | b"F" => Some(InputEvent::WordRight),
        // Meta+Backspace arrives as ESC DEL (or ESC BS on some terminals).
        b"\x7f" | b"\x08" => Some(InputEvent::WordDeleteBack),
        b"[1;3D" | b"[1;5D" | b"\x1b[D" => Some(InputEvent::WordLeft),
        b"[1;3C" | b"[1;5C" | b"\x1b[C" => Some(InputEvent::WordRight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_word_motion_sequences() {
        let cases: &[(&[u8], InputEvent)] = &[
            (b"\x1bb", InputEvent::WordLeft),
            (b"\x1bB", InputEvent::WordLeft),
            (b"\x1bf", InputEvent::WordRight),
            (b"\x1b[1;3D", InputEvent::WordLeft),
            (b"\x1b[1;5C", InputEvent::WordRight),
            (b"\x1b\x1b[D", InputEvent::WordLeft),
            (b"\x1b\x7f", InputEvent::WordDeleteBack),
            (b"\x1b\x08", InputEvent::WordDeleteBack),
        ];
        for (bytes, expected) in cases {
            assert_eq!(
                recognize_sequence(bytes).as_ref(),
                Some(expected),
                "sequence {bytes:?}"
            );
        }
    }

    #[test]
    fn non_escape_and_unknown_sequences_are_ignored() {
        assert_eq!(recognize_sequence(b"b"), None);
        assert_eq!(recognize_sequence(b""), None);
        assert_eq!(recognize_sequence(b"\x1b[Z"), None);
        assert_eq!(recognize_sequence(b"\x1b[99;9X"), None);
    }

    #[test]
    fn disabled_listener_matches_nothing() {
        let mut listener = RawSequenceListener::new();
        assert_eq!(listener.recognize(b"\x1bb"), Some(InputEvent::WordLeft));
        listener.set_enabled(false);
        assert_eq!(listener.recognize(b"\x1bb"), None);
        assert!(!listener.is_enabled());
    }
}
