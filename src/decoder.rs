//! Key decoder: classifies each raw input notification into exactly one
//! semantic [`InputEvent`].
//!
//! The host terminal layer hands the decoder an [`InputChunk`]: the decoded
//! key descriptor (flags and modifiers) plus an optional literal payload.
//! Decoding is a synchronous, stateless classification; escape-sequence
//! fragments that need buffering live in [`crate::raw_sequence`] instead.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;

use crate::translator::ContentTranslator;

/// One raw input notification as supplied by the host terminal layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputChunk {
    /// Literal character payload, possibly multi-character for composed
    /// (IME) input bursts.
    pub payload: String,
    /// Content arrived through a bracketed-paste channel.
    pub is_paste: bool,
    pub escape: bool,
    pub enter: bool,
    pub left_arrow: bool,
    pub right_arrow: bool,
    pub backspace: bool,
    pub delete: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl InputChunk {
    /// Chunk carrying a plain character payload.
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Chunk for content delivered by the terminal's paste channel.
    pub fn paste(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            is_paste: true,
            ..Self::default()
        }
    }

    pub fn from_key_event(key_event: &KeyEvent) -> Self {
        let mut chunk = Self {
            ctrl: key_event.modifiers.contains(KeyModifiers::CONTROL),
            meta: key_event
                .modifiers
                .intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META),
            shift: key_event.modifiers.contains(KeyModifiers::SHIFT),
            ..Self::default()
        };
        match key_event.code {
            KeyCode::Char(c) => chunk.payload = c.to_string(),
            KeyCode::Tab => chunk.payload = "\t".to_string(),
            KeyCode::Esc => chunk.escape = true,
            KeyCode::Enter => chunk.enter = true,
            KeyCode::Left => chunk.left_arrow = true,
            KeyCode::Right => chunk.right_arrow = true,
            KeyCode::Backspace => chunk.backspace = true,
            KeyCode::Delete => chunk.delete = true,
            _ => {}
        }
        chunk
    }
}

/// Semantic event produced from one [`InputChunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Printable payload to merge into the buffer. `backspace_flag` carries a
    /// detached backspace report that accompanied the payload; see
    /// [`crate::edit_buffer::EditBuffer::apply_text_payload`].
    Text {
        payload: String,
        backspace_flag: bool,
    },
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    WordLeft,
    WordRight,
    WordDeleteBack,
    Paste { text: String },
    Ignored,
}

/// Classify one chunk. Rules run in priority order; the first match wins.
pub fn decode(chunk: &InputChunk, translator: &mut dyn ContentTranslator) -> InputEvent {
    // Bracketed-paste payloads win over everything, regardless of content.
    if chunk.is_paste {
        return InputEvent::Paste {
            text: chunk.payload.clone(),
        };
    }
    if chunk.escape {
        return InputEvent::Escape;
    }
    // Paste/insert shortcuts pull a clipboard image first; without one they
    // fall through and get dropped with the other unhandled combinations.
    if (chunk.meta || (chunk.ctrl && chunk.shift)) && chunk.payload.eq_ignore_ascii_case("v") {
        match translator.try_import_image() {
            Ok(Some(text)) => return InputEvent::Paste { text },
            Ok(None) => {}
            Err(err) => tracing::warn!("clipboard image import failed: {err}"),
        }
    }
    if chunk.enter {
        return InputEvent::Enter;
    }
    if chunk.left_arrow {
        return if chunk.ctrl || chunk.meta {
            InputEvent::WordLeft
        } else {
            InputEvent::ArrowLeft
        };
    }
    if chunk.right_arrow {
        return if chunk.ctrl || chunk.meta {
            InputEvent::WordRight
        } else {
            InputEvent::ArrowRight
        };
    }
    // Word-delete combinations the host layer has already resolved; raw
    // ESC-prefixed forms are handled by the raw-sequence listener.
    if chunk.backspace && chunk.meta {
        return InputEvent::WordDeleteBack;
    }
    if chunk.ctrl && chunk.payload.eq_ignore_ascii_case("w") {
        return InputEvent::WordDeleteBack;
    }
    // Unhandled ctrl/meta combinations must not leak into the buffer.
    if chunk.ctrl || chunk.meta {
        return InputEvent::Ignored;
    }
    if chunk.payload.chars().any(|c| !c.is_control()) {
        return InputEvent::Text {
            payload: chunk.payload.clone(),
            backspace_flag: chunk.backspace,
        };
    }
    if chunk.backspace {
        return InputEvent::Backspace;
    }
    if chunk.delete {
        return InputEvent::Delete;
    }
    InputEvent::Ignored
}
