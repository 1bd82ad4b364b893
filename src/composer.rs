//! The composer is the prompt-input state machine.
//!
//! It owns the authoritative edit buffer and cursor, routes decoded input
//! events into buffer mutations, classifies pasted content (large pastes are
//! stored in the injected [`PasteRegistry`] behind a placeholder token), and
//! reconciles externally supplied values against its own emitted output so a
//! round-tripped echo never clobbers an in-flight edit.
//!
//! # Input paths
//!
//! - [`Composer::handle_event`] / [`Composer::handle_key_event`]: the primary
//!   path for hosts built on crossterm events.
//! - [`Composer::handle_chunk`]: the underlying entry point taking a raw
//!   [`InputChunk`] descriptor; hosts with their own terminal layer call this
//!   directly (it is also how composed/IME bursts with a detached backspace
//!   report arrive).
//! - [`Composer::handle_raw_sequence`]: the secondary intercept for
//!   ESC-prefixed byte sequences. Hosts that surface raw bytes must offer
//!   them here before primary decoding.
//!
//! All processing is synchronous; the only asynchrony is the owner's value
//! prop arriving on its own schedule via [`Composer::sync_external_value`].

use crossterm::event::Event;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;

use crate::composer_event::ComposerEvent;
use crate::composer_event::ComposerEventSender;
use crate::decoder;
use crate::decoder::InputChunk;
use crate::decoder::InputEvent;
use crate::edit_buffer::EditBuffer;
use crate::edit_buffer::sanitize_single_line;
use crate::paste::PastePolicy;
use crate::paste::PasteRegistry;
use crate::paste::line_count;
use crate::raw_sequence::RawSequenceListener;
use crate::reconcile::EchoReconciler;
use crate::reconcile::Reconciliation;
use crate::translator::ContentTranslator;
use crate::word_boundary::beginning_of_previous_word;
use crate::word_boundary::end_of_next_word;

/// Character the consumer layer treats as its refresh/regenerate shortcut
/// while input is disabled. The composer never interprets it during normal
/// editing; it is reported only when the owner has input disabled.
pub const REFRESH_SHORTCUT: &str = "r";

/// Manual insertions longer than this many characters run through paste
/// classification; the paste channel is a hint, size is the trigger.
const MANUAL_CLASSIFY_MIN_CHARS: usize = 5;

/// Result returned when the user interacts with the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    /// Enter on non-empty input. Carries the trimmed value with placeholder
    /// tokens intact; expand them with [`PasteRegistry::resolve`].
    Submitted(String),
    /// Escape. Reported even while input is disabled.
    Cancelled,
    /// The refresh shortcut arrived while input was disabled.
    Refresh,
    None,
}

pub struct Composer {
    buffer: EditBuffer,
    echo: EchoReconciler,
    policy: PastePolicy,
    registry: Box<dyn PasteRegistry>,
    translator: Box<dyn ContentTranslator>,
    tx: ComposerEventSender,
    raw_listener: RawSequenceListener,
    placeholder: String,
    /// When false, the composer is temporarily read-only (e.g. while the
    /// owner is waiting on a turn); Escape and the refresh shortcut stay
    /// responsive.
    input_enabled: bool,
    has_focus: bool,
}

impl Composer {
    pub fn new(
        app_event_tx: ComposerEventSender,
        registry: Box<dyn PasteRegistry>,
        translator: Box<dyn ContentTranslator>,
        policy: PastePolicy,
        placeholder: String,
    ) -> Self {
        Self {
            buffer: EditBuffer::new(),
            echo: EchoReconciler::new(),
            policy,
            registry,
            translator,
            tx: app_event_tx,
            raw_listener: RawSequenceListener::new(),
            placeholder,
            input_enabled: true,
            has_focus: true,
        }
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// Byte offset of the cursor, always on a `char` boundary.
    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Display-only text shown when the buffer is empty.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn registry(&self) -> &dyn PasteRegistry {
        self.registry.as_ref()
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Enable or disable input handling (including the raw-sequence
    /// listener) without tearing the composer down.
    pub fn set_focus(&mut self, focus: bool) {
        self.has_focus = focus;
        self.raw_listener.set_enabled(focus);
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Handle a crossterm event. Key releases and event kinds the composer
    /// does not understand are ignored.
    pub fn handle_event(&mut self, event: &Event) -> (InputResult, bool) {
        match event {
            Event::Key(key_event) => self.handle_key_event(*key_event),
            Event::Paste(text) => self.handle_chunk(&InputChunk::paste(text.clone())),
            _ => (InputResult::None, false),
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> (InputResult, bool) {
        if key_event.kind == KeyEventKind::Release {
            return (InputResult::None, false);
        }
        self.handle_chunk(&InputChunk::from_key_event(&key_event))
    }

    /// Handle one raw input notification. Returns the input result plus
    /// whether the display needs a redraw.
    pub fn handle_chunk(&mut self, chunk: &InputChunk) -> (InputResult, bool) {
        if !self.has_focus {
            return (InputResult::None, false);
        }

        let event = decoder::decode(chunk, self.translator.as_mut());

        // Escape and the refresh shortcut are evaluated ahead of the
        // disabled gate so they stay responsive while the owner is busy.
        if event == InputEvent::Escape {
            return (InputResult::Cancelled, true);
        }
        if !self.input_enabled {
            if matches!(&event, InputEvent::Text { payload, .. } if payload.as_str() == REFRESH_SHORTCUT)
            {
                return (InputResult::Refresh, true);
            }
            return (InputResult::None, false);
        }

        self.apply_event(event)
    }

    /// Offer a raw byte sequence to the secondary listener. Returns true when
    /// the sequence was consumed; unrecognized sequences are dropped silently
    /// by the caller feeding them onward (or nowhere).
    pub fn handle_raw_sequence(&mut self, bytes: &[u8]) -> bool {
        if !self.has_focus || !self.input_enabled {
            return false;
        }
        let Some(event) = self.raw_listener.recognize(bytes) else {
            return false;
        };
        let _ = self.apply_event(event);
        true
    }

    /// Reconcile an externally supplied value (history recall, field clear,
    /// or the owner echoing this engine's own output back).
    ///
    /// An echo leaves the buffer untouched. A diverged value replaces the
    /// whole buffer; the cursor snaps to end-of-text unless `cursor` carries
    /// an explicit nudge. A nudge is a one-shot request and is honored even
    /// on an echo.
    pub fn sync_external_value(&mut self, value: &str, cursor: Option<usize>) {
        let prev_cursor = self.buffer.cursor();
        match self.echo.observe_external(value) {
            Reconciliation::Echo => {
                if let Some(pos) = cursor {
                    self.buffer.set_cursor(pos);
                }
            }
            Reconciliation::Diverged => {
                self.buffer.set_text(value);
                if let Some(pos) = cursor {
                    self.buffer.set_cursor(pos);
                }
            }
        }
        if self.buffer.cursor() != prev_cursor {
            self.tx.send(ComposerEvent::CursorMoved(self.buffer.cursor()));
        }
    }

    fn apply_event(&mut self, event: InputEvent) -> (InputResult, bool) {
        let prev_text = self.buffer.text().to_string();
        let prev_cursor = self.buffer.cursor();

        let result = match event {
            InputEvent::Text {
                payload,
                backspace_flag,
            } => {
                self.insert_typed(&payload, backspace_flag);
                (InputResult::None, true)
            }
            InputEvent::Backspace => {
                self.buffer.delete_backward();
                (InputResult::None, true)
            }
            InputEvent::Delete => {
                self.buffer.delete_forward();
                (InputResult::None, true)
            }
            InputEvent::ArrowLeft => {
                self.buffer.move_left();
                (InputResult::None, true)
            }
            InputEvent::ArrowRight => {
                self.buffer.move_right();
                (InputResult::None, true)
            }
            InputEvent::WordLeft => {
                let pos = beginning_of_previous_word(self.buffer.text(), self.buffer.cursor());
                self.buffer.set_cursor(pos);
                (InputResult::None, true)
            }
            InputEvent::WordRight => {
                let pos = end_of_next_word(self.buffer.text(), self.buffer.cursor());
                self.buffer.set_cursor(pos);
                (InputResult::None, true)
            }
            InputEvent::WordDeleteBack => {
                self.delete_word_back();
                (InputResult::None, true)
            }
            InputEvent::Enter => self.submit(),
            InputEvent::Escape => (InputResult::Cancelled, true),
            InputEvent::Paste { text } => {
                self.insert_paste(text);
                (InputResult::None, true)
            }
            InputEvent::Ignored => (InputResult::None, false),
        };

        self.commit(&prev_text, prev_cursor);
        result
    }

    /// Record and propagate the outcome of a mutation. The echo baseline is
    /// updated before the outbound notification so the owner's round trip of
    /// this same value is recognized later.
    fn commit(&mut self, prev_text: &str, prev_cursor: usize) {
        if self.buffer.text() != prev_text {
            self.echo.record_emitted(self.buffer.text());
            self.tx
                .send(ComposerEvent::ValueChanged(self.buffer.text().to_string()));
        }
        if self.buffer.cursor() != prev_cursor {
            self.tx.send(ComposerEvent::CursorMoved(self.buffer.cursor()));
        }
    }

    fn insert_typed(&mut self, payload: &str, backspace_flag: bool) {
        if payload.chars().count() > MANUAL_CLASSIFY_MIN_CHARS {
            // Large manual bursts take the classification path too; size is
            // the authoritative trigger, the paste channel only a hint.
            // Translation stays paste-only, so small multi-line typed input
            // is never placeholdered.
            if backspace_flag
                && !payload
                    .chars()
                    .any(|c| matches!(u32::from(c), 0x08 | 0x7f))
            {
                self.buffer.delete_backward();
            }
            self.insert_classified(payload);
        } else {
            self.buffer.apply_text_payload(payload, backspace_flag);
        }
    }

    fn insert_paste(&mut self, text: String) {
        let translated = match self.translator.translate(&text) {
            Ok(translated) => translated,
            Err(err) => {
                tracing::warn!("paste translation failed; inserting raw text: {err}");
                text
            }
        };
        self.insert_classified(&translated);
    }

    fn insert_classified(&mut self, text: &str) {
        if self.policy.should_store(text) {
            let lines = line_count(text);
            match self.registry.allocate(text) {
                Ok(id) => {
                    let token = crate::paste::placeholder_text(id, lines);
                    self.buffer.insert_str(&token);
                }
                Err(err) => {
                    tracing::warn!("paste registry allocation failed; inserting inline: {err}");
                    self.buffer.insert_str(&sanitize_single_line(text));
                }
            }
        } else {
            self.buffer.insert_str(&sanitize_single_line(text));
        }
    }

    fn delete_word_back(&mut self) {
        let cursor = self.buffer.cursor();
        let start = beginning_of_previous_word(self.buffer.text(), cursor);
        if start < cursor {
            self.buffer.replace_range(start..cursor, "");
        }
    }

    fn submit(&mut self) -> (InputResult, bool) {
        let value = self.buffer.text().trim().to_string();
        if value.is_empty() {
            return (InputResult::None, false);
        }
        self.buffer.set_text("");
        (InputResult::Submitted(value), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit_buffer::NEWLINE_GLYPH;
    use crate::paste::InMemoryPasteRegistry;
    use crate::translator::PassthroughTranslator;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn composer_with(
        registry: Box<dyn PasteRegistry>,
        translator: Box<dyn ContentTranslator>,
    ) -> (Composer, UnboundedReceiver<ComposerEvent>) {
        let (tx, rx) = unbounded_channel();
        let composer = Composer::new(
            ComposerEventSender::new(tx),
            registry,
            translator,
            PastePolicy::default(),
            "Type a message".to_string(),
        );
        (composer, rx)
    }

    fn test_composer() -> (Composer, UnboundedReceiver<ComposerEvent>) {
        composer_with(
            Box::new(InMemoryPasteRegistry::new()),
            Box::new(PassthroughTranslator),
        )
    }

    fn type_str(composer: &mut Composer, text: &str) {
        for ch in text.chars() {
            composer.handle_chunk(&InputChunk::text(ch.to_string()));
        }
    }

    fn drain(rx: &mut UnboundedReceiver<ComposerEvent>) -> Vec<ComposerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    struct MarkingTranslator;

    impl ContentTranslator for MarkingTranslator {
        fn translate(&self, raw: &str) -> Result<String> {
            Ok(format!("translated:{raw}"))
        }

        fn try_import_image(&mut self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct FailingRegistry;

    impl PasteRegistry for FailingRegistry {
        fn allocate(&mut self, _full_text: &str) -> Result<u64> {
            anyhow::bail!("registry offline")
        }

        fn get(&self, _id: u64) -> Option<&str> {
            None
        }
    }

    struct FailingTranslator;

    impl ContentTranslator for FailingTranslator {
        fn translate(&self, _raw: &str) -> Result<String> {
            anyhow::bail!("translator broken")
        }

        fn try_import_image(&mut self) -> Result<Option<String>> {
            anyhow::bail!("translator broken")
        }
    }

    struct ImageClipboard(Option<String>);

    impl ContentTranslator for ImageClipboard {
        fn translate(&self, raw: &str) -> Result<String> {
            Ok(raw.to_string())
        }

        fn try_import_image(&mut self) -> Result<Option<String>> {
            Ok(self.0.take())
        }
    }

    #[test]
    fn typing_builds_text_and_cursor() {
        let (mut composer, mut rx) = test_composer();
        type_str(&mut composer, "hello");
        assert_eq!(composer.text(), "hello");
        assert_eq!(composer.cursor(), "hello".len());

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&ComposerEvent::CursorMoved("hello".len()))
        );
        assert!(events.contains(&ComposerEvent::ValueChanged("hello".to_string())));
    }

    #[test]
    fn boundary_deletes_are_noops_and_emit_nothing() {
        let (mut composer, mut rx) = test_composer();
        composer.handle_chunk(&InputChunk {
            backspace: true,
            ..InputChunk::default()
        });
        composer.handle_chunk(&InputChunk {
            delete: true,
            ..InputChunk::default()
        });
        assert_eq!(composer.text(), "");
        assert_eq!(drain(&mut rx), Vec::new());
    }

    #[test]
    fn large_single_line_paste_becomes_placeholder() {
        let (mut composer, _rx) = test_composer();
        let payload = "x".repeat(600);
        composer.handle_chunk(&InputChunk::paste(payload.clone()));

        assert_eq!(composer.text(), "[Pasted text #1 +1 lines]");
        assert_eq!(composer.registry().get(1), Some(payload.as_str()));
    }

    #[test]
    fn paste_over_line_threshold_becomes_placeholder() {
        let (mut composer, _rx) = test_composer();
        // Six short lines: far under the char threshold, over the line one.
        let payload = "line one\nline two\nline 3\nline 4\nline 5\nline 6";
        assert!(payload.len() < 100);
        composer.handle_chunk(&InputChunk::paste(payload));

        assert_eq!(composer.text(), "[Pasted text #1 +6 lines]");
    }

    #[test]
    fn small_paste_is_inlined_with_newline_glyphs() {
        let (mut composer, _rx) = test_composer();
        composer.handle_chunk(&InputChunk::paste("a\nb"));
        assert_eq!(composer.text(), format!("a{NEWLINE_GLYPH}b"));
    }

    #[test]
    fn manual_burst_is_classified_but_never_translated() {
        let (mut composer, _rx) = composer_with(
            Box::new(InMemoryPasteRegistry::new()),
            Box::new(MarkingTranslator),
        );
        let burst = "y".repeat(600);
        composer.handle_chunk(&InputChunk::text(burst.clone()));
        assert_eq!(composer.text(), "[Pasted text #1 +1 lines]");
        assert_eq!(composer.registry().get(1), Some(burst.as_str()));

        let pasted = "z".repeat(600);
        composer.handle_chunk(&InputChunk::paste(pasted.clone()));
        let stored = composer.registry().get(2);
        assert_eq!(stored, Some(format!("translated:{pasted}").as_str()));
    }

    #[test]
    fn echo_is_suppressed_and_divergence_replaces() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "abc");
        composer.handle_chunk(&InputChunk {
            left_arrow: true,
            ..InputChunk::default()
        });
        assert_eq!(composer.cursor(), 2);

        // The owner echoes our own value back: buffer and cursor untouched.
        composer.sync_external_value("abc", None);
        assert_eq!(composer.text(), "abc");
        assert_eq!(composer.cursor(), 2);

        // A real external reset replaces everything, cursor to end.
        composer.sync_external_value("xyz", None);
        assert_eq!(composer.text(), "xyz");
        assert_eq!(composer.cursor(), 3);
    }

    #[test]
    fn cursor_nudge_applies_on_divergence_and_on_echo() {
        let (mut composer, _rx) = test_composer();
        composer.sync_external_value("recalled entry", Some(0));
        assert_eq!(composer.text(), "recalled entry");
        assert_eq!(composer.cursor(), 0);

        composer.sync_external_value("recalled entry", Some(3));
        assert_eq!(composer.cursor(), 3);
    }

    #[test]
    fn composed_correction_replaces_previous_char() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "ab");
        let before = composer.text().chars().count();
        composer.handle_chunk(&InputChunk {
            payload: "é".to_string(),
            backspace: true,
            ..InputChunk::default()
        });
        assert_eq!(composer.text(), "aé");
        assert_eq!(composer.text().chars().count(), before);
    }

    #[test]
    fn enter_submits_trimmed_value_and_clears() {
        let (mut composer, mut rx) = test_composer();
        type_str(&mut composer, "  hi  ");
        drain(&mut rx);

        let (result, _) = composer.handle_chunk(&InputChunk {
            enter: true,
            ..InputChunk::default()
        });
        assert_eq!(result, InputResult::Submitted("hi".to_string()));
        assert!(composer.is_empty());

        let events = drain(&mut rx);
        assert!(events.contains(&ComposerEvent::ValueChanged(String::new())));

        // The owner clearing its value afterwards is an echo.
        composer.sync_external_value("", None);
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn empty_submit_is_suppressed() {
        let (mut composer, _rx) = test_composer();
        let (result, handled) = composer.handle_chunk(&InputChunk {
            enter: true,
            ..InputChunk::default()
        });
        assert_eq!(result, InputResult::None);
        assert!(!handled);
    }

    #[test]
    fn submitted_placeholders_resolve_through_the_registry() {
        let (mut composer, _rx) = test_composer();
        let payload = "x".repeat(600);
        composer.handle_chunk(&InputChunk::paste(payload.clone()));
        type_str(&mut composer, "!");

        let (result, _) = composer.handle_chunk(&InputChunk {
            enter: true,
            ..InputChunk::default()
        });
        let InputResult::Submitted(value) = result else {
            panic!("expected submission");
        };
        assert_eq!(value, "[Pasted text #1 +1 lines]!");
        assert_eq!(composer.registry().resolve(&value), format!("{payload}!"));
    }

    #[test]
    fn escape_and_refresh_survive_disabled_input() {
        let (mut composer, _rx) = test_composer();
        composer.set_input_enabled(false);

        let (result, _) = composer.handle_chunk(&InputChunk {
            escape: true,
            ..InputChunk::default()
        });
        assert_eq!(result, InputResult::Cancelled);

        let (result, _) = composer.handle_chunk(&InputChunk::text("r"));
        assert_eq!(result, InputResult::Refresh);

        let (result, handled) = composer.handle_chunk(&InputChunk::text("x"));
        assert_eq!(result, InputResult::None);
        assert!(!handled);
        assert!(composer.is_empty());

        composer.set_input_enabled(true);
        composer.handle_chunk(&InputChunk::text("r"));
        assert_eq!(composer.text(), "r");
    }

    #[test]
    fn raw_sequences_drive_word_motion_and_deletion() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "hello world");

        assert!(composer.handle_raw_sequence(b"\x1b\x7f"));
        assert_eq!(composer.text(), "hello ");
        assert_eq!(composer.cursor(), 6);

        assert!(composer.handle_raw_sequence(b"\x1bb"));
        assert_eq!(composer.cursor(), 0);

        assert!(composer.handle_raw_sequence(b"\x1bf"));
        assert_eq!(composer.cursor(), 6);

        // Unknown sequences are dropped silently.
        assert!(!composer.handle_raw_sequence(b"\x1b[Z"));
        assert!(!composer.handle_raw_sequence(b"plain"));
        assert_eq!(composer.text(), "hello ");
    }

    #[test]
    fn losing_focus_disables_both_input_paths() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "abc");
        composer.set_focus(false);

        assert!(!composer.handle_raw_sequence(b"\x1bb"));
        let (result, handled) = composer.handle_chunk(&InputChunk::text("x"));
        assert_eq!(result, InputResult::None);
        assert!(!handled);
        assert_eq!(composer.text(), "abc");

        composer.set_focus(true);
        composer.handle_chunk(&InputChunk::text("!"));
        assert_eq!(composer.text(), "abc!");
    }

    #[test]
    fn registry_failure_falls_back_to_inline_text() {
        let (mut composer, _rx) =
            composer_with(Box::new(FailingRegistry), Box::new(PassthroughTranslator));
        let payload = format!("a{}", "\n".repeat(7));
        composer.handle_chunk(&InputChunk::paste(payload));
        assert_eq!(
            composer.text(),
            format!("a{}", NEWLINE_GLYPH.to_string().repeat(7))
        );
    }

    #[test]
    fn translator_failure_falls_back_to_raw_text() {
        let (mut composer, _rx) = composer_with(
            Box::new(InMemoryPasteRegistry::new()),
            Box::new(FailingTranslator),
        );
        composer.handle_chunk(&InputChunk::paste("a\nb"));
        assert_eq!(composer.text(), format!("a{NEWLINE_GLYPH}b"));
    }

    #[test]
    fn image_paste_shortcut_inserts_imported_path() {
        let (mut composer, _rx) = composer_with(
            Box::new(InMemoryPasteRegistry::new()),
            Box::new(ImageClipboard(Some("/tmp/img.png".to_string()))),
        );
        composer.handle_chunk(&InputChunk {
            payload: "v".to_string(),
            meta: true,
            ..InputChunk::default()
        });
        assert_eq!(composer.text(), "/tmp/img.png");
    }

    #[test]
    fn unhandled_control_combinations_leave_the_buffer_alone() {
        let (mut composer, mut rx) = test_composer();
        composer.handle_chunk(&InputChunk {
            payload: "x".to_string(),
            ctrl: true,
            ..InputChunk::default()
        });
        assert!(composer.is_empty());
        assert_eq!(drain(&mut rx), Vec::new());
    }

    #[test]
    fn arrow_motion_reports_cursor_moves() {
        let (mut composer, mut rx) = test_composer();
        type_str(&mut composer, "ab");
        drain(&mut rx);

        composer.handle_chunk(&InputChunk {
            left_arrow: true,
            ..InputChunk::default()
        });
        assert_eq!(drain(&mut rx), vec![ComposerEvent::CursorMoved(1)]);

        composer.handle_chunk(&InputChunk {
            right_arrow: true,
            ..InputChunk::default()
        });
        assert_eq!(drain(&mut rx), vec![ComposerEvent::CursorMoved(2)]);
    }
}
