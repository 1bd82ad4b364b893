// Forbid accidental stdout/stderr writes in the library; the host owns the
// terminal.
#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Paste-aware prompt input engine for terminal chat UIs.
//!
//! The [`Composer`] turns raw key/paste notifications into an edited line of
//! text: large pastes are stored behind placeholder tokens in an injected
//! [`PasteRegistry`], word-wise navigation and deletion work across escape
//! sequence dialects, and externally imposed value changes (history recall,
//! field clears) are reconciled against the engine's own output so an echo
//! never clobbers an in-flight edit.

mod composer;
mod composer_event;
mod config;
mod decoder;
mod display;
mod edit_buffer;
mod history;
mod paste;
mod raw_sequence;
mod reconcile;
mod translator;
mod word_boundary;

pub use composer::Composer;
pub use composer::InputResult;
pub use composer::REFRESH_SHORTCUT;
pub use composer_event::ComposerEvent;
pub use composer_event::ComposerEventSender;
pub use config::ResolvedComposerConfig;
pub use config::resolve_composer_config;
pub use decoder::InputChunk;
pub use decoder::InputEvent;
pub use decoder::decode;
pub use display::cursor_col;
pub use display::display_line;
pub use edit_buffer::EditBuffer;
pub use edit_buffer::NEWLINE_GLYPH;
pub use edit_buffer::sanitize_single_line;
pub use history::DEFAULT_HISTORY_CAPACITY;
pub use history::PromptHistory;
pub use paste::DEFAULT_MAX_INLINE_CHARS;
pub use paste::DEFAULT_MAX_INLINE_LINES;
pub use paste::InMemoryPasteRegistry;
pub use paste::PastePolicy;
pub use paste::PasteRegistry;
pub use paste::line_count;
pub use paste::placeholder_text;
pub use raw_sequence::RawSequenceListener;
pub use raw_sequence::recognize_sequence;
pub use reconcile::EchoReconciler;
pub use reconcile::Reconciliation;
pub use translator::ClipboardImageError;
pub use translator::ContentTranslator;
pub use translator::PassthroughTranslator;
pub use translator::SystemClipboard;
pub use translator::normalize_pasted_path;
pub use word_boundary::beginning_of_previous_word;
pub use word_boundary::end_of_next_word;
