//! Paste classification and the placeholder registry interface.
//!
//! Large pasted content is not stored in the edit buffer. It goes into a
//! [`PasteRegistry`] and the buffer receives a short placeholder token of the
//! form `[Pasted text #<id> +<n> lines]`; the consumer expands tokens back to
//! full text at submission time via [`PasteRegistry::resolve`]. The registry
//! is injected into the composer at construction, never a process-wide
//! singleton, so independent widgets and test harnesses keep independent id
//! spaces.

use std::collections::HashMap;

use anyhow::Result;

pub const DEFAULT_MAX_INLINE_CHARS: usize = 500;
pub const DEFAULT_MAX_INLINE_LINES: usize = 5;

pub(crate) const PLACEHOLDER_PREFIX: &str = "[Pasted text #";

/// Size policy deciding when inserted text is replaced by a placeholder.
/// Thresholds are configurable; the defaults are load-bearing for consumers
/// that parse placeholder tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastePolicy {
    pub max_inline_chars: usize,
    pub max_inline_lines: usize,
}

impl Default for PastePolicy {
    fn default() -> Self {
        Self {
            max_inline_chars: DEFAULT_MAX_INLINE_CHARS,
            max_inline_lines: DEFAULT_MAX_INLINE_LINES,
        }
    }
}

impl PastePolicy {
    /// Whether `text` is large enough to be stored behind a placeholder.
    pub fn should_store(&self, text: &str) -> bool {
        line_count(text) > self.max_inline_lines
            || text.chars().count() > self.max_inline_chars
    }
}

/// Count of line breaks plus one. `\r\n`, `\n`, and lone `\r` each count as
/// one break.
pub fn line_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut breaks = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\n' => breaks += 1,
            b'\r' => {
                breaks += 1;
                if bytes.get(idx + 1) == Some(&b'\n') {
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    breaks + 1
}

/// Placeholder token inserted in place of stored paste content.
pub fn placeholder_text(id: u64, lines: usize) -> String {
    format!("[Pasted text #{id} +{lines} lines]")
}

/// Parse a placeholder token at the start of `text`. Returns the id and the
/// token's byte length.
pub(crate) fn parse_placeholder(text: &str) -> Option<(u64, usize)> {
    let rest = text.strip_prefix(PLACEHOLDER_PREFIX)?;
    let id_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if id_len == 0 {
        return None;
    }
    let id: u64 = rest[..id_len].parse().ok()?;
    let rest = rest[id_len..].strip_prefix(" +")?;
    let n_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if n_len == 0 {
        return None;
    }
    let rest = rest[n_len..].strip_prefix(" lines]")?;
    Some((id, text.len() - rest.len()))
}

/// Storage for full pasted text referenced by placeholder tokens.
pub trait PasteRegistry {
    /// Store `full_text` and return its id. Ids are monotonic within a
    /// registry for its lifetime.
    fn allocate(&mut self, full_text: &str) -> Result<u64>;

    fn get(&self, id: u64) -> Option<&str>;

    /// Expand every known placeholder token in `text` back to its full
    /// content. Tokens with unknown ids are left untouched. Invoked by the
    /// consumer at submission time.
    fn resolve(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
            out.push_str(&rest[..start]);
            let candidate = &rest[start..];
            match parse_placeholder(candidate) {
                Some((id, token_len)) => {
                    match self.get(id) {
                        Some(full) => out.push_str(full),
                        None => out.push_str(&candidate[..token_len]),
                    }
                    rest = &candidate[token_len..];
                }
                None => {
                    out.push_str(&candidate[..PLACEHOLDER_PREFIX.len()]);
                    rest = &candidate[PLACEHOLDER_PREFIX.len()..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPasteRegistry {
    entries: HashMap<u64, String>,
    next_id: u64,
}

impl InMemoryPasteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PasteRegistry for InMemoryPasteRegistry {
    fn allocate(&mut self, full_text: &str) -> Result<u64> {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(id, full_text.to_string());
        Ok(id)
    }

    fn get(&self, id: u64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }
}
