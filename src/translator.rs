//! Clipboard/content translation collaborator interface.
//!
//! The composer never talks to the clipboard directly; it is handed a
//! [`ContentTranslator`] at construction. `translate` runs over pasted text
//! before size classification and must be idempotent: re-running it on
//! already-translated text must not transform it again.

use std::path::PathBuf;

use anyhow::Result;

pub trait ContentTranslator {
    /// Translate raw pasted text into its insertable form. Idempotent.
    fn translate(&self, raw: &str) -> Result<String>;

    /// Pull an image off the clipboard, if one is present, and return text
    /// representing it (typically a filesystem path). `Ok(None)` means the
    /// clipboard holds no image; errors are reserved for real failures.
    fn try_import_image(&mut self) -> Result<Option<String>>;
}

/// Translator that performs no transformation and never yields images.
/// Useful for tests and headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

impl ContentTranslator for PassthroughTranslator {
    fn translate(&self, raw: &str) -> Result<String> {
        Ok(raw.to_string())
    }

    fn try_import_image(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardImageError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard does not contain an image")]
    NoImage,
    #[error("failed to encode clipboard image: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// System clipboard translator: normalizes pasted filesystem paths and
/// imports clipboard images by writing them to a temporary PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ContentTranslator for SystemClipboard {
    fn translate(&self, raw: &str) -> Result<String> {
        Ok(normalize_pasted_path(raw)
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw.to_string()))
    }

    fn try_import_image(&mut self) -> Result<Option<String>> {
        match import_clipboard_image() {
            Ok(path) => Ok(Some(path.to_string_lossy().into_owned())),
            Err(ClipboardImageError::NoImage) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Normalize pasted text that may represent a single filesystem path.
///
/// Supports `file://` URLs, Windows drive/UNC paths, and shell-escaped
/// single paths (via `shlex`). Multi-line or multi-token text is left alone.
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() || pasted.contains(['\n', '\r']) {
        return None;
    }

    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    // Unquoted Windows paths bypass POSIX shlex, which treats backslashes as
    // escapes (e.g. C:\Users\Alice\file.png, \\server\share\path).
    let drive = pasted
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && pasted.get(1..2) == Some(":")
        && pasted.get(2..3).is_some_and(|s| s == "\\" || s == "/");
    if drive || pasted.starts_with("\\\\") {
        return Some(PathBuf::from(pasted));
    }

    // Prose pastes routinely contain apostrophes that shlex would treat as
    // quoting, so only unescape text that carries a path separator.
    if !pasted.contains(['/', '\\']) {
        return None;
    }
    let mut parts = shlex::split(pasted)?;
    if parts.len() == 1 {
        return parts.pop().map(PathBuf::from);
    }

    None
}

fn import_clipboard_image() -> Result<PathBuf, ClipboardImageError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|err| ClipboardImageError::Unavailable(err.to_string()))?;
    let data = clipboard.get_image().map_err(|err| match err {
        arboard::Error::ContentNotAvailable => ClipboardImageError::NoImage,
        other => ClipboardImageError::Unavailable(other.to_string()),
    })?;

    let width = u32::try_from(data.width)
        .map_err(|_| ClipboardImageError::Encode("image too large".to_string()))?;
    let height = u32::try_from(data.height)
        .map_err(|_| ClipboardImageError::Encode("image too large".to_string()))?;
    let rgba = image::RgbaImage::from_raw(width, height, data.bytes.into_owned())
        .ok_or_else(|| ClipboardImageError::Encode("unexpected buffer size".to_string()))?;

    let (file, path) = tempfile::Builder::new()
        .prefix("pasted-image-")
        .suffix(".png")
        .tempfile()?
        .keep()
        .map_err(|err| ClipboardImageError::Io(err.error))?;
    drop(file);
    rgba.save(&path)
        .map_err(|err| ClipboardImageError::Encode(err.to_string()))?;

    tracing::debug!("imported {width}x{height} clipboard image to {}", path.display());
    Ok(path)
}
