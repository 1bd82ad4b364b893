//! Composer configuration loaded from TOML.
//!
//! Layering order (later layers win):
//! - system: `/etc/prompt-composer/config.toml`
//! - user:   `$PROMPT_COMPOSER_HOME/config.toml`
//!           (default `~/.prompt-composer/config.toml`)
//!
//! Recognized fields:
//!
//! ```toml
//! paste_max_inline_chars = 500
//! paste_max_inline_lines = 5
//! history_capacity = 500
//! ```

use std::io;
use std::path::Path;
use std::path::PathBuf;

use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::paste::PastePolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RawComposerConfig {
    paste_max_inline_chars: Option<usize>,
    paste_max_inline_lines: Option<usize>,
    history_capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComposerConfig {
    pub paste_policy: PastePolicy,
    pub history_capacity: usize,
}

impl Default for ResolvedComposerConfig {
    fn default() -> Self {
        Self {
            paste_policy: PastePolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Load and resolve the composer configuration from the standard locations.
/// Missing files resolve to defaults; malformed files are errors.
pub fn resolve_composer_config() -> io::Result<ResolvedComposerConfig> {
    resolve_composer_config_from(&default_system_config_path(), &find_composer_home()?)
}

fn resolve_composer_config_from(
    system_path: &Path,
    composer_home: &Path,
) -> io::Result<ResolvedComposerConfig> {
    let mut raw = RawComposerConfig::default();
    apply_config_layer_from_file(&mut raw, system_path)?;
    apply_config_layer_from_file(&mut raw, &composer_home.join("config.toml"))?;

    let defaults = PastePolicy::default();
    Ok(ResolvedComposerConfig {
        paste_policy: PastePolicy {
            max_inline_chars: raw.paste_max_inline_chars.unwrap_or(defaults.max_inline_chars),
            max_inline_lines: raw.paste_max_inline_lines.unwrap_or(defaults.max_inline_lines),
        },
        history_capacity: raw.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY),
    })
}

fn find_composer_home() -> io::Result<PathBuf> {
    if let Ok(val) = std::env::var("PROMPT_COMPOSER_HOME")
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }

    let mut p = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find home directory"))?;
    p.push(".prompt-composer");
    Ok(p)
}

fn default_system_config_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/etc/prompt-composer/config.toml")
    }
    #[cfg(not(unix))]
    {
        PathBuf::new()
    }
}

fn apply_config_layer_from_file(config: &mut RawComposerConfig, path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(io::Error::new(
                err.kind(),
                format!("Failed to read config file {}: {err}", path.display()),
            ));
        }
    };

    let doc = contents.parse::<DocumentMut>().map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Error parsing config file {}: {err}", path.display()),
        )
    })?;

    apply_config_layer_from_doc(config, &doc)
}

fn apply_config_layer_from_doc(config: &mut RawComposerConfig, doc: &DocumentMut) -> io::Result<()> {
    if let Some(item) = doc.get("paste_max_inline_chars") {
        config.paste_max_inline_chars = Some(read_usize(item, "paste_max_inline_chars")?);
    }
    if let Some(item) = doc.get("paste_max_inline_lines") {
        config.paste_max_inline_lines = Some(read_usize(item, "paste_max_inline_lines")?);
    }
    if let Some(item) = doc.get("history_capacity") {
        config.history_capacity = Some(read_usize(item, "history_capacity")?);
    }
    Ok(())
}

fn read_usize(item: &TomlItem, field: &str) -> io::Result<usize> {
    item.as_value()
        .and_then(|value| value.as_integer())
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("config field `{field}` must be a non-negative integer"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_layer(contents: &str) -> io::Result<RawComposerConfig> {
        let mut config = RawComposerConfig::default();
        let doc = contents
            .parse::<DocumentMut>()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        apply_config_layer_from_doc(&mut config, &doc)?;
        Ok(config)
    }

    #[test]
    fn missing_files_resolve_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolved =
            resolve_composer_config_from(&dir.path().join("nope.toml"), dir.path())
                .expect("resolve");
        assert_eq!(resolved, ResolvedComposerConfig::default());
    }

    #[test]
    fn user_layer_overrides_system_layer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let system = dir.path().join("system.toml");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).expect("mkdir");
        std::fs::write(&system, "paste_max_inline_chars = 100\nhistory_capacity = 50\n")
            .expect("write system");
        std::fs::write(home.join("config.toml"), "paste_max_inline_chars = 200\n")
            .expect("write user");

        let resolved = resolve_composer_config_from(&system, &home).expect("resolve");
        assert_eq!(resolved.paste_policy.max_inline_chars, 200);
        assert_eq!(resolved.paste_policy.max_inline_lines, 5);
        assert_eq!(resolved.history_capacity, 50);
    }

    #[test]
    fn non_integer_field_is_rejected() {
        let err = parse_layer("paste_max_inline_lines = \"many\"\n")
            .expect_err("should reject string value");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn unrelated_fields_are_ignored() {
        let config = parse_layer("something_else = true\n").expect("parse");
        assert_eq!(config, RawComposerConfig::default());
    }
}
