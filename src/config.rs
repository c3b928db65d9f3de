//! Parse options, optionally loaded from a TOML file.
//!
//! The file is optional: a missing or empty file yields
//! `ParseOptions::default()`. Unknown keys are accepted but logged, since
//! they are usually typos.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::xml::DEFAULT_MAX_DEPTH;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in options file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Options file exceeds maximum allowed size.
    #[error("Options file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Options
// ============================================================================

/// Switches that change how a document is parsed.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Skip unknown elements and extensions instead of capturing them.
    pub skip_unknown_elements: bool,

    /// Keep the format-specific tree for callers that translate it further.
    /// The engine itself always returns that tree.
    pub keep_original_tree: bool,

    /// Maximum element nesting depth.
    pub max_depth: usize,

    /// Resolve relative URIs against `xml:base`.
    pub resolve_xml_base: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            skip_unknown_elements: false,
            keep_original_tree: false,
            max_depth: DEFAULT_MAX_DEPTH,
            resolve_xml_base: true,
        }
    }
}

impl ParseOptions {
    /// SEC-014: Maximum options file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "skip_unknown_elements",
        "keep_original_tree",
        "max_depth",
        "resolve_xml_base",
    ];

    pub fn with_skip_unknown_elements(mut self, skip: bool) -> Self {
        self.skip_unknown_elements = skip;
        self
    }

    pub fn with_keep_original_tree(mut self, keep: bool) -> Self {
        self.keep_original_tree = keep;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_xml_base(mut self, resolve: bool) -> Self {
        self.resolve_xml_base = resolve;
        self
    }

    /// Load options from a TOML file.
    ///
    /// - Missing file → `Ok(ParseOptions::default())`
    /// - Empty file → `Ok(ParseOptions::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Options file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No options file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Options file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Options file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in options file, ignoring");
                }
            }
        }

        let options: ParseOptions = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), ?options, "Loaded parse options");
        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(test: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedloom_options_{test}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("options.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(!options.skip_unknown_elements);
        assert!(!options.keep_original_tree);
        assert_eq!(options.max_depth, 256);
        assert!(options.resolve_xml_base);
    }

    #[test]
    fn test_builder_setters() {
        let options = ParseOptions::default()
            .with_skip_unknown_elements(true)
            .with_keep_original_tree(true)
            .with_max_depth(8)
            .with_xml_base(false);
        assert_eq!(
            options,
            ParseOptions {
                skip_unknown_elements: true,
                keep_original_tree: true,
                max_depth: 8,
                resolve_xml_base: false,
            }
        );
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedloom_test_nonexistent_options.toml");
        assert_eq!(ParseOptions::load(path).unwrap(), ParseOptions::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_temp("whitespace", "   \n  \n  ");
        assert_eq!(ParseOptions::load(&path).unwrap(), ParseOptions::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing() {
        let path = write_temp("partial", "skip_unknown_elements = true\n");
        let options = ParseOptions::load(&path).unwrap();
        assert!(options.skip_unknown_elements);
        assert_eq!(options.max_depth, 256);
        assert!(options.resolve_xml_base);
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_temp("unknown", "max_depth = 32\ntotally_fake_key = 1\n");
        let options = ParseOptions::load(&path).unwrap();
        assert_eq!(options.max_depth, 32);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_temp("invalid", "this is not [valid toml");
        let err = ParseOptions::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_temp("wrongtype", "max_depth = \"deep\"\n");
        assert!(ParseOptions::load(&path).is_err());
        cleanup(&path);
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let path = write_temp("too_large", &"a".repeat(1_048_577));
        let err = ParseOptions::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }
}
