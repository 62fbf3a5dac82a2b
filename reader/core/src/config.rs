//! Configuration
//!
//! Reader configuration with layered sources, highest priority first:
//! environment variables, then a TOML file at
//! `~/.config/arcana/reader.toml`, then defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [generation]
//! model = "gemini-2.0-flash"
//!
//! [deck]
//! id = "classic"
//!
//! [pacing]
//! type_interval_ms = 20
//! shuffle_delay_ms = 2000
//! beat_delay_ms = 1200
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Reader configuration, fully resolved
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Model identifier for the text backend
    pub model: String,
    /// Deck identity to load cards for
    pub deck_id: String,
    /// Per-character reveal interval in milliseconds
    pub type_interval_ms: u64,
    /// Cosmetic shuffle delay in milliseconds
    pub shuffle_delay_ms: u64,
    /// Pause between reveal beats in milliseconds
    pub beat_delay_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            deck_id: "classic".to_string(),
            type_interval_ms: 20,
            shuffle_delay_ms: 2000,
            beat_delay_ms: 1200,
        }
    }
}

impl ReaderConfig {
    /// Resolve configuration from environment variables over defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve(&ReaderToml::default())
    }

    /// Resolve configuration: environment variables over `file` over defaults
    #[must_use]
    pub fn resolve(file: &ReaderToml) -> Self {
        let defaults = Self::default();

        Self {
            model: env_string("ARCANA_MODEL")
                .or_else(|| file.generation.model.clone())
                .unwrap_or(defaults.model),
            deck_id: env_string("ARCANA_DECK")
                .or_else(|| file.deck.id.clone())
                .unwrap_or(defaults.deck_id),
            type_interval_ms: env_u64("ARCANA_TYPE_INTERVAL_MS")
                .or(file.pacing.type_interval_ms)
                .unwrap_or(defaults.type_interval_ms),
            shuffle_delay_ms: env_u64("ARCANA_SHUFFLE_DELAY_MS")
                .or(file.pacing.shuffle_delay_ms)
                .unwrap_or(defaults.shuffle_delay_ms),
            beat_delay_ms: env_u64("ARCANA_BEAT_DELAY_MS")
                .or(file.pacing.beat_delay_ms)
                .unwrap_or(defaults.beat_delay_ms),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Top-level TOML configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderToml {
    /// Generation section
    pub generation: GenerationToml,
    /// Deck section
    pub deck: DeckToml,
    /// Pacing section
    pub pacing: PacingToml,
}

/// Generation section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationToml {
    /// Model identifier
    pub model: Option<String>,
}

/// Deck section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckToml {
    /// Deck identity
    pub id: Option<String>,
}

/// Pacing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingToml {
    /// Per-character reveal interval in milliseconds
    pub type_interval_ms: Option<u64>,
    /// Cosmetic shuffle delay in milliseconds
    pub shuffle_delay_ms: Option<u64>,
    /// Pause between reveal beats in milliseconds
    pub beat_delay_ms: Option<u64>,
}

/// Default configuration file path (`$XDG_CONFIG_HOME/arcana/reader.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arcana").join("reader.toml"))
}

/// Load the TOML file at `path`; a missing file yields the empty default
pub fn load_config_from_path(path: &Path) -> Result<ReaderToml, ConfigError> {
    if !path.exists() {
        return Ok(ReaderToml::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

/// Load configuration from the default path (missing file yields defaults)
pub fn load_config() -> Result<ReaderToml, ConfigError> {
    match default_config_path() {
        Some(path) => load_config_from_path(&path),
        None => Ok(ReaderToml::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.deck_id, "classic");
        assert_eq!(config.type_interval_ms, 20);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file: ReaderToml = toml::from_str(
            r#"
            [generation]
            model = "gemini-2.5-flash"

            [pacing]
            type_interval_ms = 5
            "#,
        )
        .unwrap();

        let config = ReaderConfig::resolve(&file);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.type_interval_ms, 5);
        // Untouched values fall back to defaults
        assert_eq!(config.deck_id, "classic");
        assert_eq!(config.shuffle_delay_ms, 2000);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = load_config_from_path(&dir.path().join("nope.toml")).unwrap();
        assert!(file.generation.model.is_none());
        assert!(file.pacing.type_interval_ms.is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(&path, "[deck]\nid = \"lunar\"\n").unwrap();

        let file = load_config_from_path(&path).unwrap();
        assert_eq!(file.deck.id.as_deref(), Some("lunar"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        assert!(matches!(
            load_config_from_path(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
