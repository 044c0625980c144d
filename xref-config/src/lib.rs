//! Shared configuration loader for the xref toolchain.
//!
//! `defaults/xref.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`XrefConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/xref.default.toml");

/// Top-level configuration consumed by xref applications.
#[derive(Debug, Clone, Deserialize)]
pub struct XrefConfig {
    pub extraction: ExtractionConfig,
    pub resolution: ResolutionConfig,
}

/// Knobs for the extraction engine.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub include_whole_files: bool,
    pub content_id_width: usize,
}

/// Knobs for target path resolution and suggestion generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionConfig {
    /// Empty string means "derive from the processed document's directory"
    pub root_dir: String,
    pub suggestion_threshold: f32,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<XrefConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<XrefConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(!config.extraction.include_whole_files);
        assert_eq!(config.extraction.content_id_width, 16);
        assert_eq!(config.resolution.suggestion_threshold, 0.5);
        assert!(config.resolution.root_dir.is_empty());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("extraction.include_whole_files", true)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.extraction.include_whole_files);
    }
}
