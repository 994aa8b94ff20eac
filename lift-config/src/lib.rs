//! Shared configuration loader for the lift toolchain.
//!
//! `defaults/lift.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`LiftConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use lift_parser::lift::lexicon::{MatchKind, SearchField};
use lift_parser::lift::loader::{LoadOptions, SaveOptions};
use lift_parser::LiftVersion;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/lift.default.toml");

/// Top-level configuration consumed by lift applications.
#[derive(Debug, Clone, Deserialize)]
pub struct LiftConfig {
    pub format: FormatConfig,
    pub load: LoadConfig,
    pub display: DisplayConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    pub default_version: VersionSetting,
    pub producer: String,
}

/// Format revisions accepted in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum VersionSetting {
    #[serde(rename = "0.13")]
    V0_13,
    #[serde(rename = "0.15")]
    V0_15,
}

impl From<VersionSetting> for LiftVersion {
    fn from(setting: VersionSetting) -> Self {
        match setting {
            VersionSetting::V0_13 => LiftVersion::V0_13,
            VersionSetting::V0_15 => LiftVersion::V0_15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    pub resolve_external_ranges: bool,
    pub strict_dates: bool,
}

/// Column layout of summary lines.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    pub gloss_language: String,
    pub headword_width: usize,
    pub gloss_width: usize,
}

/// Defaults for `lift find`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub field: String,
    pub kind: SearchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchKind {
    Contains,
    Exact,
    Regex,
}

impl From<SearchKind> for MatchKind {
    fn from(kind: SearchKind) -> Self {
        match kind {
            SearchKind::Contains => MatchKind::Contains,
            SearchKind::Exact => MatchKind::Exact,
            SearchKind::Regex => MatchKind::Regex,
        }
    }
}

impl LiftConfig {
    pub fn default_version(&self) -> LiftVersion {
        self.format.default_version.into()
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict_dates: self.load.strict_dates,
            resolve_external_ranges: self.load.resolve_external_ranges,
        }
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            producer: Some(self.format.producer.trim())
                .filter(|producer| !producer.is_empty())
                .map(str::to_string),
        }
    }

    pub fn search_field(&self) -> SearchField {
        SearchField::from(self.search.field.as_str())
    }
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

    /// Layer a file that may not exist, such as a project's `lift.toml`.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, e.g. `display.gloss_language`. Values given as text are
    /// converted when the configuration is deserialized.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<LiftConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<LiftConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.default_version(), LiftVersion::V0_13);
        assert_eq!(config.display.gloss_language, "en");
        assert_eq!(config.display.headword_width, 20);
        assert_eq!(config.load_options(), LoadOptions::default());
        assert_eq!(config.save_options().producer, None);
        assert_eq!(config.search_field(), SearchField::Gloss);
        assert_eq!(MatchKind::from(config.search.kind), MatchKind::Contains);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("format.default_version", "0.15")
            .expect("override to apply")
            .set_override("format.producer", "WeSay 1.6")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.default_version(), LiftVersion::V0_15);
        assert_eq!(config.save_options().producer.as_deref(), Some("WeSay 1.6"));
    }

    #[test]
    fn layers_user_files() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[display]\ngloss_language = \"pt\"\n[load]\nstrict_dates = true")
            .expect("write");
        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.display.gloss_language, "pt");
        assert_eq!(config.display.gloss_width, 30);
        assert!(config.load_options().strict_dates);
    }

    #[test]
    fn rejects_unknown_versions() {
        let result = Loader::new()
            .set_override("format.default_version", "1.0")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn text_overrides_convert_to_field_types() {
        let config = Loader::new()
            .set_override("display.headword_width", "12")
            .expect("override to apply")
            .set_override("load.strict_dates", "true")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.display.headword_width, 12);
        assert!(config.load_options().strict_dates);
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/lift.toml")
            .build()
            .expect("config to build");
        assert!(config.load.resolve_external_ranges);
    }
}
