//! Text flow configuration.
//!
//! Settings are read from the `[textflow]` section of `rune.toml`, with
//! environment variables taking precedence for quick overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root of `rune.toml` as far as text flow is concerned.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuneConfig {
    pub textflow: FlowConfig,
}

/// Text flow settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Line breaking and geometry settings
    pub layout: LayoutConfig,
    /// Font database settings
    pub fonts: FontConfig,
}

/// Line breaking and geometry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// A scan run narrower than this many line heights falls back to
    /// breaking between any two characters when a word does not fit.
    pub narrow_scanrun_factor: f32,
    /// Flattening tolerance for wrap shapes and text-on-path curves.
    pub flatten_tolerance: f32,
    /// Tolerance used when comparing widths against scan runs.
    pub epsilon: f32,
    /// Upper bound on re-laying a line with a taller line box.
    pub max_height_retries: u32,
}

/// Font database settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    /// Extra directories scanned for font files
    pub font_dirs: Vec<PathBuf>,
    /// Load the fonts installed on the system
    pub load_system_fonts: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            narrow_scanrun_factor: 4.0,
            flatten_tolerance: 0.1,
            epsilon: 1e-3,
            max_height_retries: 64,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_dirs: Vec::new(),
            load_system_fonts: true,
        }
    }
}

impl FlowConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse the `[textflow]` section out of a `rune.toml` document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let root: RuneConfig = toml::from_str(content)?;
        Ok(root.textflow)
    }

    /// Load configuration from `rune.toml` in the current directory, or the
    /// defaults if it is missing or invalid.
    pub fn load_or_default() -> Self {
        match Self::load_from_file("rune.toml") {
            Ok(config) => config,
            Err(ConfigError::Io(_)) => Self::default(),
            Err(err) => {
                tracing::warn!(%err, "ignoring invalid rune.toml");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables.
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_TEXTFLOW_NARROW_FACTOR") {
            if let Ok(factor) = val.parse::<f32>() {
                self.layout.narrow_scanrun_factor = factor;
            }
        }
        if let Ok(val) = std::env::var("RUNE_TEXTFLOW_PATH_TOLERANCE") {
            if let Ok(tol) = val.parse::<f32>() {
                self.layout.flatten_tolerance = tol;
            }
        }
        if let Ok(dir) = std::env::var("RUNE_TEXTFLOW_FONT_DIR") {
            self.fonts.font_dirs.push(PathBuf::from(dir));
        }
        if let Ok(val) = std::env::var("RUNE_TEXTFLOW_SYSTEM_FONTS") {
            self.fonts.load_system_fonts = val == "1" || val.eq_ignore_ascii_case("true");
        }
    }

    /// Load from file and apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.layout.narrow_scanrun_factor, 4.0);
        assert!(config.fonts.load_system_fonts);
    }

    #[test]
    fn parses_partial_section() {
        let config = FlowConfig::from_toml(
            r#"
            [textflow.layout]
            narrow_scanrun_factor = 2.5

            [textflow.fonts]
            font_dirs = ["/opt/fonts"]
            load_system_fonts = false
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.narrow_scanrun_factor, 2.5);
        assert_eq!(config.layout.flatten_tolerance, 0.1);
        assert_eq!(config.fonts.font_dirs, vec![PathBuf::from("/opt/fonts")]);
        assert!(!config.fonts.load_system_fonts);
    }

    #[test]
    fn unrelated_sections_are_ignored() {
        let config = FlowConfig::from_toml("[rendering]\nuse_intermediate = true\n").unwrap();
        assert_eq!(config, FlowConfig::default());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = FlowConfig::from_toml("[textflow.layout\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
