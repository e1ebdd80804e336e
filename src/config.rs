//! Landing page configuration
//!
//! Loads and validates the YAML configuration. Every field has a default, so
//! an empty file (or no file at all) yields the stock LandMine page.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::section::{SectionId, REVEALED_CLASS, SECTION_CLASS};

/// Fraction of a section's area that must be on screen before it is revealed
pub const DEFAULT_REVEAL_THRESHOLD: f64 = 0.25;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LANDING_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/landing.yaml";

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Reveal threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Section ids must not be empty")]
    EmptySectionId,

    #[error("Duplicate section id: {0}")]
    DuplicateSection(String),

    #[error("Class name for '{0}' must not be empty")]
    EmptyClassName(&'static str),
}

/// How the scroll animation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
    Auto,
}

/// Where the target lands inside the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollOptions {
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

/// CSS classes for the default and revealed section states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub section: String,
    pub revealed: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            section: SECTION_CLASS.to_string(),
            revealed: REVEALED_CLASS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub reveal_threshold: f64,
    pub scroll: ScrollOptions,
    pub classes: ClassNames,
    /// Observed sections in render order
    pub sections: Vec<SectionId>,
    pub brand: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
            scroll: ScrollOptions::default(),
            classes: ClassNames::default(),
            sections: ["hero", "sample", "about", "docs", "cta"]
                .into_iter()
                .map(SectionId::from)
                .collect(),
            brand: "LandMine".to_string(),
        }
    }
}

impl LandingConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(source: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(source).context("Failed to parse landing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.reveal_threshold;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        if self.classes.section.trim().is_empty() {
            return Err(ConfigError::EmptyClassName("section"));
        }
        if self.classes.revealed.trim().is_empty() {
            return Err(ConfigError::EmptyClassName("revealed"));
        }

        let mut seen = HashSet::new();
        for id in &self.sections {
            if id.is_empty() {
                return Err(ConfigError::EmptySectionId);
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::DuplicateSection(id.to_string()));
            }
        }

        Ok(())
    }
}

pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Loader that always yields the built-in defaults
    pub fn defaults() -> Self {
        Self { path: None }
    }

    /// Create loader from LANDING_CONFIG or `config/landing.yaml`
    ///
    /// Path resolution order:
    /// 1. LANDING_CONFIG environment variable (explicit override)
    /// 2. Relative `config/landing.yaml` (works when running from the repo root)
    /// 3. Built-in defaults
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::new(path);
        }

        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::new(DEFAULT_CONFIG_PATH);
        }

        Self::defaults()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<LandingConfig> {
        let Some(path) = &self.path else {
            debug!("No landing config file, using defaults");
            return Ok(LandingConfig::default());
        };

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read landing config {}", path.display()))?;
        let config = LandingConfig::from_yaml(&source)
            .with_context(|| format!("Invalid landing config {}", path.display()))?;

        info!(
            path = %path.display(),
            sections = config.sections.len(),
            threshold = config.reveal_threshold,
            "Loaded landing config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_stock_page() {
        let config = LandingConfig::default();
        assert_eq!(config.reveal_threshold, 0.25);
        assert_eq!(config.scroll.behavior, ScrollBehavior::Smooth);
        assert_eq!(config.scroll.block, ScrollBlock::Start);
        assert_eq!(config.classes.revealed, "lp-section-visible");
        assert_eq!(config.sections.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = LandingConfig::from_yaml("brand: Sweep\nscroll:\n  block: center\n")
            .expect("valid yaml");
        assert_eq!(config.brand, "Sweep");
        assert_eq!(config.scroll.block, ScrollBlock::Center);
        assert_eq!(config.scroll.behavior, ScrollBehavior::Smooth);
        assert_eq!(config.reveal_threshold, DEFAULT_REVEAL_THRESHOLD);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            LandingConfig::from_yaml("").expect("empty is valid"),
            LandingConfig::default()
        );
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = LandingConfig::default();
        config.reveal_threshold = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(0.0)));

        config.reveal_threshold = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(1.5)));

        config.reveal_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let err = LandingConfig::from_yaml("sections: [hero, about, hero]\n")
            .expect_err("duplicate ids");
        let config_err = err.downcast_ref::<ConfigError>().expect("config error");
        assert_eq!(config_err, &ConfigError::DuplicateSection("hero".into()));
    }

    #[test]
    fn test_blank_class_rejected() {
        let mut config = LandingConfig::default();
        config.classes.revealed = " ".into();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyClassName("revealed"))
        );
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "reveal_threshold: 0.5\nsections: [hero, docs]").expect("write");

        let config = ConfigLoader::new(file.path()).load().expect("load");
        assert_eq!(config.reveal_threshold, 0.5);
        assert_eq!(
            config.sections,
            vec![SectionId::from("hero"), SectionId::from("docs")]
        );
    }

    #[test]
    fn test_loader_missing_file_errors() {
        let loader = ConfigLoader::new("/nonexistent/landing.yaml");
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_loader_without_path_uses_defaults() {
        let config = ConfigLoader::defaults().load().expect("defaults");
        assert_eq!(config, LandingConfig::default());
    }
}
