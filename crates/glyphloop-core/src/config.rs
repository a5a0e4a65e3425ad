//! Configuration loading and typed config structures for Glyphloop.
//!
//! The canonical configuration lives in `glyphloop-config.yaml` at the
//! project root. Every block and field has a default, so an empty file (or
//! no file at all) yields a runnable session. A named `preset` replaces the
//! `session` block wholesale.

use std::path::Path;

use glyphloop_types::SessionParams;
use serde::Deserialize;

use crate::presets::Preset;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The `preset` name is not recognized.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Largest accepted population.
pub const MAX_AGENT_COUNT: usize = 20_000;

/// Top-level configuration.
///
/// Mirrors the structure of `glyphloop-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GlyphloopConfig {
    /// Session parameters (the recognized option surface).
    #[serde(default)]
    pub session: SessionParams,

    /// Frame and macro-tick timing.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Lexicon sizing.
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Optional preset name; replaces `session` when set.
    #[serde(default)]
    pub preset: Option<String>,
}

impl GlyphloopConfig {
    /// Load, resolve the preset, and validate a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::UnknownPreset`] or [`ConfigError::Invalid`] if the
    /// content is rejected.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Any error other than "file not found".
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse, resolve the preset, and validate a YAML string.
    ///
    /// An empty string is a valid, all-default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// the preset / validation errors of [`from_file`](Self::from_file).
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_preset()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the session block with the named preset, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] for an unrecognized name.
    pub fn apply_preset(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = &self.preset {
            let preset: Preset = name.parse()?;
            self.session = preset.params();
        }
        Ok(())
    }

    /// Reject values outside their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.session;
        if s.agent_count > MAX_AGENT_COUNT {
            return Err(ConfigError::Invalid {
                field: "session.agent_count",
                reason: format!("must be at most {MAX_AGENT_COUNT}, got {}", s.agent_count),
            });
        }
        unit("session.time_scope", s.time_scope)?;
        unit("session.dance", s.dance)?;
        unit("session.entrainment", s.entrainment)?;
        unit("session.ink_decay", s.ink_decay)?;
        unit("session.loop_threshold", s.loop_threshold)?;
        unit("session.speak_intensity", s.speak_intensity)?;
        positive("session.snapshot_interval", s.snapshot_interval)?;

        let d = &self.driver;
        positive("driver.frame_dt", d.frame_dt)?;
        positive("driver.max_frame_dt", d.max_frame_dt)?;
        positive("driver.macro_interval", d.macro_interval)?;
        if d.history_window == 0 {
            return Err(ConfigError::Invalid {
                field: "driver.history_window",
                reason: "must be at least 1".to_owned(),
            });
        }
        if !d.history_weight.is_finite() || d.history_weight < 0.0 {
            return Err(ConfigError::Invalid {
                field: "driver.history_weight",
                reason: format!("must be finite and non-negative, got {}", d.history_weight),
            });
        }
        if !d.run_seconds.is_finite() || d.run_seconds < 0.0 {
            return Err(ConfigError::Invalid {
                field: "driver.run_seconds",
                reason: format!("must be finite and non-negative, got {}", d.run_seconds),
            });
        }

        if self.lexicon.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "lexicon.capacity",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Driver timing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Nominal seconds per frame.
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f64,

    /// Wall-clock deltas above this are clamped before stepping.
    #[serde(default = "default_max_frame_dt")]
    pub max_frame_dt: f64,

    /// Simulated seconds between glyph generations.
    #[serde(default = "default_macro_interval")]
    pub macro_interval: f64,

    /// Snapshots in the history window for blended observables.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Rank-weight exponent for historical observables.
    #[serde(default = "default_history_weight")]
    pub history_weight: f64,

    /// Speak every Nth glyph automatically (0 = never).
    #[serde(default = "default_auto_speak_every")]
    pub auto_speak_every: u64,

    /// Wall-clock seconds the engine runs for (0 = until interrupted).
    #[serde(default = "default_run_seconds")]
    pub run_seconds: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_dt: default_frame_dt(),
            max_frame_dt: default_max_frame_dt(),
            macro_interval: default_macro_interval(),
            history_window: default_history_window(),
            history_weight: default_history_weight(),
            auto_speak_every: default_auto_speak_every(),
            run_seconds: default_run_seconds(),
        }
    }
}

/// Lexicon sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexiconConfig {
    /// Most distinct entries retained.
    #[serde(default = "default_lexicon_capacity")]
    pub capacity: usize,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            capacity: default_lexicon_capacity(),
        }
    }
}

fn unit(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be within [0, 1], got {v}"),
        })
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and positive, got {v}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_frame_dt() -> f64 {
    1.0 / 60.0
}

const fn default_max_frame_dt() -> f64 {
    0.05
}

const fn default_macro_interval() -> f64 {
    2.0
}

const fn default_history_window() -> usize {
    24
}

const fn default_history_weight() -> f64 {
    1.0
}

const fn default_auto_speak_every() -> u64 {
    3
}

const fn default_run_seconds() -> f64 {
    60.0
}

const fn default_lexicon_capacity() -> usize {
    200
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glyphloop_types::GrammarMode;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GlyphloopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.agent_count, 600);
        assert_eq!(config.lexicon.capacity, 200);
        assert!((config.driver.max_frame_dt - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = GlyphloopConfig::parse("").unwrap();
        assert_eq!(config, GlyphloopConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
session:
  agent_count: 300
  mode: recursive
  time_scope: 0.4
driver:
  macro_interval: 1.5
";
        let config = GlyphloopConfig::parse(yaml).unwrap();
        assert_eq!(config.session.agent_count, 300);
        assert_eq!(config.session.mode, GrammarMode::Recursive);
        assert!((config.session.time_scope - 0.4).abs() < f64::EPSILON);
        assert!((config.driver.macro_interval - 1.5).abs() < f64::EPSILON);
        // Untouched fields keep defaults.
        assert!((config.session.dance - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.driver.history_window, 24);
    }

    #[test]
    fn preset_replaces_session_block() {
        let yaml = r"
preset: first-contact
session:
  agent_count: 10
";
        let config = GlyphloopConfig::parse(yaml).unwrap();
        assert_eq!(config.session.agent_count, 720);
        assert_eq!(config.session.seed, 0x1F1F1);
        assert_eq!(config.session.mode, GrammarMode::Heptapod);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let result = GlyphloopConfig::parse("preset: nope\n");
        assert!(matches!(result, Err(ConfigError::UnknownPreset(name)) if name == "nope"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let result = GlyphloopConfig::parse("session:\n  speak_intensity: 1.5\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "session.speak_intensity",
                ..
            })
        ));
        let result = GlyphloopConfig::parse("lexicon:\n  capacity: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "lexicon.capacity",
                ..
            })
        ));
        let result = GlyphloopConfig::parse("driver:\n  macro_interval: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = GlyphloopConfig::parse("session: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("/nonexistent/glyphloop-config.yaml");
        let config = GlyphloopConfig::load_or_default(path).unwrap();
        assert_eq!(config, GlyphloopConfig::default());
        assert!(matches!(
            GlyphloopConfig::from_file(path),
            Err(ConfigError::Io { .. })
        ));
    }
}
