//! Layout, playback and velocity settings.
//!
//! Settings are plain values handed to the components that need them. A YAML
//! file may override any subset of them:
//!
//! ```yaml
//! layout:
//!   max-chars-per-line: 48
//!   lines-per-page: 6
//! playback:
//!   tempo: 100
//!   loop-enabled: true
//! velocity:
//!   min: 40
//!   max: 127
//!   default: 90
//!   decay-ms: 300
//! ```

use crate::error::SheetError;
use crate::velocity::DEFAULT_VELOCITY;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub max_chars_per_line: usize,
    pub lines_per_page: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_chars_per_line: 48,
            lines_per_page: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Quarter-note beats per minute, used when the sheet does not set its own
    pub tempo: u32,
    pub loop_enabled: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo: 120,
            loop_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct VelocityConfig {
    pub min: u8,
    pub max: u8,
    /// Used when a note is struck with no anticipation signal
    pub default: u8,
    /// Anticipation time over which velocity falls about 63% of the way to `min`
    pub decay_ms: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min: 40,
            max: 127,
            default: DEFAULT_VELOCITY,
            decay_ms: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    pub layout: LayoutConfig,
    pub playback: PlaybackConfig,
    pub velocity: VelocityConfig,
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SheetError> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| SheetError::ConfigError(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), SheetError> {
        if self.layout.max_chars_per_line == 0 {
            return Err(SheetError::ConfigError(
                "max-chars-per-line must be positive".to_string(),
            ));
        }
        if self.layout.lines_per_page == 0 {
            return Err(SheetError::ConfigError(
                "lines-per-page must be positive".to_string(),
            ));
        }
        if self.playback.tempo == 0 {
            return Err(SheetError::ConfigError("tempo must be positive".to_string()));
        }

        let v = &self.velocity;
        if v.min > v.max || v.default < v.min || v.default > v.max {
            return Err(SheetError::ConfigError(format!(
                "velocity bounds must satisfy min <= default <= max (got {} <= {} <= {})",
                v.min, v.default, v.max
            )));
        }
        if !(v.decay_ms.is_finite() && v.decay_ms > 0.0) {
            return Err(SheetError::ConfigError(
                "velocity decay-ms must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_yaml_str("layout:\n  lines-per-page: 2\nplayback:\n  loop-enabled: true\n").unwrap();
        assert_eq!(config.layout.lines_per_page, 2);
        assert_eq!(config.layout.max_chars_per_line, 48);
        assert!(config.playback.loop_enabled);
        assert_eq!(config.playback.tempo, 120);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for yaml in [
            "layout:\n  max-chars-per-line: 0\n",
            "layout:\n  lines-per-page: 0\n",
            "playback:\n  tempo: 0\n",
            "velocity:\n  min: 100\n  max: 50\n",
            "velocity:\n  default: 10\n",
            "velocity:\n  decay-ms: 0\n",
            "playback:\n  speed: 2\n",
        ] {
            assert!(
                matches!(Config::from_yaml_str(yaml), Err(SheetError::ConfigError(_))),
                "accepted {:?}",
                yaml
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/sheetplay.yaml").unwrap_err();
        assert!(matches!(err, SheetError::Io { .. }));
    }
}
