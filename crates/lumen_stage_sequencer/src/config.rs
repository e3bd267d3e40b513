// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer configuration.
//!
//! Every stage on the site is tuned through the same handful of knobs:
//! - Section count and the section shown first
//! - Swipe distance and touch debounce
//! - Transition length (how long the lock is held)
//! - Wheel jitter floor and nested panel tolerance
//! - Exit gate policy for the last section
//! - Which input channels are listened to
//!
//! Configs are stored as RON (preferred) or JSON.

use crate::boundary::ExitGate;
use crate::error::{Result, SequencerError};
use crate::input::InputChannels;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default minimum swipe distance, in pixels
pub const DEFAULT_SWIPE_THRESHOLD_PX: f32 = 50.0;
/// Default minimum time between accepted touch gestures
pub const DEFAULT_TOUCH_DEBOUNCE_MS: u64 = 800;
/// Default time the transition lock is held
pub const DEFAULT_TRANSITION_DURATION_MS: u64 = 800;
/// Default smallest wheel delta that counts as navigation
pub const DEFAULT_WHEEL_FLOOR_PX: f32 = 1.0;
/// Default scroll offset under which a nested panel counts as "at top"
pub const DEFAULT_NESTED_TOP_TOLERANCE_PX: f32 = 10.0;

const MAX_DURATION_MS: u64 = 10_000;

/// Tunables for one sequencer instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Number of sections in the stage
    pub section_count: usize,
    /// Section active on mount
    pub initial_index: usize,
    /// Swipe distance that must be exceeded to navigate
    pub swipe_threshold_px: f32,
    /// Minimum interval between accepted touch gestures
    pub touch_debounce_ms: u64,
    /// How long a transition holds the lock
    pub transition_duration_ms: u64,
    /// Wheel deltas below this magnitude are treated as jitter
    pub wheel_floor_px: f32,
    /// Nested panels scrolled further than this are not at their top
    pub nested_top_tolerance_px: f32,
    /// Whether the last section releases control right away
    pub exit_gate: ExitGate,
    /// Enabled input channels
    pub channels: InputChannels,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            section_count: 2,
            initial_index: 0,
            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
            touch_debounce_ms: DEFAULT_TOUCH_DEBOUNCE_MS,
            transition_duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            wheel_floor_px: DEFAULT_WHEEL_FLOOR_PX,
            nested_top_tolerance_px: DEFAULT_NESTED_TOP_TOLERANCE_PX,
            exit_gate: ExitGate::default(),
            channels: InputChannels::default(),
        }
    }
}

impl SequencerConfig {
    /// Create a config for a stage with `section_count` sections
    pub fn new(section_count: usize) -> Self {
        Self {
            section_count,
            ..Self::default()
        }
    }

    /// Set the transition length
    pub fn with_transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration_ms = duration_ms(duration);
        self
    }

    /// Set the touch debounce interval
    pub fn with_touch_debounce(mut self, debounce: Duration) -> Self {
        self.touch_debounce_ms = duration_ms(debounce);
        self
    }

    /// Set the swipe threshold
    pub fn with_swipe_threshold(mut self, px: f32) -> Self {
        self.swipe_threshold_px = px;
        self
    }

    /// Set the exit gate policy
    pub fn with_exit_gate(mut self, gate: ExitGate) -> Self {
        self.exit_gate = gate;
        self
    }

    /// Set the section shown first
    pub fn with_initial_index(mut self, index: usize) -> Self {
        self.initial_index = index;
        self
    }

    /// Set the enabled input channels
    pub fn with_channels(mut self, channels: InputChannels) -> Self {
        self.channels = channels;
        self
    }

    /// Transition length as a `Duration`
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    /// Touch debounce as a `Duration`
    pub fn touch_debounce(&self) -> Duration {
        Duration::from_millis(self.touch_debounce_ms)
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.section_count == 0 {
            return Err(SequencerError::InvalidSectionCount(self.section_count));
        }
        if self.initial_index >= self.section_count {
            return Err(SequencerError::InitialIndexOutOfRange {
                index: self.initial_index,
                count: self.section_count,
            });
        }
        check_duration("transition_duration_ms", self.transition_duration_ms, 1)?;
        check_duration("touch_debounce_ms", self.touch_debounce_ms, 0)?;
        check_threshold("swipe_threshold_px", self.swipe_threshold_px)?;
        check_threshold("wheel_floor_px", self.wheel_floor_px)?;
        check_threshold("nested_top_tolerance_px", self.nested_top_tolerance_px)?;
        Ok(())
    }

    /// Parse a RON config
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parse a JSON config
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = match ConfigFormat::from_path(path)? {
            ConfigFormat::Ron => Self::from_ron_str(&source)?,
            ConfigFormat::Json => Self::from_json_str(&source)?,
        };
        tracing::info!(
            "Loaded sequencer config from {:?} ({} sections)",
            path,
            config.section_count
        );
        Ok(config)
    }

    /// Save a config file, choosing the format from its extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Ron => self.to_ron_string()?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// On-disk config formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Rusty Object Notation
    Ron,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("ron") => Ok(ConfigFormat::Ron),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(SequencerError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn check_duration(name: &'static str, value: u64, min: u64) -> Result<()> {
    if (min..=MAX_DURATION_MS).contains(&value) {
        Ok(())
    } else {
        Err(SequencerError::InvalidDuration {
            name,
            value,
            min,
            max: MAX_DURATION_MS,
        })
    }
}

fn check_threshold(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SequencerError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = SequencerConfig::default();
        assert_eq!(config.section_count, 2);
        assert_eq!(config.swipe_threshold_px, 50.0);
        assert_eq!(config.touch_debounce(), Duration::from_millis(800));
        assert_eq!(config.transition_duration(), Duration::from_millis(800));
        assert_eq!(config.exit_gate, ExitGate::AfterAllViewed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = SequencerConfig::new(5)
            .with_transition_duration(Duration::from_millis(1000))
            .with_exit_gate(ExitGate::Immediate);
        let ron_str = config.to_ron_string().unwrap();
        let loaded = SequencerConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SequencerConfig::from_ron_str("(section_count: 4)").unwrap();
        assert_eq!(config.section_count, 4);
        assert_eq!(config.touch_debounce_ms, DEFAULT_TOUCH_DEBOUNCE_MS);
        assert!(config.channels.touch);
    }

    #[test]
    fn test_json_config() {
        let config = SequencerConfig::from_json_str(
            r#"{ "section_count": 3, "exit_gate": "Immediate", "channels": { "wheel": false } }"#,
        )
        .unwrap();
        assert_eq!(config.section_count, 3);
        assert_eq!(config.exit_gate, ExitGate::Immediate);
        assert!(!config.channels.wheel);
        assert!(config.channels.keyboard);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            SequencerConfig::new(0).validate(),
            Err(SequencerError::InvalidSectionCount(0))
        ));
        assert!(matches!(
            SequencerConfig::new(3).with_initial_index(3).validate(),
            Err(SequencerError::InitialIndexOutOfRange { index: 3, count: 3 })
        ));
        assert!(matches!(
            SequencerConfig::new(3)
                .with_transition_duration(Duration::ZERO)
                .validate(),
            Err(SequencerError::InvalidDuration { .. })
        ));
        assert!(matches!(
            SequencerConfig::new(3).with_swipe_threshold(f32::NAN).validate(),
            Err(SequencerError::InvalidThreshold { .. })
        ));
        assert!(SequencerConfig::from_ron_str("(section_count: 0)").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("stage.RON")).unwrap(),
            ConfigFormat::Ron
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("stage.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(&PathBuf::from("stage.toml")),
            Err(SequencerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lumen_stage_{}.ron", uuid::Uuid::new_v4()));
        let config = SequencerConfig::new(6).with_initial_index(2);
        config.save(&path).unwrap();
        let loaded = SequencerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
