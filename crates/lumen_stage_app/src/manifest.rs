// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage manifest - which stages the showroom page shows, in order.
//!
//! The manifest is a RON file listing named stages. Each stage carries
//! its sequencer tuning, the copy for its sections, and optionally the
//! section that embeds a freely scrolling panel.

use crate::app::{Result, ShowroomError};
use indexmap::IndexMap;
use lumen_stage_sequencer::{ExitGate, SequencerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the manifest path
pub const MANIFEST_ENV_VAR: &str = "LUMEN_STAGE_MANIFEST";

/// Manifest shipped next to the crate
pub const DEFAULT_MANIFEST_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/stage.ron");

/// Copy for one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Heading
    pub title: String,
    /// Short line under the heading
    #[serde(default)]
    pub tagline: String,
    /// Paragraphs of body copy
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl SectionSpec {
    fn new(title: &str, tagline: &str, paragraphs: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            tagline: tagline.to_string(),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// One sequenced stage on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Sequencer tuning; `section_count` follows `sections`
    #[serde(default)]
    pub sequencer: SequencerConfig,
    /// Sections in order
    pub sections: Vec<SectionSpec>,
    /// Section embedding a scrollable panel
    #[serde(default)]
    pub nested_section: Option<usize>,
    /// Native page content shown below the stage
    #[serde(default)]
    pub after: Vec<String>,
}

impl StageSpec {
    /// Sequencer config with the section count taken from the section list
    pub fn sequencer_config(&self) -> SequencerConfig {
        let mut config = self.sequencer.clone();
        if config.section_count != self.sections.len() {
            config.section_count = self.sections.len();
        }
        config
    }
}

/// Ordered set of named stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageManifest {
    /// Stages keyed by name, in page order
    pub stages: IndexMap<String, StageSpec>,
}

impl StageManifest {
    /// Parse a manifest from RON text
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let manifest: Self = ron::from_str(source)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let manifest = Self::from_ron_str(&source)?;
        tracing::info!("Loaded stage manifest {:?} ({} stages)", path, manifest.stages.len());
        Ok(manifest)
    }

    /// Serialize as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Write the manifest as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ron_string()?)?;
        tracing::info!("Saved stage manifest {:?}", path);
        Ok(())
    }

    /// Check every stage can build a sequencer
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(ShowroomError::InvalidManifest("no stages defined".to_string()));
        }
        for (name, stage) in &self.stages {
            stage
                .sequencer_config()
                .validate()
                .map_err(|e| ShowroomError::InvalidManifest(format!("stage '{name}': {e}")))?;
            if let Some(nested) = stage.nested_section {
                if nested >= stage.sections.len() {
                    return Err(ShowroomError::InvalidManifest(format!(
                        "stage '{name}': nested section {nested} does not exist"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Built-in showroom, used when no manifest file can be read
    pub fn showroom() -> Self {
        let mut stages = IndexMap::new();

        stages.insert(
            "hero".to_string(),
            StageSpec {
                sequencer: SequencerConfig::new(2),
                sections: vec![
                    SectionSpec::new("Lumen", "Light, shaped.", &[]),
                    SectionSpec::new(
                        "Designed around the room",
                        "Fixtures that disappear until you need them.",
                        &["Every Lumen fixture is drawn from the architecture it lives in."],
                    ),
                ],
                nested_section: None,
                after: vec!["Scroll to explore the collections.".to_string()],
            },
        );

        stages.insert(
            "voices".to_string(),
            StageSpec {
                sequencer: SequencerConfig::new(3),
                sections: vec![
                    SectionSpec::new("Studios", "What our partners say", &["\"The linear range made the gallery feel twice as tall.\""]),
                    SectionSpec::new(
                        "Case notes",
                        "Scroll the notes, then keep going",
                        &[
                            "Hotel lobby retrofit: 420 fixtures, dimmed to 2700K after dusk.",
                            "Library reading room: glare-free pendants over oak tables.",
                            "Restaurant: warm wash on brick, focused pools on each table.",
                            "Retail flagship: tunable white tracking daylight through the day.",
                            "Private residence: hidden coves along the stair.",
                            "Museum annex: conservation-grade spots for works on paper.",
                        ],
                    ),
                    SectionSpec::new("Services", "Lighting design, on site", &["From first sketch to final focus."]),
                ],
                nested_section: Some(1),
                after: vec!["Our workshop is open to visitors by appointment.".to_string()],
            },
        );

        stages.insert(
            "doors".to_string(),
            StageSpec {
                sequencer: SequencerConfig::new(3).with_exit_gate(ExitGate::Immediate),
                sections: vec![
                    SectionSpec::new("Closed", "Step inside", &[]),
                    SectionSpec::new("Ajar", "A warm line of light", &[]),
                    SectionSpec::new("Open", "The showroom", &[]),
                ],
                nested_section: None,
                after: vec![
                    "Contact: studio@lumen.example".to_string(),
                    "Lumen Lighting - all rights reserved.".to_string(),
                ],
            },
        );

        Self { stages }
    }
}

impl Default for StageManifest {
    fn default() -> Self {
        Self::showroom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_is_valid() {
        let manifest = StageManifest::showroom();
        assert!(manifest.validate().is_ok());
        assert_eq!(
            manifest.stages.keys().cloned().collect::<Vec<_>>(),
            vec!["hero", "voices", "doors"]
        );
    }

    #[test]
    fn test_serialization() {
        let manifest = StageManifest::showroom();
        let ron_str = manifest.to_ron_string().unwrap();
        let loaded = StageManifest::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lumen_stage_{}.ron", std::process::id()));
        let manifest = StageManifest::showroom();
        manifest.save(&path).unwrap();
        let loaded = StageManifest::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = StageManifest::load("/nonexistent/lumen/stage.ron");
        assert!(matches!(result, Err(ShowroomError::Io(_))));
    }

    #[test]
    fn test_shipped_manifest_parses() {
        let manifest = StageManifest::from_ron_str(include_str!("../stage.ron")).unwrap();
        assert!(manifest.stages.contains_key("hero"));
    }

    #[test]
    fn test_section_count_follows_sections() {
        let mut manifest = StageManifest::showroom();
        let hero = manifest.stages.get_mut("hero").unwrap();
        hero.sequencer.section_count = 9;
        assert_eq!(hero.sequencer_config().section_count, 2);
    }

    #[test]
    fn test_invalid_nested_section() {
        let mut manifest = StageManifest::showroom();
        manifest.stages.get_mut("hero").unwrap().nested_section = Some(4);
        assert!(matches!(manifest.validate(), Err(ShowroomError::InvalidManifest(_))));
    }

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(StageManifest::from_ron_str("(stages: {})").is_err());
    }
}
