// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while building or configuring a sequencer.
//!
//! Runtime input never produces an error: malformed or badly timed events
//! are dropped silently. Only construction and configuration can fail.

use std::path::PathBuf;
use thiserror::Error;

/// Sequencer construction and configuration errors
#[derive(Debug, Error)]
pub enum SequencerError {
    /// A stage needs at least one section
    #[error("Section count must be at least 1, got {0}")]
    InvalidSectionCount(usize),

    /// Initial or restored active index does not name a section
    #[error("Section index {index} is out of range for {count} sections")]
    InitialIndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of sections in the stage
        count: usize,
    },

    /// A nested scroll panel was attached to a section that does not exist
    #[error("Nested panel attached to section {section}, but the stage has {count} sections")]
    NestedSectionOutOfRange {
        /// Section the panel was attached to
        section: usize,
        /// Number of sections in the stage
        count: usize,
    },

    /// A duration setting is outside its accepted range
    #[error("{name} must be within {min}..={max} ms, got {value} ms")]
    InvalidDuration {
        /// Setting name
        name: &'static str,
        /// Configured value
        value: u64,
        /// Smallest accepted value
        min: u64,
        /// Largest accepted value
        max: u64,
    },

    /// A pixel threshold is negative or not a number
    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidThreshold {
        /// Setting name
        name: &'static str,
        /// Configured value
        value: f32,
    },

    /// RON parse error
    #[error("Failed to parse RON config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Failed to write RON config: {0}")]
    RonWrite(#[from] ron::Error),

    /// JSON parse or write error
    #[error("Failed to process JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file with an extension we do not read
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;
