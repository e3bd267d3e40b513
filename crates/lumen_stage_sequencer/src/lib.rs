// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport section sequencer for the Lumen site.
//!
//! This crate moves a full-viewport stage discretely between sections:
//! - Wheel, touch and keyboard input normalized into intents
//! - A single-flight transition lock with timed release
//! - Boundary rules handing control back to native scrolling
//! - Viewed-section tracking and direction resolution
//! - An egui stage panel that animates enter/exit transitions
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - [`InputNormalizer`] turning raw events into [`Intent`]s
//! - [`BoundaryPolicy`] deciding consume vs pass-through
//! - [`TransitionLock`] serializing transitions
//! - [`SequenceState`] owning the active index and viewed set

pub mod boundary;
pub mod config;
pub mod error;
pub mod input;
pub mod intent;
pub mod lock;
pub mod sequencer;
pub mod state;
pub mod ui;

pub use boundary::{
    BoundaryDecision, BoundaryPolicy, Edge, ExitGate, NestedScrollContext, NestedScrollSource,
    SharedScrollState,
};
pub use config::{ConfigFormat, SequencerConfig};
pub use error::{Result, SequencerError};
pub use input::{InputChannels, InputNormalizer, NavKey, RawInput};
pub use intent::{Direction, Intent};
pub use lock::TransitionLock;
pub use sequencer::{InputOutcome, Sequencer, SequencerId, SequencerSnapshot};
pub use state::{Section, SectionChange, SequenceState};
pub use ui::{SectionFrame, SectionHost, SectionRole, StageInput, StagePanel, StageResponse, StageTransition};
