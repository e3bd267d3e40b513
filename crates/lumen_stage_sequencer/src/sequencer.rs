// SPDX-License-Identifier: MIT OR Apache-2.0
//! The sequencer: wires normalizer, boundary policy, lock and state together.
//!
//! Hosts feed raw events through [`Sequencer::handle_input`] and call
//! [`Sequencer::poll`] once per frame so the transition lock can release.
//! The returned [`InputOutcome`] tells the host whether to prevent the
//! event's native default.

use crate::boundary::{BoundaryDecision, BoundaryPolicy, NestedScrollSource};
use crate::config::SequencerConfig;
use crate::error::{Result, SequencerError};
use crate::input::{InputNormalizer, RawInput};
use crate::intent::{Direction, Intent};
use crate::lock::TransitionLock;
use crate::state::{Section, SectionChange, SequenceState};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Unique identifier for a sequencer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequencerId(pub Uuid);

impl SequencerId {
    /// Create a new random sequencer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequencerId {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Not ours; let native scrolling handle it
    PassThrough,
    /// Swallowed without a transition
    Dropped,
    /// Swallowed and moved to another section
    Transitioned(SectionChange),
    /// Belongs to the active section's nested panel; the page must not move
    NestedScroll,
}

impl InputOutcome {
    /// Whether the host must prevent the event's default action
    pub fn prevents_default(&self) -> bool {
        matches!(self, InputOutcome::Dropped | InputOutcome::Transitioned(_))
    }

    /// Whether the page around the stage must stay still
    pub fn holds_page(&self) -> bool {
        !matches!(self, InputOutcome::PassThrough)
    }

    /// The section change, if one happened
    pub fn change(&self) -> Option<SectionChange> {
        match self {
            InputOutcome::Transitioned(change) => Some(*change),
            _ => None,
        }
    }
}

/// Read-only view of a sequencer's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerSnapshot {
    /// Active section
    pub active_index: usize,
    /// Whether a transition is in flight
    pub is_transitioning: bool,
    /// When the last transition happened
    pub last_transition_at: Option<Instant>,
    /// Direction of the last transition
    pub direction: Direction,
    /// Viewed section indices
    pub viewed: Vec<usize>,
}

type ChangeCallback = Box<dyn FnMut(SectionChange)>;

/// Discrete section navigation for one full-viewport stage
pub struct Sequencer {
    id: SequencerId,
    config: SequencerConfig,
    normalizer: InputNormalizer,
    lock: TransitionLock,
    state: SequenceState,
    policy: BoundaryPolicy,
    /// Nested scroll panels keyed by the section that owns them
    nested: Vec<(usize, Box<dyn NestedScrollSource>)>,
    on_change: Option<ChangeCallback>,
    disposed: bool,
}

impl Sequencer {
    /// Create a sequencer from a validated config
    pub fn new(config: SequencerConfig) -> Result<Self> {
        config.validate()?;
        let state = SequenceState::new(config.section_count, config.initial_index)?;
        Ok(Self::from_parts(config, state))
    }

    /// Create a sequencer resuming at `active_index` with `viewed` sections already seen
    pub fn restore(config: SequencerConfig, active_index: usize, viewed: &[usize]) -> Result<Self> {
        config.validate()?;
        let state = SequenceState::restore(config.section_count, active_index, viewed)?;
        Ok(Self::from_parts(config, state))
    }

    fn from_parts(config: SequencerConfig, state: SequenceState) -> Self {
        let id = SequencerId::new();
        tracing::info!(
            sequencer = %id.0,
            "Sequencer created with {} sections, starting at {}",
            state.section_count(),
            state.active_index()
        );
        Self {
            id,
            normalizer: InputNormalizer::new(&config),
            lock: TransitionLock::new(config.transition_duration()),
            policy: BoundaryPolicy {
                exit_gate: config.exit_gate,
                nested_top_tolerance_px: config.nested_top_tolerance_px,
            },
            config,
            state,
            nested: Vec::new(),
            on_change: None,
            disposed: false,
        }
    }

    /// Attach a nested scroll panel to `section`
    pub fn with_nested_panel(
        mut self,
        section: usize,
        source: impl NestedScrollSource + 'static,
    ) -> Result<Self> {
        let count = self.state.section_count();
        if section >= count {
            return Err(SequencerError::NestedSectionOutOfRange { section, count });
        }
        self.nested.retain(|(owner, _)| *owner != section);
        self.nested.push((section, Box::new(source)));
        Ok(self)
    }

    /// Register the section-change callback
    pub fn on_section_change(mut self, callback: impl FnMut(SectionChange) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Instance ID
    pub fn id(&self) -> SequencerId {
        self.id
    }

    /// Config this sequencer was built from
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Active section index
    pub fn active_index(&self) -> usize {
        self.state.active_index()
    }

    /// Direction of the last transition
    pub fn direction(&self) -> Direction {
        self.state.direction()
    }

    /// Whether a transition is in flight
    pub fn is_transitioning(&self) -> bool {
        self.lock.is_held()
    }

    /// Number of sections
    pub fn section_count(&self) -> usize {
        self.state.section_count()
    }

    /// All sections with their viewed flags
    pub fn sections(&self) -> &[Section] {
        self.state.sections()
    }

    /// Whether every section has been viewed
    pub fn all_viewed(&self) -> bool {
        self.state.all_viewed()
    }

    /// Whether [`Sequencer::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            active_index: self.state.active_index(),
            is_transitioning: self.lock.is_held(),
            last_transition_at: self.state.last_transition_at(),
            direction: self.state.direction(),
            viewed: self.state.viewed_indices(),
        }
    }

    /// Time until the transition lock releases
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.lock.remaining(now)
    }

    /// The active section's nested panel, if it has one
    fn active_nested(&self) -> Option<&dyn NestedScrollSource> {
        let active = self.state.active_index();
        self.nested
            .iter()
            .find(|(owner, _)| *owner == active)
            .map(|(_, source)| source.as_ref())
    }

    /// Handle a raw input event
    pub fn handle_input(&mut self, input: RawInput, now: Instant) -> InputOutcome {
        if self.disposed {
            return InputOutcome::PassThrough;
        }
        let intent = self.normalizer.classify(input, now);
        self.handle_intent(intent, now)
    }

    /// Handle an already normalized intent
    pub fn handle_intent(&mut self, intent: Option<Intent>, now: Instant) -> InputOutcome {
        if self.disposed {
            return InputOutcome::PassThrough;
        }
        self.poll(now);

        let decision = self
            .policy
            .evaluate(intent, &self.state, self.lock.is_held(), self.active_nested());

        match (decision, intent) {
            (BoundaryDecision::Proceed, Some(intent)) => self.transition(intent, now),
            (BoundaryDecision::Hold, _) | (BoundaryDecision::Proceed, None) => {
                tracing::trace!(sequencer = %self.id.0, ?intent, "Intent held");
                InputOutcome::Dropped
            }
            (BoundaryDecision::NestedScroll, _) => {
                tracing::trace!(sequencer = %self.id.0, ?intent, "Intent left to nested panel");
                InputOutcome::NestedScroll
            }
            (BoundaryDecision::PassThrough, _) => {
                if intent.is_some() {
                    tracing::trace!(sequencer = %self.id.0, ?intent, "Intent passed through");
                }
                InputOutcome::PassThrough
            }
        }
    }

    fn transition(&mut self, intent: Intent, now: Instant) -> InputOutcome {
        if !self.lock.try_acquire(now) {
            return InputOutcome::Dropped;
        }

        let Some(change) = self.state.apply(intent, now) else {
            self.lock.cancel();
            return InputOutcome::Dropped;
        };

        tracing::debug!(
            sequencer = %self.id.0,
            "Section {} -> {} ({:?})",
            change.previous_index,
            change.active_index,
            change.direction
        );
        if let Some(callback) = self.on_change.as_mut() {
            callback(change);
        }
        InputOutcome::Transitioned(change)
    }

    /// Release the transition lock if its deadline has passed.
    ///
    /// Returns `true` when this call released it.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        let released = self.lock.poll(now);
        if released {
            tracing::debug!(sequencer = %self.id.0, "Transition lock released");
        }
        released
    }

    /// Detach every input channel and clear the pending lock release.
    ///
    /// Later input passes through untouched.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.normalizer.detach();
        self.lock.cancel();
        self.nested.clear();
        self.on_change = None;
        self.disposed = true;
        tracing::info!(sequencer = %self.id.0, "Sequencer disposed");
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("lock", &self.lock)
            .field("nested_sections", &self.nested.iter().map(|(s, _)| *s).collect::<Vec<_>>())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
