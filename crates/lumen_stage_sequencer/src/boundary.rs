// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary policy.
//!
//! Decides whether an intent belongs to the sequencer or to the page's
//! native scrolling. Rules are evaluated in order:
//! 1. No intent passes through
//! 2. An in-flight transition holds everything
//! 3. Advancing off the last section passes through once the exit gate opens
//! 4. Retreating off the first section passes through
//! 5. A nested panel that is not at the relevant edge scrolls itself first,
//!    while the page stays put
//! 6. Everything else proceeds to the transition lock

use crate::intent::Intent;
use crate::state::SequenceState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// When the last section hands control back to page scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExitGate {
    /// Only after every section has been viewed
    #[default]
    AfterAllViewed,
    /// As soon as the last section is active
    Immediate,
}

/// Outcome of evaluating an intent against the boundary rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryDecision {
    /// Let the browser (or outer scroll area) handle the event
    PassThrough,
    /// Swallow the event without changing state
    Hold,
    /// Swallow the event and attempt a transition
    Proceed,
    /// Leave the event to the active section's nested panel only
    NestedScroll,
}

impl BoundaryDecision {
    /// Whether the event's default action must be prevented
    pub fn is_consumed(self) -> bool {
        matches!(self, BoundaryDecision::Hold | BoundaryDecision::Proceed)
    }

    /// Whether the page around the stage must stay still
    pub fn holds_page(self) -> bool {
        !matches!(self, BoundaryDecision::PassThrough)
    }
}

/// Scroll position of an embedded panel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NestedScrollContext {
    /// Vertical scroll offset in pixels
    pub scroll_top: f32,
    /// Whether the panel is scrolled to its top
    pub at_top: bool,
    /// Whether the panel is scrolled to its bottom
    pub at_bottom: bool,
}

impl NestedScrollContext {
    /// Build a snapshot from raw scroll metrics
    pub fn from_metrics(scroll_top: f32, viewport_height: f32, content_height: f32) -> Self {
        let max_scroll = (content_height - viewport_height).max(0.0);
        Self {
            scroll_top,
            at_top: scroll_top <= 0.5,
            at_bottom: scroll_top >= max_scroll - 0.5,
        }
    }
}

/// Panel edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
}

/// Something that can report the scroll position of an embedded panel
pub trait NestedScrollSource {
    /// Current scroll position
    fn snapshot(&self) -> NestedScrollContext;

    /// Whether the panel has reached `edge`
    fn is_at_edge(&self, edge: Edge) -> bool {
        let snapshot = self.snapshot();
        match edge {
            Edge::Top => snapshot.at_top,
            Edge::Bottom => snapshot.at_bottom,
        }
    }
}

impl NestedScrollSource for NestedScrollContext {
    fn snapshot(&self) -> NestedScrollContext {
        *self
    }
}

/// Scroll position shared between a UI scroll area and a sequencer
#[derive(Debug, Clone)]
pub struct SharedScrollState {
    inner: Arc<RwLock<NestedScrollContext>>,
}

impl SharedScrollState {
    /// Create a shared state positioned at the top
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(NestedScrollContext {
                scroll_top: 0.0,
                at_top: true,
                at_bottom: false,
            })),
        }
    }

    /// Publish a new scroll position
    pub fn set(&self, context: NestedScrollContext) {
        *self.inner.write() = context;
    }
}

impl Default for SharedScrollState {
    fn default() -> Self {
        Self::new()
    }
}

impl NestedScrollSource for SharedScrollState {
    fn snapshot(&self) -> NestedScrollContext {
        *self.inner.read()
    }
}

/// Boundary rules for one sequencer
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPolicy {
    /// Exit gate for the last section
    pub exit_gate: ExitGate,
    /// Nested panels scrolled further than this are not at their top
    pub nested_top_tolerance_px: f32,
}

impl BoundaryPolicy {
    /// Evaluate an intent
    pub fn evaluate(
        &self,
        intent: Option<Intent>,
        state: &SequenceState,
        is_transitioning: bool,
        nested: Option<&dyn NestedScrollSource>,
    ) -> BoundaryDecision {
        let Some(intent) = intent else {
            return BoundaryDecision::PassThrough;
        };
        if is_transitioning {
            return BoundaryDecision::Hold;
        }

        match intent {
            Intent::Advance if state.is_last() => {
                return if self.may_exit(state) {
                    BoundaryDecision::PassThrough
                } else {
                    BoundaryDecision::Hold
                };
            }
            Intent::Retreat if state.is_first() => return BoundaryDecision::PassThrough,
            _ => {}
        }

        if let Some(nested) = nested {
            let panel_scrolls = match intent {
                Intent::Retreat => nested.snapshot().scroll_top > self.nested_top_tolerance_px,
                Intent::Advance => !nested.is_at_edge(Edge::Bottom),
            };
            if panel_scrolls {
                return BoundaryDecision::NestedScroll;
            }
        }

        BoundaryDecision::Proceed
    }

    fn may_exit(&self, state: &SequenceState) -> bool {
        match self.exit_gate {
            ExitGate::AfterAllViewed => state.all_viewed(),
            ExitGate::Immediate => true,
        }
    }
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self {
            exit_gate: ExitGate::default(),
            nested_top_tolerance_px: crate::config::DEFAULT_NESTED_TOP_TOLERANCE_PX,
        }
    }
}
