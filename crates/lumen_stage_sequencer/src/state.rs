// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence state: active section, viewed set and last direction.

use crate::error::{Result, SequencerError};
use crate::intent::{Direction, Intent};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One full-viewport section of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Position in the stage
    pub index: usize,
    /// Whether the section has ever been active
    pub viewed: bool,
}

/// Notification sent to the section host after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionChange {
    /// Section now active
    pub active_index: usize,
    /// Section that was active before
    pub previous_index: usize,
    /// Direction of travel
    pub direction: Direction,
}

/// Mutable navigation state owned by a sequencer
#[derive(Debug, Clone)]
pub struct SequenceState {
    sections: Vec<Section>,
    active_index: usize,
    direction: Direction,
    last_transition_at: Option<Instant>,
}

impl SequenceState {
    /// Fresh state with `initial_index` active and viewed
    pub fn new(section_count: usize, initial_index: usize) -> Result<Self> {
        Self::restore(section_count, initial_index, &[])
    }

    /// Rebuild a state from an active index and previously viewed sections.
    ///
    /// The active section is always marked viewed.
    pub fn restore(section_count: usize, active_index: usize, viewed: &[usize]) -> Result<Self> {
        if section_count == 0 {
            return Err(SequencerError::InvalidSectionCount(section_count));
        }
        if let Some(&index) = viewed
            .iter()
            .chain(std::iter::once(&active_index))
            .find(|&&i| i >= section_count)
        {
            return Err(SequencerError::InitialIndexOutOfRange {
                index,
                count: section_count,
            });
        }

        let mut sections: Vec<Section> = (0..section_count)
            .map(|index| Section { index, viewed: false })
            .collect();
        for &index in viewed.iter().chain(std::iter::once(&active_index)) {
            sections[index].viewed = true;
        }

        Ok(Self {
            sections,
            active_index,
            direction: Direction::Still,
            last_transition_at: None,
        })
    }

    /// Number of sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Active section index
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Direction of the last transition
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// When the last transition happened
    pub fn last_transition_at(&self) -> Option<Instant> {
        self.last_transition_at
    }

    /// All sections in order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Whether section `index` has been viewed
    pub fn is_viewed(&self, index: usize) -> bool {
        self.sections.get(index).is_some_and(|s| s.viewed)
    }

    /// Whether every section has been viewed
    pub fn all_viewed(&self) -> bool {
        self.sections.iter().all(|s| s.viewed)
    }

    /// Indices of viewed sections
    pub fn viewed_indices(&self) -> Vec<usize> {
        self.sections
            .iter()
            .filter(|s| s.viewed)
            .map(|s| s.index)
            .collect()
    }

    /// Whether the first section is active
    pub fn is_first(&self) -> bool {
        self.active_index == 0
    }

    /// Whether the last section is active
    pub fn is_last(&self) -> bool {
        self.active_index + 1 == self.sections.len()
    }

    /// Step one section in the intent's direction.
    ///
    /// Returns `None` when the step would leave the stage.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> Option<SectionChange> {
        let direction = intent.direction();
        let previous_index = self.active_index;
        let target = match direction {
            Direction::Forward => previous_index + 1,
            Direction::Backward => previous_index.checked_sub(1)?,
            Direction::Still => previous_index,
        };
        let new_index = target.min(self.sections.len() - 1);
        if new_index == previous_index {
            return None;
        }

        self.active_index = new_index;
        self.sections[new_index].viewed = true;
        self.direction = direction;
        self.last_transition_at = Some(now);

        Some(SectionChange {
            active_index: new_index,
            previous_index,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SequenceState::new(4, 0).unwrap();
        assert_eq!(state.active_index(), 0);
        assert_eq!(state.direction(), Direction::Still);
        assert_eq!(state.viewed_indices(), vec![0]);
        assert!(state.is_first());
        assert!(!state.all_viewed());
        assert!(state.last_transition_at().is_none());
    }

    #[test]
    fn test_apply_steps_and_marks_viewed() {
        let mut state = SequenceState::new(3, 0).unwrap();
        let now = Instant::now();

        let change = state.apply(Intent::Advance, now).unwrap();
        assert_eq!(change.previous_index, 0);
        assert_eq!(change.active_index, 1);
        assert_eq!(change.direction, Direction::Forward);
        assert!(state.is_viewed(1));
        assert_eq!(state.last_transition_at(), Some(now));

        state.apply(Intent::Advance, now).unwrap();
        assert!(state.is_last());
        assert!(state.all_viewed());

        // Clamped at the end, nothing changes
        assert!(state.apply(Intent::Advance, now).is_none());
        assert_eq!(state.active_index(), 2);
        assert_eq!(state.direction(), Direction::Forward);
    }

    #[test]
    fn test_apply_clamps_at_start() {
        let mut state = SequenceState::new(3, 0).unwrap();
        assert!(state.apply(Intent::Retreat, Instant::now()).is_none());
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn test_restore() {
        let state = SequenceState::restore(3, 2, &[0]).unwrap();
        assert_eq!(state.active_index(), 2);
        assert_eq!(state.viewed_indices(), vec![0, 2]);
        assert!(!state.all_viewed());

        assert!(matches!(
            SequenceState::restore(3, 1, &[5]),
            Err(SequencerError::InitialIndexOutOfRange { index: 5, count: 3 })
        ));
        assert!(SequenceState::restore(0, 0, &[]).is_err());
    }
}
