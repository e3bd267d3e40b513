// SPDX-License-Identifier: MIT OR Apache-2.0
//! Navigation intents and transition directions.

use serde::{Deserialize, Serialize};

/// A normalized navigation request derived from a raw input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Move to the next section
    Advance,
    /// Move to the previous section
    Retreat,
}

impl Intent {
    /// Direction a transition driven by this intent moves in
    pub fn direction(self) -> Direction {
        match self {
            Intent::Advance => Direction::Forward,
            Intent::Retreat => Direction::Backward,
        }
    }
}

/// Sign of the last transition, used to pick enter/exit animation variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Moved towards section 0
    Backward,
    /// No transition has happened yet
    #[default]
    Still,
    /// Moved towards the last section
    Forward,
}

impl Direction {
    /// Signed step: -1, 0 or +1
    pub fn signum(self) -> i8 {
        match self {
            Direction::Backward => -1,
            Direction::Still => 0,
            Direction::Forward => 1,
        }
    }

    /// Signed step as a float, for animation offsets
    pub fn factor(self) -> f32 {
        f32::from(self.signum())
    }

    /// Opposite direction (exiting sections leave this way)
    pub fn reversed(self) -> Self {
        match self {
            Direction::Backward => Direction::Forward,
            Direction::Still => Direction::Still,
            Direction::Forward => Direction::Backward,
        }
    }
}
