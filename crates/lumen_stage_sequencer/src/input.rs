// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input normalization.
//!
//! Wheel, touch and keyboard events arrive in very different shapes. The
//! normalizer folds them into a single [`Intent`] (or nothing), applying
//! the wheel jitter floor, the swipe distance threshold and the touch
//! debounce interval on the way.

use crate::config::SequencerConfig;
use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Keys the sequencer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    /// Up arrow
    ArrowUp,
    /// Down arrow
    ArrowDown,
    /// Left arrow
    ArrowLeft,
    /// Right arrow
    ArrowRight,
    /// Anything else
    Other,
}

impl NavKey {
    /// Parse a DOM `KeyboardEvent.key` name
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowUp" => NavKey::ArrowUp,
            "ArrowDown" => NavKey::ArrowDown,
            "ArrowLeft" => NavKey::ArrowLeft,
            "ArrowRight" => NavKey::ArrowRight,
            _ => NavKey::Other,
        }
    }
}

/// A raw input event as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// Wheel or trackpad scroll; positive `delta_y` scrolls content up
    Wheel {
        /// Vertical delta in pixels
        delta_y: f32,
    },
    /// A touch began; `y` is `None` when the event carried no touch point
    TouchStart {
        /// Vertical position of the first touch point
        y: Option<f32>,
    },
    /// A touch ended; `y` is `None` when the event carried no touch point
    TouchEnd {
        /// Vertical position of the first changed touch point
        y: Option<f32>,
    },
    /// The platform cancelled the touch
    TouchCancel,
    /// A key was pressed
    Key(NavKey),
}

/// Input channels a sequencer listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputChannels {
    /// Mouse wheel and trackpad scrolling
    pub wheel: bool,
    /// Touch swipes
    pub touch: bool,
    /// Arrow keys
    pub keyboard: bool,
}

impl Default for InputChannels {
    fn default() -> Self {
        Self::all()
    }
}

impl InputChannels {
    /// Every channel enabled
    pub fn all() -> Self {
        Self {
            wheel: true,
            touch: true,
            keyboard: true,
        }
    }

    /// Every channel disabled
    pub fn none() -> Self {
        Self {
            wheel: false,
            touch: false,
            keyboard: false,
        }
    }

    /// Whether any channel is enabled
    pub fn any(&self) -> bool {
        self.wheel || self.touch || self.keyboard
    }
}

/// Converts raw events into navigation intents
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    swipe_threshold_px: f32,
    touch_debounce: Duration,
    wheel_floor_px: f32,
    channels: InputChannels,
    /// Y position recorded by the pending touch start
    touch_start_y: Option<f32>,
    /// When the last touch gesture was accepted
    last_accepted_touch: Option<Instant>,
}

impl InputNormalizer {
    /// Create a normalizer from a sequencer config
    pub fn new(config: &SequencerConfig) -> Self {
        Self {
            swipe_threshold_px: config.swipe_threshold_px,
            touch_debounce: config.touch_debounce(),
            wheel_floor_px: config.wheel_floor_px,
            channels: config.channels,
            touch_start_y: None,
            last_accepted_touch: None,
        }
    }

    /// Channels currently listened to
    pub fn channels(&self) -> InputChannels {
        self.channels
    }

    /// Classify a raw event
    pub fn classify(&mut self, input: RawInput, now: Instant) -> Option<Intent> {
        match input {
            RawInput::Wheel { delta_y } if self.channels.wheel => self.classify_wheel(delta_y),
            RawInput::Key(key) if self.channels.keyboard => Self::classify_key(key),
            RawInput::TouchStart { y } if self.channels.touch => {
                self.touch_start_y = y.filter(|y| y.is_finite());
                None
            }
            RawInput::TouchEnd { y } if self.channels.touch => {
                let start = self.touch_start_y.take();
                match (start, y.filter(|y| y.is_finite())) {
                    (Some(start), Some(end)) => self.classify_swipe(start - end, now),
                    _ => None,
                }
            }
            RawInput::TouchCancel => {
                self.touch_start_y = None;
                None
            }
            _ => None,
        }
    }

    /// Classify a wheel delta
    pub fn classify_wheel(&self, delta_y: f32) -> Option<Intent> {
        if !delta_y.is_finite() || delta_y == 0.0 || delta_y.abs() < self.wheel_floor_px {
            return None;
        }
        if delta_y > 0.0 {
            Some(Intent::Advance)
        } else {
            Some(Intent::Retreat)
        }
    }

    /// Classify a key press
    pub fn classify_key(key: NavKey) -> Option<Intent> {
        match key {
            NavKey::ArrowDown | NavKey::ArrowRight => Some(Intent::Advance),
            NavKey::ArrowUp | NavKey::ArrowLeft => Some(Intent::Retreat),
            NavKey::Other => None,
        }
    }

    /// Classify a completed swipe, `distance` being start minus end
    fn classify_swipe(&mut self, distance: f32, now: Instant) -> Option<Intent> {
        if distance.abs() <= self.swipe_threshold_px {
            return None;
        }
        if let Some(last) = self.last_accepted_touch {
            if now.saturating_duration_since(last) < self.touch_debounce {
                tracing::trace!("Swipe ignored, within touch debounce");
                return None;
            }
        }

        self.last_accepted_touch = Some(now);
        if distance > 0.0 {
            Some(Intent::Advance)
        } else {
            Some(Intent::Retreat)
        }
    }

    /// Stop listening on every channel and forget gesture state
    pub fn detach(&mut self) {
        self.channels = InputChannels::none();
        self.touch_start_y = None;
        self.last_accepted_touch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> InputNormalizer {
        InputNormalizer::new(&SequencerConfig::new(3))
    }

    fn swipe(n: &mut InputNormalizer, start: f32, end: f32, at: Instant) -> Option<Intent> {
        n.classify(RawInput::TouchStart { y: Some(start) }, at);
        n.classify(RawInput::TouchEnd { y: Some(end) }, at)
    }

    #[test]
    fn test_wheel_classification() {
        let n = normalizer();
        assert_eq!(n.classify_wheel(120.0), Some(Intent::Advance));
        assert_eq!(n.classify_wheel(-3.0), Some(Intent::Retreat));
        assert_eq!(n.classify_wheel(0.0), None);
        // Trackpad jitter below the floor
        assert_eq!(n.classify_wheel(0.4), None);
        assert_eq!(n.classify_wheel(f32::NAN), None);
    }

    #[test]
    fn test_key_classification() {
        assert_eq!(InputNormalizer::classify_key(NavKey::ArrowDown), Some(Intent::Advance));
        assert_eq!(InputNormalizer::classify_key(NavKey::ArrowRight), Some(Intent::Advance));
        assert_eq!(InputNormalizer::classify_key(NavKey::ArrowUp), Some(Intent::Retreat));
        assert_eq!(InputNormalizer::classify_key(NavKey::ArrowLeft), Some(Intent::Retreat));
        assert_eq!(InputNormalizer::classify_key(NavKey::from_dom_key("Enter")), None);
        assert_eq!(NavKey::from_dom_key("ArrowLeft"), NavKey::ArrowLeft);
    }

    #[test]
    fn test_swipe_threshold() {
        let mut n = normalizer();
        let t0 = Instant::now();
        assert_eq!(swipe(&mut n, 400.0, 360.0, t0), None);
        assert_eq!(swipe(&mut n, 400.0, 350.0, t0), None);
        assert_eq!(swipe(&mut n, 400.0, 300.0, t0), Some(Intent::Advance));
        assert_eq!(
            swipe(&mut n, 300.0, 400.0, t0 + Duration::from_millis(900)),
            Some(Intent::Retreat)
        );
    }

    #[test]
    fn test_touch_debounce() {
        let mut n = normalizer();
        let t0 = Instant::now();
        assert_eq!(swipe(&mut n, 500.0, 200.0, t0), Some(Intent::Advance));
        assert_eq!(swipe(&mut n, 500.0, 200.0, t0 + Duration::from_millis(300)), None);
        assert_eq!(
            swipe(&mut n, 500.0, 200.0, t0 + Duration::from_millis(800)),
            Some(Intent::Advance)
        );
    }

    #[test]
    fn test_malformed_touches() {
        let mut n = normalizer();
        let now = Instant::now();
        // End without a start
        assert_eq!(n.classify(RawInput::TouchEnd { y: Some(10.0) }, now), None);
        // Start without a touch point
        n.classify(RawInput::TouchStart { y: None }, now);
        assert_eq!(n.classify(RawInput::TouchEnd { y: Some(10.0) }, now), None);
        // End without a touch point
        n.classify(RawInput::TouchStart { y: Some(300.0) }, now);
        assert_eq!(n.classify(RawInput::TouchEnd { y: None }, now), None);
        // Cancel forgets the start
        n.classify(RawInput::TouchStart { y: Some(300.0) }, now);
        n.classify(RawInput::TouchCancel, now);
        assert_eq!(n.classify(RawInput::TouchEnd { y: Some(0.0) }, now), None);
    }

    #[test]
    fn test_disabled_channels() {
        let config = SequencerConfig::new(3).with_channels(InputChannels {
            wheel: false,
            touch: true,
            keyboard: false,
        });
        let mut n = InputNormalizer::new(&config);
        let now = Instant::now();
        assert_eq!(n.classify(RawInput::Wheel { delta_y: 100.0 }, now), None);
        assert_eq!(n.classify(RawInput::Key(NavKey::ArrowDown), now), None);
        assert_eq!(swipe(&mut n, 400.0, 100.0, now), Some(Intent::Advance));

        n.detach();
        assert!(!n.channels().any());
        assert_eq!(swipe(&mut n, 400.0, 100.0, now + Duration::from_secs(5)), None);
    }
}
