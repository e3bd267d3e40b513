// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transition lock.
//!
//! At most one section transition is in flight. Acquiring the lock arms a
//! release deadline; the release fires on the first `poll` (or acquire
//! attempt) at or after that deadline, whether or not the visual transition
//! finished.

use std::time::{Duration, Instant};

/// Single-flight lock with a deadline-based release
#[derive(Debug, Clone)]
pub struct TransitionLock {
    /// How long each acquisition holds the lock
    duration: Duration,
    /// Pending release, `Some` while held
    release_at: Option<Instant>,
    /// When the lock was last acquired
    last_acquired_at: Option<Instant>,
}

impl TransitionLock {
    /// Create a lock that holds for `duration` per acquisition
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            release_at: None,
            last_acquired_at: None,
        }
    }

    /// Hold duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether a transition is in flight
    pub fn is_held(&self) -> bool {
        self.release_at.is_some()
    }

    /// When the lock was last acquired
    pub fn last_acquired_at(&self) -> Option<Instant> {
        self.last_acquired_at
    }

    /// Try to start a transition. Returns `false` when one is in flight.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.poll(now);
        if self.is_held() {
            return false;
        }

        self.release_at = Some(now + self.duration);
        self.last_acquired_at = Some(now);
        true
    }

    /// Fire the pending release if its deadline has passed.
    ///
    /// Returns `true` when this call released the lock.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.release_at {
            Some(deadline) if now >= deadline => {
                self.release_at = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until release, `None` when not held
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.release_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Drop the pending release without firing it
    pub fn cancel(&mut self) {
        self.release_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(800);

    #[test]
    fn test_acquire_and_release() {
        let mut lock = TransitionLock::new(HOLD);
        let t0 = Instant::now();

        assert!(lock.try_acquire(t0));
        assert!(lock.is_held());
        assert!(!lock.try_acquire(t0 + Duration::from_millis(10)));
        assert!(!lock.poll(t0 + Duration::from_millis(799)));
        assert!(lock.poll(t0 + HOLD));
        assert!(!lock.is_held());
        assert!(!lock.poll(t0 + HOLD));
    }

    #[test]
    fn test_acquire_fires_expired_release() {
        let mut lock = TransitionLock::new(HOLD);
        let t0 = Instant::now();

        assert!(lock.try_acquire(t0));
        // Nobody polled, but the deadline passed
        assert!(lock.try_acquire(t0 + Duration::from_millis(900)));
        assert_eq!(lock.last_acquired_at(), Some(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn test_remaining_and_cancel() {
        let mut lock = TransitionLock::new(HOLD);
        let t0 = Instant::now();
        assert_eq!(lock.remaining(t0), None);

        lock.try_acquire(t0);
        assert_eq!(
            lock.remaining(t0 + Duration::from_millis(300)),
            Some(Duration::from_millis(500))
        );
        assert_eq!(lock.remaining(t0 + Duration::from_secs(2)), Some(Duration::ZERO));

        lock.cancel();
        assert!(!lock.is_held());
        assert!(!lock.poll(t0 + Duration::from_secs(2)));
    }
}
