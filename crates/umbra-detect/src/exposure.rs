//! Continuous exposure counters.

use std::collections::HashMap;
use std::time::Duration;

use umbra_types::PlayerId;

/// Per-player time spent continuously in light.
///
/// A counter exists only while the player is lit: it is created on the
/// first lit frame, dropped on the first unlit frame, and dropped when it
/// crosses the threshold. There is no decay window; a single dark frame
/// resets the player to zero.
#[derive(Debug, Clone, Default)]
pub struct ExposureTracker {
    threshold: Duration,
    counters: HashMap<PlayerId, Duration>,
}

impl ExposureTracker {
    /// Tracker that trips at `threshold`.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            counters: HashMap::new(),
        }
    }

    /// Records one frame of length `dt` for `player`.
    ///
    /// Returns `true` exactly once per continuous stretch: on the frame the
    /// accumulated exposure reaches the threshold.
    pub fn record(&mut self, player: PlayerId, lit: bool, dt: Duration) -> bool {
        if !lit {
            self.counters.remove(&player);
            return false;
        }
        let exposure = self.counters.entry(player).or_default();
        *exposure += dt;
        if *exposure >= self.threshold {
            self.counters.remove(&player);
            return true;
        }
        false
    }

    /// Accumulated exposure, if the player is currently lit.
    pub fn get(&self, player: PlayerId) -> Option<Duration> {
        self.counters.get(&player).copied()
    }

    /// Drops counters for players `keep` rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(PlayerId) -> bool) {
        self.counters.retain(|player, _| keep(*player));
    }

    /// Drops every counter.
    pub fn clear(&mut self) {
        self.counters.clear();
    }

    /// Number of players currently accumulating.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether nobody is accumulating.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PlayerId = PlayerId(7);
    const FRAME: Duration = Duration::from_millis(100);

    fn tracker() -> ExposureTracker {
        ExposureTracker::new(Duration::from_millis(500))
    }

    #[test]
    fn test_trips_once_at_threshold() {
        let mut t = tracker();
        let trips: Vec<bool> = (0..5).map(|_| t.record(P, true, FRAME)).collect();
        assert_eq!(trips, vec![false, false, false, false, true]);
        assert_eq!(t.get(P), None);
    }

    #[test]
    fn test_dark_frame_resets() {
        let mut t = tracker();
        for _ in 0..4 {
            assert!(!t.record(P, true, FRAME));
        }
        assert!(!t.record(P, false, FRAME));
        assert_eq!(t.get(P), None);
        for _ in 0..4 {
            assert!(!t.record(P, true, FRAME));
        }
        assert_eq!(t.get(P), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_retain_and_clear() {
        let mut t = tracker();
        t.record(PlayerId(1), true, FRAME);
        t.record(PlayerId(2), true, FRAME);
        t.retain(|p| p == PlayerId(2));
        assert_eq!(t.len(), 1);
        assert!(t.get(PlayerId(2)).is_some());
        t.clear();
        assert!(t.is_empty());
    }
}
