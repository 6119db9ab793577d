use std::time::{Duration, Instant};

/// Raises a near-end signal when the visible window approaches the bottom
/// of the loaded content.
///
/// Signals are coalesced to at most one per `min_interval`. Whether a fetch
/// is already pending is the controller's concern, not the detector's.
#[derive(Debug, Clone)]
pub struct ScrollProximityDetector {
    threshold: f64,
    min_interval: Duration,
    last_fired: Option<Instant>,
}

impl ScrollProximityDetector {
    pub const DEFAULT_THRESHOLD: f64 = 100.0;
    /// One frame at 60 Hz.
    pub const FRAME: Duration = Duration::from_millis(16);

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            min_interval: Self::FRAME,
            last_fired: None,
        }
    }

    pub fn is_near_end(&self, scroll_position: f64, viewport_height: f64, content_height: f64) -> bool {
        scroll_position + viewport_height >= content_height - self.threshold
    }

    /// Returns true when a near-end trigger should be raised for this sample.
    pub fn observe(
        &mut self,
        scroll_position: f64,
        viewport_height: f64,
        content_height: f64,
        now: Instant,
    ) -> bool {
        if !self.is_near_end(scroll_position, viewport_height, content_height) {
            return false;
        }
        if let Some(last) = self.last_fired
            && now.saturating_duration_since(last) < self.min_interval
        {
            return false;
        }
        self.last_fired = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

impl Default for ScrollProximityDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_within_threshold_of_bottom() {
        let mut d = ScrollProximityDetector::default();
        let now = Instant::now();
        // 0 + 800 >= 1000 - 100 is false
        assert!(!d.observe(0.0, 800.0, 1000.0, now));
        // 100 + 800 >= 900
        assert!(d.observe(100.0, 800.0, 1000.0, now));
    }

    #[test]
    fn short_content_is_always_near_end() {
        let d = ScrollProximityDetector::default();
        assert!(d.is_near_end(0.0, 800.0, 0.0));
        assert!(d.is_near_end(0.0, 800.0, 500.0));
    }

    #[test]
    fn coalesces_within_a_frame() {
        let mut d = ScrollProximityDetector::default();
        let t0 = Instant::now();
        assert!(d.observe(950.0, 100.0, 1000.0, t0));
        assert!(!d.observe(960.0, 100.0, 1000.0, t0 + Duration::from_millis(5)));
        assert!(!d.observe(970.0, 100.0, 1000.0, t0 + Duration::from_millis(15)));
        assert!(d.observe(980.0, 100.0, 1000.0, t0 + Duration::from_millis(16)));
    }

    #[test]
    fn samples_away_from_end_do_not_consume_the_frame() {
        let mut d = ScrollProximityDetector {
            min_interval: Duration::from_secs(1),
            ..Default::default()
        };
        let t0 = Instant::now();
        assert!(!d.observe(0.0, 100.0, 1000.0, t0));
        assert!(d.observe(900.0, 100.0, 1000.0, t0));
        d.reset();
        assert!(d.observe(900.0, 100.0, 1000.0, t0));
    }
}
