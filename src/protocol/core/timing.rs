//! Inter-batch pacing.
//!
//! Large dispatches are split into sub-batches; between two sub-batches the
//! dispatcher sleeps for the delay computed here. The base pause stretches
//! while recent sub-batches keep failing, and shrinks back as they recover.

use std::cmp::Ordering;
use std::time::Duration;

/// Feedback emitted after each sub-batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingFeedback {
    /// At least half the sub-batch succeeded.
    Healthy,
    /// Fewer than half succeeded.
    Degraded,
    /// Nothing succeeded.
    Failed,
}

impl PacingFeedback {
    pub fn from_counts(succeeded: usize, attempted: usize) -> Self {
        if attempted == 0 || succeeded * 2 >= attempted {
            PacingFeedback::Healthy
        } else if succeeded == 0 {
            PacingFeedback::Failed
        } else {
            PacingFeedback::Degraded
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchPacing {
    base_delay_ms: u64,
    min_delay_ms: u64,
    max_delay_ms: u64,
    variance_pct: f64,
    recent_failures: u32,
}

impl BatchPacing {
    pub fn new(base_delay: Duration) -> Self {
        let base_delay_ms = base_delay.as_millis().min(u64::MAX as u128) as u64;
        Self {
            base_delay_ms,
            min_delay_ms: base_delay_ms / 2,
            max_delay_ms: base_delay_ms.saturating_mul(4),
            variance_pct: 0.0,
            recent_failures: 0,
        }
    }

    /// Spreads each pause by up to `variance_pct` of its value, centred on it.
    pub fn with_variance(mut self, variance_pct: f64) -> Self {
        self.variance_pct = if variance_pct.is_finite() {
            variance_pct.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn register_feedback(&mut self, feedback: PacingFeedback) {
        match feedback {
            PacingFeedback::Healthy => {
                self.recent_failures = self.recent_failures.saturating_sub(1);
            }
            PacingFeedback::Degraded => {
                self.recent_failures = self.recent_failures.saturating_add(1);
            }
            PacingFeedback::Failed => {
                self.recent_failures = self.recent_failures.saturating_add(2);
            }
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }

        let mut delay = self.base_delay_ms as f64;

        match self.recent_failures.cmp(&2) {
            Ordering::Less => {}
            Ordering::Equal => delay *= 1.5,
            Ordering::Greater => delay *= 2.0,
        }

        if self.variance_pct > 0.0 {
            let variance = delay * self.variance_pct;
            let jitter = rand::random::<f64>() * variance - (variance / 2.0);
            delay += jitter;
        }

        delay = delay.clamp(self.min_delay_ms as f64, self.max_delay_ms as f64);
        Duration::from_millis(delay.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_state_uses_base_delay() {
        let pacing = BatchPacing::new(Duration::from_millis(100));
        assert_eq!(pacing.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn repeated_failures_stretch_the_pause() {
        let mut pacing = BatchPacing::new(Duration::from_millis(100));
        pacing.register_feedback(PacingFeedback::Failed);
        assert_eq!(pacing.next_delay(), Duration::from_millis(150));
        pacing.register_feedback(PacingFeedback::Degraded);
        assert_eq!(pacing.next_delay(), Duration::from_millis(200));

        for _ in 0..3 {
            pacing.register_feedback(PacingFeedback::Healthy);
        }
        assert_eq!(pacing.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn zero_base_disables_pausing() {
        let mut pacing = BatchPacing::new(Duration::ZERO);
        pacing.register_feedback(PacingFeedback::Failed);
        pacing.register_feedback(PacingFeedback::Failed);
        assert_eq!(pacing.next_delay(), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let pacing = BatchPacing::new(Duration::from_millis(100)).with_variance(0.5);
        for _ in 0..50 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(50) && delay <= Duration::from_millis(400));
        }
    }

    #[test]
    fn huge_base_delay_saturates() {
        let mut pacing = BatchPacing::new(Duration::from_millis((1 << 62) + 1)).with_variance(0.2);
        pacing.register_feedback(PacingFeedback::Failed);
        pacing.register_feedback(PacingFeedback::Failed);
        assert!(pacing.next_delay() >= Duration::from_millis(1 << 61));
    }

    #[test]
    fn non_finite_variance_is_ignored() {
        let pacing = BatchPacing::new(Duration::from_millis(100)).with_variance(f64::NAN);
        assert_eq!(pacing.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn feedback_classifies_counts() {
        assert_eq!(PacingFeedback::from_counts(5, 10), PacingFeedback::Healthy);
        assert_eq!(PacingFeedback::from_counts(2, 10), PacingFeedback::Degraded);
        assert_eq!(PacingFeedback::from_counts(0, 10), PacingFeedback::Failed);
        assert_eq!(PacingFeedback::from_counts(0, 0), PacingFeedback::Healthy);
    }
}
