//! Core data structures shared across the probe, dispatch, and orchestration layers.

use std::time::Duration;

/// Counters decoded from a state-query response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservableState {
    pub likes: u64,
    pub uid: i64,
    pub nickname: String,
    pub region: String,
    pub level: u32,
}

impl ObservableState {
    pub fn new(likes: u64, uid: i64, nickname: impl Into<String>) -> Self {
        Self {
            likes,
            uid,
            nickname: nickname.into(),
            region: String::new(),
            level: 0,
        }
    }
}

/// Result of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
}

impl DispatchOutcome {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Final classification of an invocation, driven purely by the counter delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    NoChange,
}

impl Classification {
    pub fn from_delta(delta: i64) -> Self {
        if delta > 0 {
            Classification::Success
        } else {
            Classification::NoChange
        }
    }

    /// Numeric status reported to front-end callers.
    pub fn status_code(self) -> u8 {
        match self {
            Classification::Success => 1,
            Classification::NoChange => 2,
        }
    }
}

/// Assembled output of a completed invocation.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub before: ObservableState,
    pub after: ObservableState,
    pub delta: i64,
    pub classification: Classification,
    pub dispatch: DispatchOutcome,
    pub elapsed: Duration,
    pub region: String,
}

impl ActionResult {
    pub fn new(
        before: ObservableState,
        after: ObservableState,
        dispatch: DispatchOutcome,
        elapsed: Duration,
        region: impl Into<String>,
    ) -> Self {
        let delta = after.likes as i64 - before.likes as i64;
        Self {
            before,
            after,
            delta,
            classification: Classification::from_delta(delta),
            dispatch,
            elapsed,
            region: region.into(),
        }
    }

    /// Elapsed wall time rendered as seconds with two decimals, e.g. `"1.37s"`.
    pub fn response_time(&self) -> String {
        format!("{:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_strictly_positive_delta() {
        assert_eq!(Classification::from_delta(0), Classification::NoChange);
        assert_eq!(Classification::from_delta(1), Classification::Success);
        assert_eq!(Classification::from_delta(-1), Classification::NoChange);
    }

    #[test]
    fn result_computes_delta_from_counters() {
        let result = ActionResult::new(
            ObservableState::new(100, 42, "alpha"),
            ObservableState::new(107, 42, "alpha"),
            DispatchOutcome { attempted: 10, succeeded: 9 },
            Duration::from_millis(1370),
            "IND",
        );
        assert_eq!(result.delta, 7);
        assert_eq!(result.classification.status_code(), 1);
        assert_eq!(result.response_time(), "1.37s");
        assert_eq!(result.dispatch.failed(), 1);
    }

    #[test]
    fn decreased_counter_is_no_change() {
        let result = ActionResult::new(
            ObservableState::new(50, 1, ""),
            ObservableState::new(49, 1, ""),
            DispatchOutcome::default(),
            Duration::ZERO,
            "SG",
        );
        assert_eq!(result.delta, -1);
        assert_eq!(result.classification, Classification::NoChange);
    }
}
