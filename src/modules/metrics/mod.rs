//! Metrics collection utilities.
//!
//! Aggregates global and per-region dispatch statistics with latency
//! percentiles for observability.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Aggregated metrics across all regions.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub started_at: DateTime<Utc>,
    pub invocations: u64,
    pub failed_invocations: u64,
    pub total_attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_latency: Option<Duration>,
    pub p95_latency: Option<Duration>,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            invocations: 0,
            failed_invocations: 0,
            total_attempts: 0,
            successes: 0,
            failures: 0,
            average_latency: None,
            p95_latency: None,
        }
    }
}

/// Region-scoped metrics snapshot.
#[derive(Debug, Clone)]
pub struct RegionStats {
    pub region: String,
    pub total_attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub probe_failures: u64,
    pub average_latency: Option<Duration>,
    pub p95_latency: Option<Duration>,
    pub consecutive_failures: u32,
    pub likes_given: i64,
}

impl RegionStats {
    fn from_accumulator(region: &str, acc: &RegionAccumulator) -> Self {
        let (avg, p95) = acc.latency_stats();
        Self {
            region: region.to_string(),
            total_attempts: acc.total_attempts,
            successes: acc.successes,
            failures: acc.failures,
            probe_failures: acc.probe_failures,
            average_latency: avg,
            p95_latency: p95,
            consecutive_failures: acc.consecutive_failures,
            likes_given: acc.likes_given,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub global: GlobalStats,
    pub regions: Vec<RegionStats>,
}

#[derive(Debug)]
struct RegionAccumulator {
    total_attempts: u64,
    successes: u64,
    failures: u64,
    probe_failures: u64,
    latencies: VecDeque<Duration>,
    max_window: usize,
    consecutive_failures: u32,
    likes_given: i64,
}

impl RegionAccumulator {
    fn new(max_window: usize) -> Self {
        Self {
            total_attempts: 0,
            successes: 0,
            failures: 0,
            probe_failures: 0,
            latencies: VecDeque::with_capacity(max_window),
            max_window,
            consecutive_failures: 0,
            likes_given: 0,
        }
    }

    fn record(&mut self, success: bool, latency: Duration) {
        self.total_attempts += 1;

        if success {
            self.successes += 1;
            self.consecutive_failures = 0;
        } else {
            self.failures += 1;
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        if self.latencies.len() == self.max_window {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency);
    }

    fn latency_stats(&self) -> (Option<Duration>, Option<Duration>) {
        if self.latencies.is_empty() {
            return (None, None);
        }
        let avg = self
            .latencies
            .iter()
            .map(|d| d.as_secs_f64())
            .sum::<f64>()
            / self.latencies.len() as f64;
        (Some(Duration::from_secs_f64(avg)), p95(self.latencies.iter()))
    }
}

#[derive(Debug)]
struct MetricsState {
    global: GlobalStats,
    max_window: usize,
    regions: HashMap<String, RegionAccumulator>,
}

impl MetricsState {
    fn new(max_window: usize) -> Self {
        Self {
            global: GlobalStats::default(),
            max_window,
            regions: HashMap::new(),
        }
    }

    fn accumulator_mut(&mut self, region: &str) -> &mut RegionAccumulator {
        self.regions
            .entry(region.to_string())
            .or_insert_with(|| RegionAccumulator::new(self.max_window))
    }
}

fn p95<'a>(samples: impl Iterator<Item = &'a Duration>) -> Option<Duration> {
    let mut samples: Vec<Duration> = samples.copied().collect();
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    let idx = ((samples.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
    Some(samples[idx])
}

/// Thread-safe metrics collector shared by the dispatcher and the front end.
#[derive(Clone, Debug)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::new(128))),
        }
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::new(window.max(16)))),
        }
    }

    /// Records one dispatch attempt.
    pub fn record_attempt(&self, region: &str, success: bool, latency: Duration) {
        let mut guard = self.inner.lock().expect("metrics lock poisoned");
        guard.global.total_attempts += 1;
        if success {
            guard.global.successes += 1;
        } else {
            guard.global.failures += 1;
        }

        if let Some(avg) = guard.global.average_latency {
            let blended = (avg.as_secs_f64() * 0.9) + (latency.as_secs_f64() * 0.1);
            guard.global.average_latency = Some(Duration::from_secs_f64(blended));
        } else {
            guard.global.average_latency = Some(latency);
        }

        guard.accumulator_mut(region).record(success, latency);
    }

    pub fn record_probe_failure(&self, region: &str) {
        let mut guard = self.inner.lock().expect("metrics lock poisoned");
        guard.accumulator_mut(region).probe_failures += 1;
    }

    /// Records the end of an invocation; `delta` is `None` for failed runs.
    pub fn record_invocation(&self, region: &str, delta: Option<i64>) {
        let mut guard = self.inner.lock().expect("metrics lock poisoned");
        guard.global.invocations += 1;
        match delta {
            Some(delta) => guard.accumulator_mut(region).likes_given += delta.max(0),
            None => guard.global.failed_invocations += 1,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let guard = self.inner.lock().expect("metrics lock poisoned");
        let mut regions: Vec<_> = guard
            .regions
            .iter()
            .map(|(region, acc)| RegionStats::from_accumulator(region, acc))
            .collect();
        regions.sort_by(|a, b| a.region.cmp(&b.region));

        let mut global = guard.global.clone();
        global.p95_latency = p95(guard.regions.values().flat_map(|acc| acc.latencies.iter()));
        MetricsSnapshot { global, regions }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
