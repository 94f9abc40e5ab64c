//! Event system for the like workflow.
//!
//! Provides hooks for metrics, logging, and custom reactions around probes,
//! dispatch attempts, and invocation outcomes.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::metrics::MetricsCollector;
use crate::protocol::probe::ProbePhase;

/// One dispatch attempt finished.
#[derive(Debug, Clone)]
pub struct AttemptEvent {
    pub region: String,
    pub index: usize,
    pub success: bool,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// One sub-batch finished.
#[derive(Debug, Clone)]
pub struct BatchEvent {
    pub region: String,
    pub batch: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProbeEvent {
    pub region: String,
    pub phase: ProbePhase,
    pub likes: Option<u64>,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CompletedEvent {
    pub region: String,
    pub uid: i64,
    pub delta: i64,
    pub succeeded: usize,
    pub attempted: usize,
    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub region: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum LikeEvent {
    Attempt(AttemptEvent),
    Batch(BatchEvent),
    Probe(ProbeEvent),
    Completed(CompletedEvent),
    Error(ErrorEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &LikeEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: LikeEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &LikeEvent) {
        match event {
            LikeEvent::Attempt(attempt) => {
                log::debug!(
                    "[{}] attempt #{} success={} ({:.2}s)",
                    attempt.region,
                    attempt.index,
                    attempt.success,
                    attempt.latency.as_secs_f64()
                );
            }
            LikeEvent::Batch(batch) => {
                log::debug!(
                    "[{}] batch {} sent {}/{} in {:.2}s",
                    batch.region,
                    batch.batch,
                    batch.succeeded,
                    batch.attempted,
                    batch.elapsed.as_secs_f64()
                );
            }
            LikeEvent::Probe(probe) => match probe.likes {
                Some(likes) => log::info!("[{}] likes {}: {}", probe.region, probe.phase, likes),
                None => log::warn!("[{}] {} probe returned no state", probe.region, probe.phase),
            },
            LikeEvent::Completed(done) => {
                log::info!(
                    "[{}] uid {} completed in {:.2}s - sent {}/{}, likes given: {}",
                    done.region,
                    done.uid,
                    done.elapsed.as_secs_f64(),
                    done.succeeded,
                    done.attempted,
                    done.delta
                );
            }
            LikeEvent::Error(error) => {
                log::warn!("[{}] invocation failed: {}", error.region, error.error);
            }
        }
    }
}

/// Metrics handler that feeds the metrics collector.
#[derive(Clone, Debug)]
pub struct MetricsHandler {
    metrics: MetricsCollector,
}

impl MetricsHandler {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self { metrics }
    }
}

impl EventHandler for MetricsHandler {
    fn handle(&self, event: &LikeEvent) {
        match event {
            LikeEvent::Attempt(attempt) => {
                self.metrics
                    .record_attempt(&attempt.region, attempt.success, attempt.latency);
            }
            LikeEvent::Probe(probe) if probe.likes.is_none() => {
                self.metrics.record_probe_failure(&probe.region);
            }
            LikeEvent::Completed(done) => {
                self.metrics.record_invocation(&done.region, Some(done.delta));
            }
            LikeEvent::Error(error) => {
                self.metrics.record_invocation(&error.region, None);
            }
            _ => {}
        }
    }
}
