//! Cross-cutting services module
//!
//! Structured events and metrics around probes and dispatch attempts.

pub mod events;
pub mod metrics;

pub use events::{
    AttemptEvent, BatchEvent, CompletedEvent, ErrorEvent, EventDispatcher, EventHandler,
    LikeEvent, LoggingHandler, MetricsHandler, ProbeEvent,
};
pub use metrics::{GlobalStats, MetricsCollector, MetricsSnapshot, RegionStats};
