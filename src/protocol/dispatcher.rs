//! Bounded-concurrency batch dispatcher.
//!
//! Fans one encrypted action payload out over `attempted` authenticated
//! calls. Attempts are grouped into sub-batches of `batch_size`; within a
//! sub-batch at most `concurrency_width` calls are in flight. Between
//! sub-batches the dispatcher pauses according to [`BatchPacing`]. A failed
//! attempt only lowers the success count; the batch always runs to the end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use url::Url;

use crate::credentials::{Credential, CredentialPool};
use crate::modules::events::{AttemptEvent, BatchEvent, EventDispatcher, LikeEvent};
use crate::protocol::core::{BatchPacing, DispatchOutcome, PacingFeedback, Transport};

/// Attempt-count and concurrency knobs for one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Upper bound on attempts per invocation.
    pub max_attempts: usize,
    /// Maximum calls in flight at once.
    pub concurrency_width: usize,
    /// Attempts per sub-batch.
    pub batch_size: usize,
    /// Base pause between sub-batches.
    pub batch_pause: Duration,
    /// Fraction of the pause randomised per sub-batch, in `0.0..=1.0`.
    pub batch_jitter: f64,
    /// When set, attempts never exceed `pool.len() * cap`.
    pub per_credential_cap: Option<usize>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            concurrency_width: 50,
            batch_size: 50,
            batch_pause: Duration::from_millis(100),
            batch_jitter: 0.1,
            per_credential_cap: Some(2),
        }
    }
}

impl DispatchPolicy {
    /// Number of attempts a pool of `pool_len` credentials receives.
    pub fn attempts_for(&self, pool_len: usize) -> usize {
        match self.per_credential_cap {
            Some(cap) => self.max_attempts.min(pool_len.saturating_mul(cap)),
            None => self.max_attempts,
        }
    }
}

/// Sends one action attempt. [`Transport`] is the production implementation.
#[async_trait]
pub trait ActionSender: Send + Sync {
    async fn send_attempt(
        &self,
        attempt: usize,
        payload: Bytes,
        credential: &Credential,
        url: &Url,
    ) -> bool;
}

#[async_trait]
impl ActionSender for Transport {
    async fn send_attempt(
        &self,
        _attempt: usize,
        payload: Bytes,
        credential: &Credential,
        url: &Url,
    ) -> bool {
        self.send_action(payload, credential, url).await
    }
}

pub struct BatchDispatcher {
    sender: Arc<dyn ActionSender>,
    policy: DispatchPolicy,
    events: Arc<EventDispatcher>,
}

impl BatchDispatcher {
    pub fn new(sender: Arc<dyn ActionSender>, policy: DispatchPolicy) -> Self {
        Self {
            sender,
            policy,
            events: Arc::new(EventDispatcher::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub async fn dispatch(
        &self,
        payload: Bytes,
        pool: Arc<CredentialPool>,
        url: &Url,
    ) -> DispatchOutcome {
        let attempted = self.policy.attempts_for(pool.len());
        let batch_size = self.policy.batch_size.max(1);
        let semaphore = Arc::new(Semaphore::new(self.policy.concurrency_width.max(1)));
        let mut pacing =
            BatchPacing::new(self.policy.batch_pause).with_variance(self.policy.batch_jitter);
        let mut succeeded = 0usize;

        for (batch, start) in (0..attempted).step_by(batch_size).enumerate() {
            let end = (start + batch_size).min(attempted);
            let started = Instant::now();
            let batch_succeeded = self
                .run_batch(start..end, &payload, &pool, url, &semaphore)
                .await;
            succeeded += batch_succeeded;

            self.events.dispatch(LikeEvent::Batch(BatchEvent {
                region: pool.region().to_string(),
                batch,
                attempted: end - start,
                succeeded: batch_succeeded,
                elapsed: started.elapsed(),
                timestamp: chrono::Utc::now(),
            }));

            pacing.register_feedback(PacingFeedback::from_counts(batch_succeeded, end - start));
            if end < attempted {
                let pause = pacing.next_delay();
                if pause > Duration::ZERO {
                    sleep(pause).await;
                }
            }
        }

        log::info!(
            "[{}] sent {}/{} successful requests",
            pool.region(),
            succeeded,
            attempted
        );
        DispatchOutcome {
            attempted,
            succeeded,
        }
    }

    async fn run_batch(
        &self,
        indices: std::ops::Range<usize>,
        payload: &Bytes,
        pool: &Arc<CredentialPool>,
        url: &Url,
        semaphore: &Arc<Semaphore>,
    ) -> usize {
        let mut tasks = JoinSet::new();

        for index in indices {
            let sender = self.sender.clone();
            let events = self.events.clone();
            let semaphore = semaphore.clone();
            let pool = pool.clone();
            let payload = payload.clone();
            let url = url.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return false,
                };
                let started = Instant::now();
                let success = sender
                    .send_attempt(index, payload, pool.get(index), &url)
                    .await;
                events.dispatch(LikeEvent::Attempt(AttemptEvent {
                    region: pool.region().to_string(),
                    index,
                    success,
                    latency: started.elapsed(),
                    timestamp: chrono::Utc::now(),
                }));
                success
            });
        }

        let mut succeeded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(err) => log::error!("dispatch task aborted: {err}"),
            }
        }
        succeeded
    }
}
