//! One-shot state query.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::credentials::Credential;
use crate::modules::events::{EventDispatcher, LikeEvent, ProbeEvent};
use crate::protocol::codec::decode_state;
use crate::protocol::core::{ObservableState, Transport};
use crate::protocol::regions::RegionSpec;

/// Which side of the dispatch a probe observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Before,
    After,
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbePhase::Before => write!(f, "before"),
            ProbePhase::After => write!(f, "after"),
        }
    }
}

pub struct StateProbe {
    transport: Transport,
    events: Arc<EventDispatcher>,
}

impl StateProbe {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            events: Arc::new(EventDispatcher::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    /// Queries the region's state endpoint; `None` on any transport or
    /// decode failure.
    pub async fn probe(
        &self,
        payload: Bytes,
        region: &RegionSpec,
        credential: &Credential,
        phase: ProbePhase,
    ) -> Option<ObservableState> {
        let started = Instant::now();
        let state = self.query(payload, region, credential).await;

        self.events.dispatch(LikeEvent::Probe(ProbeEvent {
            region: region.code.to_string(),
            phase,
            likes: state.as_ref().map(|state| state.likes),
            latency: started.elapsed(),
            timestamp: chrono::Utc::now(),
        }));
        state
    }

    async fn query(
        &self,
        payload: Bytes,
        region: &RegionSpec,
        credential: &Credential,
    ) -> Option<ObservableState> {
        let url = match region.query_url() {
            Ok(url) => url,
            Err(err) => {
                log::error!("{err}");
                return None;
            }
        };

        let body = self.transport.send_query(payload, credential, &url).await?;
        if body.is_empty() {
            log::warn!("[{}] state query returned an empty body", region.code);
            return None;
        }

        match decode_state(&body) {
            Ok(state) => Some(state),
            Err(err) => {
                log::error!("[{}] error decoding state response: {err}", region.code);
                None
            }
        }
    }
}
