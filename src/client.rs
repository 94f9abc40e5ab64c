//! High level like orchestration.
//!
//! Wires together the credential pool, codec, cipher, probe, and dispatcher:
//! probe the target's counter, fan out the encrypted action, wait for the
//! server to settle, probe again, and classify the difference.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;
use tokio::time::sleep;

use crate::credentials::{CredentialError, CredentialPool, ProvisionPolicy};
use crate::modules::events::{
	CompletedEvent, ErrorEvent, EventDispatcher, EventHandler, LikeEvent, LoggingHandler,
	MetricsHandler,
};
use crate::modules::metrics::MetricsCollector;
use crate::protocol::cipher::{CipherError, CipherTransform, ciphertext_body};
use crate::protocol::codec::{
	ActionRequest, CodecError, QueryRequest, encode_action, encode_query, parse_uid,
};
use crate::protocol::core::{
	ActionResult, DEFAULT_CALL_TIMEOUT, GameHttpClient, GameHttpClientError,
	ReqwestGameHttpClient, Transport,
};
use crate::protocol::dispatcher::{ActionSender, BatchDispatcher, DispatchPolicy};
use crate::protocol::probe::{ProbePhase, StateProbe};
use crate::protocol::regions::{RegionError, RegionSpec, lookup_region};

/// Result alias used across the orchestration layer.
pub type LikeResult<T> = Result<T, LikeError>;

/// Invocation-level failure. No partial result accompanies any of these.
#[derive(Debug, Error)]
pub enum LikeError {
	#[error(transparent)]
	Config(#[from] RegionError),
	#[error(transparent)]
	Credential(#[from] CredentialError),
	#[error(transparent)]
	Codec(#[from] CodecError),
	#[error("encryption failed: {0}")]
	Cipher(#[from] CipherError),
	#[error("http client initialisation failed: {0}")]
	Transport(#[from] GameHttpClientError),
	#[error("{}", state_message(.phase))]
	State { phase: ProbePhase },
	#[error("internal task failure: {0}")]
	Internal(String),
}

fn state_message(phase: &ProbePhase) -> &'static str {
	match phase {
		ProbePhase::Before => "Failed to retrieve player info",
		ProbePhase::After => "Failed to retrieve updated player info",
	}
}

impl LikeError {
	/// HTTP-style status surfaced to front-end callers.
	pub fn http_status(&self) -> u16 {
		match self {
			LikeError::Config(RegionError::Unsupported { .. })
			| LikeError::Codec(CodecError::InvalidUid(_)) => 400,
			_ => 500,
		}
	}

	/// Taxonomy name of the failure.
	pub fn kind(&self) -> &'static str {
		match self {
			LikeError::Config(_) => "ConfigError",
			LikeError::Credential(_) => "CredentialError",
			LikeError::Codec(_) | LikeError::Cipher(_) => "CodecError",
			LikeError::Transport(_) => "TransportError",
			LikeError::State { .. } => "StateError",
			LikeError::Internal(_) => "InternalError",
		}
	}
}

/// Client configuration used by the builder.
#[derive(Debug, Clone)]
pub struct LikeClientConfig {
	pub credential_dir: PathBuf,
	pub provision_policy: ProvisionPolicy,
	pub dispatch: DispatchPolicy,
	pub settle_delay: Duration,
	pub request_timeout: Duration,
	pub enable_metrics: bool,
}

impl Default for LikeClientConfig {
	fn default() -> Self {
		Self {
			credential_dir: PathBuf::from("."),
			provision_policy: ProvisionPolicy::Strict,
			dispatch: DispatchPolicy::default(),
			settle_delay: Duration::from_secs(1),
			request_timeout: DEFAULT_CALL_TIMEOUT,
			enable_metrics: true,
		}
	}
}

/// Fluent builder for [`LikeClient`].
pub struct LikeClientBuilder {
	config: LikeClientConfig,
	http_client: Option<Arc<dyn GameHttpClient>>,
	action_sender: Option<Arc<dyn ActionSender>>,
	handlers: Vec<Arc<dyn EventHandler>>,
}

impl LikeClientBuilder {
	pub fn new() -> Self {
		Self {
			config: LikeClientConfig::default(),
			http_client: None,
			action_sender: None,
			handlers: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: LikeClientConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_credential_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.config.credential_dir = dir.into();
		self
	}

	pub fn with_provision_policy(mut self, policy: ProvisionPolicy) -> Self {
		self.config.provision_policy = policy;
		self
	}

	pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
		self.config.dispatch = policy;
		self
	}

	pub fn with_settle_delay(mut self, delay: Duration) -> Self {
		self.config.settle_delay = delay;
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	pub fn disable_metrics(mut self) -> Self {
		self.config.enable_metrics = false;
		self
	}

	/// Use a caller-owned HTTP client instead of building a reqwest pool.
	pub fn with_http_client(mut self, client: Arc<dyn GameHttpClient>) -> Self {
		self.http_client = Some(client);
		self
	}

	/// Route dispatch attempts through `sender` instead of the HTTP transport.
	pub fn with_action_sender(mut self, sender: Arc<dyn ActionSender>) -> Self {
		self.action_sender = Some(sender);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn build(self) -> LikeResult<LikeClient> {
		LikeClient::from_parts(self)
	}
}

impl Default for LikeClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Main orchestrator. Owns the shared HTTP client for its whole lifetime.
pub struct LikeClient {
	config: LikeClientConfig,
	cipher: CipherTransform,
	probe: StateProbe,
	dispatcher: BatchDispatcher,
	metrics: Option<MetricsCollector>,
	events: Arc<EventDispatcher>,
}

impl LikeClient {
	/// Construct a client with default configuration.
	pub fn new() -> LikeResult<Self> {
		LikeClientBuilder::new().build()
	}

	/// Obtain a builder to customise the client instance.
	pub fn builder() -> LikeClientBuilder {
		LikeClientBuilder::new()
	}

	fn from_parts(builder: LikeClientBuilder) -> LikeResult<Self> {
		let LikeClientBuilder {
			config,
			http_client,
			action_sender,
			handlers,
		} = builder;

		let http_client: Arc<dyn GameHttpClient> = match http_client {
			Some(client) => client,
			None => Arc::new(ReqwestGameHttpClient::with_timeout(config.request_timeout)?),
		};
		let transport = Transport::new(http_client).with_timeout(config.request_timeout);

		let metrics = config.enable_metrics.then(MetricsCollector::new);

		let mut events = EventDispatcher::new();
		events.register_handler(Arc::new(LoggingHandler));
		if let Some(ref collector) = metrics {
			events.register_handler(Arc::new(MetricsHandler::new(collector.clone())));
		}
		for handler in handlers {
			events.register_handler(handler);
		}
		let events = Arc::new(events);

		let sender: Arc<dyn ActionSender> = match action_sender {
			Some(sender) => sender,
			None => Arc::new(transport.clone()),
		};
		let dispatcher = BatchDispatcher::new(sender, config.dispatch.clone())
			.with_events(events.clone());
		let probe = StateProbe::new(transport).with_events(events.clone());

		Ok(Self {
			config,
			cipher: CipherTransform::protocol(),
			probe,
			dispatcher,
			metrics,
			events,
		})
	}

	pub fn config(&self) -> &LikeClientConfig {
		&self.config
	}

	/// Metrics collected so far, when enabled.
	pub fn metrics(&self) -> Option<&MetricsCollector> {
		self.metrics.as_ref()
	}

	/// Runs one full invocation for `uid` against `region`.
	pub async fn send_likes(&self, uid: &str, region: &str) -> LikeResult<ActionResult> {
		let started = Instant::now();
		let code = region.trim().to_ascii_uppercase();

		match self.run(uid, &code, started).await {
			Ok(result) => {
				self.events.dispatch(LikeEvent::Completed(CompletedEvent {
					region: result.region.clone(),
					uid: result.after.uid,
					delta: result.delta,
					succeeded: result.dispatch.succeeded,
					attempted: result.dispatch.attempted,
					elapsed: result.elapsed,
					timestamp: chrono::Utc::now(),
				}));
				Ok(result)
			}
			Err(err) => {
				self.events.dispatch(LikeEvent::Error(ErrorEvent {
					region: code,
					error: err.to_string(),
					timestamp: chrono::Utc::now(),
				}));
				Err(err)
			}
		}
	}

	async fn run(&self, uid: &str, region: &str, started: Instant) -> LikeResult<ActionResult> {
		let spec = lookup_region(region)?;
		let uid = parse_uid(uid)?;
		let pool = Arc::new(self.load_pool(spec).await?);
		let probe_credential = pool.get(0).clone();

		let query = self.seal(&encode_query(&QueryRequest::new(uid)))?;
		let before = self
			.probe
			.probe(query.clone(), spec, &probe_credential, ProbePhase::Before)
			.await
			.ok_or(LikeError::State {
				phase: ProbePhase::Before,
			})?;

		let action = self.seal(&encode_action(&ActionRequest::new(uid, spec.code)))?;
		let action_url = spec.action_url()?;
		let dispatch = self.dispatcher.dispatch(action, pool, &action_url).await;

		if self.config.settle_delay > Duration::ZERO {
			sleep(self.config.settle_delay).await;
		}

		let after = self
			.probe
			.probe(query, spec, &probe_credential, ProbePhase::After)
			.await
			.ok_or(LikeError::State {
				phase: ProbePhase::After,
			})?;

		Ok(ActionResult::new(
			before,
			after,
			dispatch,
			started.elapsed(),
			spec.code,
		))
	}

	async fn load_pool(&self, spec: &'static RegionSpec) -> LikeResult<CredentialPool> {
		let dir = self.config.credential_dir.clone();
		let policy = self.config.provision_policy;
		tokio::task::spawn_blocking(move || CredentialPool::load_spec(&dir, spec, policy))
			.await
			.map_err(|err| LikeError::Internal(format!("credential load task: {err}")))?
			.map_err(LikeError::from)
	}

	/// Encrypts a record once; the returned body is cloned cheaply per call.
	fn seal(&self, record: &[u8]) -> LikeResult<Bytes> {
		Ok(ciphertext_body(&self.cipher.encrypt(record))?)
	}
}
