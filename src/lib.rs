//! # likeburst
//!
//! Client for a binary-over-HTTP game protocol that replicates one profile
//! action across many credentials and measures the effect.
//!
//! One invocation:
//!
//! 1. Load the region's credential pool.
//! 2. Encrypt a state query once and probe the target's like counter.
//! 3. Encrypt the action once and dispatch it concurrently, one attempt per
//!    credential slot, bounded by a concurrency width.
//! 4. Wait for the server to settle, probe again, and classify the delta.
//!
//! ## Example
//!
//! ```no_run
//! use likeburst::LikeClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LikeClient::builder().with_credential_dir("./tokens").build()?;
//!     let result = client.send_likes("123456789", "IND").await?;
//!     println!("likes given: {}", result.delta);
//!     Ok(())
//! }
//! ```

mod client;

pub mod config;
pub mod credentials;
pub mod modules;
pub mod protocol;
pub mod server;

pub use crate::client::{LikeClient, LikeClientBuilder, LikeClientConfig, LikeError, LikeResult};

pub use crate::config::{ServiceConfig, SettingsError};

pub use crate::credentials::{Credential, CredentialError, CredentialPool, ProvisionPolicy};

pub use crate::protocol::cipher::{CipherError, CipherTransform};
pub use crate::protocol::codec::{ActionRequest, CodecError, QueryRequest};
pub use crate::protocol::core::{
    ActionResult,
    Classification,
    DispatchOutcome,
    GameHttpClient,
    GameHttpClientError,
    GameHttpResponse,
    ObservableState,
    ReqwestGameHttpClient,
    Transport,
};
pub use crate::protocol::dispatcher::{ActionSender, BatchDispatcher, DispatchPolicy};
pub use crate::protocol::probe::{ProbePhase, StateProbe};
pub use crate::protocol::regions::{ClientProfile, RegionError, RegionSpec};

pub use crate::modules::{
    EventDispatcher,
    EventHandler,
    LikeEvent,
    LoggingHandler,
    MetricsCollector,
    MetricsSnapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
