//! Core utilities shared by the probe, dispatcher, and orchestrator.

pub mod executor;
pub mod reqwest_client;
pub mod timing;
pub mod types;

pub use executor::{
    DEFAULT_CALL_TIMEOUT, GameHttpClient, GameHttpClientError, GameHttpResponse, Transport,
    TransportError,
};
pub use reqwest_client::ReqwestGameHttpClient;
pub use timing::{BatchPacing, PacingFeedback};
pub use types::{ActionResult, Classification, DispatchOutcome, ObservableState};
