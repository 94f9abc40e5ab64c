//! Binary record shapes exchanged with the game endpoints.
//!
//! Two write-side records ([`ActionRequest`], [`QueryRequest`]) are encoded
//! with a fixed protobuf schema. The read side ([`PlayerInfo`]) is a separate
//! schema carrying a nested account group; it is never produced by this
//! crate, only parsed.

use prost::Message;
use thiserror::Error;

use super::core::ObservableState;

/// Value the query schema expects in its originator slot.
pub const QUERY_ORIGINATOR: i32 = 1;

/// Action to replicate against a target profile.
#[derive(Clone, PartialEq, Message)]
pub struct ActionRequest {
    #[prost(int64, tag = "1")]
    pub uid: i64,
    #[prost(string, tag = "2")]
    pub region: String,
}

impl ActionRequest {
    pub fn new(uid: i64, region: impl Into<String>) -> Self {
        Self {
            uid,
            region: region.into(),
        }
    }
}

/// State lookup for a target profile.
#[derive(Clone, PartialEq, Message)]
pub struct QueryRequest {
    #[prost(int64, tag = "1")]
    pub uid: i64,
    #[prost(int32, tag = "2")]
    pub originator: i32,
}

impl QueryRequest {
    pub fn new(uid: i64) -> Self {
        Self {
            uid,
            originator: QUERY_ORIGINATOR,
        }
    }
}

/// Top level of the state-query response.
#[derive(Clone, PartialEq, Message)]
pub struct PlayerInfo {
    #[prost(message, optional, tag = "1")]
    pub account_info: Option<AccountInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AccountInfo {
    #[prost(int64, tag = "1")]
    pub uid: i64,
    #[prost(string, tag = "3")]
    pub nickname: String,
    #[prost(string, tag = "5")]
    pub region: String,
    #[prost(uint32, tag = "6")]
    pub level: u32,
    #[prost(uint32, tag = "21")]
    pub likes: u32,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("response payload is empty")]
    Empty,
    #[error("malformed response payload: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("invalid uid '{0}': expected a positive 64-bit integer")]
    InvalidUid(String),
}

/// Parses an inbound uid string into the wire integer. Zero and negative
/// values are rejected.
pub fn parse_uid(raw: &str) -> Result<i64, CodecError> {
    match raw.trim().parse::<i64>() {
        Ok(uid) if uid > 0 => Ok(uid),
        _ => Err(CodecError::InvalidUid(raw.to_string())),
    }
}

pub fn encode_action(request: &ActionRequest) -> Vec<u8> {
    request.encode_to_vec()
}

pub fn encode_query(request: &QueryRequest) -> Vec<u8> {
    request.encode_to_vec()
}

/// Decodes a state-query response into an [`ObservableState`].
///
/// A response without the account group decodes to defaulted fields.
pub fn decode_state(payload: &[u8]) -> Result<ObservableState, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::Empty);
    }

    let info = PlayerInfo::decode(payload)?;
    let account = info.account_info.unwrap_or_default();
    Ok(ObservableState {
        likes: u64::from(account.likes),
        uid: account.uid,
        nickname: account.nickname,
        region: account.region,
        level: account.level,
    })
}
