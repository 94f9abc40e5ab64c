//! Region table and fixed client profile.
//!
//! Responsibilities:
//! - Map a region code to its credential store and base endpoint.
//! - Build the action and query URLs for a region.
//! - Provide the fixed client-identification header set sent on every call.

use std::collections::HashMap;

use http::header::{
    ACCEPT_ENCODING, AUTHORIZATION, CONNECTION, CONTENT_TYPE, EXPECT, HeaderMap, HeaderName,
    HeaderValue, USER_AGENT,
};
use once_cell::sync::Lazy;
use thiserror::Error;
use url::Url;

pub const ACTION_PATH: &str = "LikeProfile";
pub const QUERY_PATH: &str = "GetPlayerPersonalShow";

/// One deployment of the target service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    pub code: &'static str,
    pub store_file: &'static str,
    pub base_url: &'static str,
}

impl RegionSpec {
    const fn new(code: &'static str, store_file: &'static str, base_url: &'static str) -> Self {
        Self {
            code,
            store_file,
            base_url,
        }
    }

    pub fn action_url(&self) -> Result<Url, RegionError> {
        self.endpoint(ACTION_PATH)
    }

    pub fn query_url(&self) -> Result<Url, RegionError> {
        self.endpoint(QUERY_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegionError> {
        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|source| RegionError::InvalidEndpoint {
            code: self.code,
            source,
        })
    }
}

const US_BASE: &str = "https://client.us.freefiremobile.com";

static REGIONS: &[RegionSpec] = &[
    RegionSpec::new("IND", "token_ind.json", "https://client.ind.freefiremobile.com"),
    RegionSpec::new("BR", "token_br.json", US_BASE),
    RegionSpec::new("US", "token_br.json", US_BASE),
    RegionSpec::new("SAC", "token_br.json", US_BASE),
    RegionSpec::new("NA", "token_br.json", US_BASE),
    RegionSpec::new("BD", "token_bd.json", "https://clientbp.ggblueshark.com"),
    RegionSpec::new("ID", "token_id.json", "https://clientid.freefiremobile.com"),
    RegionSpec::new("VN", "token_vn.json", "https://clientvn.freefiremobile.com"),
    RegionSpec::new("CIS", "token_cis.json", "https://clientcis.freefiremobile.com"),
    RegionSpec::new("PK", "token_pk.json", "https://clientpk.freefiremobile.com"),
    RegionSpec::new("SG", "token_sg.json", "https://clientsg.freefiremobile.com"),
    RegionSpec::new("EU", "token_eu.json", "https://clienteu.freefiremobile.com"),
    RegionSpec::new("TW", "token_tw.json", "https://clienttw.freefiremobile.com"),
    RegionSpec::new("ME", "token_me.json", "https://clientme.freefiremobile.com"),
    RegionSpec::new("TH", "token_th.json", "https://clientth.freefiremobile.com"),
];

static REGION_INDEX: Lazy<HashMap<&'static str, &'static RegionSpec>> =
    Lazy::new(|| REGIONS.iter().map(|spec| (spec.code, spec)).collect());

/// Looks up a region by code, case-insensitively.
pub fn lookup_region(code: &str) -> Result<&'static RegionSpec, RegionError> {
    let normalized = code.trim().to_ascii_uppercase();
    REGION_INDEX
        .get(normalized.as_str())
        .copied()
        .ok_or_else(|| RegionError::Unsupported {
            code: normalized,
            available: supported_regions().join(", "),
        })
}

/// Supported region codes in table order.
pub fn supported_regions() -> Vec<&'static str> {
    REGIONS.iter().map(|spec| spec.code).collect()
}

/// Fixed client-identification headers mimicking the mobile game client.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    headers: HeaderMap,
}

impl ClientProfile {
    pub fn mobile() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Dalvik/2.1.0 (Linux; U; Android 9; ASUS_Z01QD Build/PI)"),
        );
        headers.insert(CONNECTION, HeaderValue::from_static("Keep-Alive"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(EXPECT, HeaderValue::from_static("100-continue"));
        headers.insert(
            HeaderName::from_static("x-unity-version"),
            HeaderValue::from_static("2018.4.11f1"),
        );
        headers.insert(HeaderName::from_static("x-ga"), HeaderValue::from_static("v1 1"));
        headers.insert(
            HeaderName::from_static("releaseversion"),
            HeaderValue::from_static("OB50"),
        );
        Self { headers }
    }

    /// Base headers plus `Authorization: Bearer <token>`.
    pub fn authorized(&self, token: &str) -> Result<HeaderMap, RegionError> {
        let mut headers = self.headers.clone();
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| RegionError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self::mobile()
    }
}

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Unsupported server '{code}'. Available: {available}")]
    Unsupported { code: String, available: String },
    #[error("invalid endpoint for region {code}: {source}")]
    InvalidEndpoint {
        code: &'static str,
        source: url::ParseError,
    },
    #[error("credential token is not a valid header value")]
    InvalidToken,
}
