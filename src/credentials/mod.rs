//! Per-region credential pools.
//!
//! A pool is loaded once per invocation from the region's JSON store and is
//! read-only afterwards, so concurrent dispatch tasks share it behind an
//! `Arc` without locking. Lookups wrap around the pool, reusing credentials
//! once the attempt index passes the pool size.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::regions::{RegionError, RegionSpec, lookup_region};

/// One usable identity/token pair.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    #[serde(deserialize_with = "uid_from_text_or_number", default)]
    pub uid: String,
    pub token: String,
}

impl Credential {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("uid", &self.uid)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Store files mix numeric and quoted owner ids.
fn uid_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UidField {
        Text(String),
        Number(u64),
    }

    Ok(match UidField::deserialize(deserializer)? {
        UidField::Text(text) => text,
        UidField::Number(number) => number.to_string(),
    })
}

/// What to do when a region's store file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisionPolicy {
    /// Missing store is a load failure.
    #[default]
    Strict,
    /// Write an empty template store, then fail the load.
    AutoProvision,
}

impl std::str::FromStr for ProvisionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ProvisionPolicy::Strict),
            "auto" | "auto-provision" | "auto_provision" => Ok(ProvisionPolicy::AutoProvision),
            other => Err(format!("unknown provision policy '{other}'")),
        }
    }
}

/// All credentials for one region.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    region: &'static str,
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Builds a pool from already-loaded credentials.
    pub fn from_credentials(
        region: &'static str,
        credentials: Vec<Credential>,
    ) -> Result<Self, CredentialError> {
        if credentials.is_empty() {
            return Err(CredentialError::Empty {
                region: region.to_string(),
            });
        }
        Ok(Self {
            region,
            credentials,
        })
    }

    /// Resolves `region` and loads its store from `dir`.
    pub fn load(
        dir: &Path,
        region: &str,
        policy: ProvisionPolicy,
    ) -> Result<Self, CredentialError> {
        let spec = lookup_region(region)?;
        Self::load_spec(dir, spec, policy)
    }

    pub fn load_spec(
        dir: &Path,
        spec: &'static RegionSpec,
        policy: ProvisionPolicy,
    ) -> Result<Self, CredentialError> {
        let path = dir.join(spec.store_file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(missing_store(path, policy));
            }
            Err(source) => return Err(CredentialError::Io { path, source }),
        };

        let credentials: Vec<Credential> =
            serde_json::from_str(&contents).map_err(|source| CredentialError::InvalidJson {
                path: path.clone(),
                source,
            })?;

        let pool = Self::from_credentials(spec.code, credentials)?;
        log::debug!(
            "loaded {} credentials for region {} from {:?}",
            pool.len(),
            spec.code,
            path
        );
        Ok(pool)
    }

    pub fn region(&self) -> &'static str {
        self.region
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Cyclic lookup: `get(i) == get(i % len)`.
    pub fn get(&self, index: usize) -> &Credential {
        &self.credentials[index % self.credentials.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }
}

fn missing_store(path: PathBuf, policy: ProvisionPolicy) -> CredentialError {
    match policy {
        ProvisionPolicy::Strict => CredentialError::Missing { path },
        ProvisionPolicy::AutoProvision => match fs::write(&path, "[]\n") {
            Ok(()) => {
                log::warn!("credential store {:?} was missing; wrote an empty template", path);
                CredentialError::Provisioned { path }
            }
            Err(source) => CredentialError::Io { path, source },
        },
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("credential store not found: {path:?}")]
    Missing { path: PathBuf },
    #[error("credential store was missing; wrote an empty template at {path:?}")]
    Provisioned { path: PathBuf },
    #[error("no credentials found for region {region}")]
    Empty { region: String },
    #[error("credential store JSON invalid at {path:?}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("I/O error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}
