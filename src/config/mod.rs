//! Service configuration
//!
//! Reads the process settings from environment variables and turns them into
//! a [`LikeClientConfig`] plus the listen address for the front end.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::client::LikeClientConfig;
use crate::credentials::ProvisionPolicy;
use crate::protocol::dispatcher::DispatchPolicy;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the HTTP front end and the client it hosts.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub client: LikeClientConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            client: LikeClientConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServiceConfig::default();
        let defaults = DispatchPolicy::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        config.port = parse_or(&lookup, "PORT", config.port)?;

        let client = &mut config.client;
        if let Some(dir) = lookup("LIKE_CREDENTIAL_DIR") {
            client.credential_dir = PathBuf::from(dir);
        }
        client.provision_policy =
            parse_or(&lookup, "LIKE_PROVISION_POLICY", ProvisionPolicy::Strict)?;
        client.dispatch = DispatchPolicy {
            max_attempts: parse_or(&lookup, "LIKE_MAX_ATTEMPTS", defaults.max_attempts)?,
            concurrency_width: positive(
                "LIKE_CONCURRENCY",
                parse_or(&lookup, "LIKE_CONCURRENCY", defaults.concurrency_width)?,
            )?,
            batch_size: positive(
                "LIKE_BATCH_SIZE",
                parse_or(&lookup, "LIKE_BATCH_SIZE", defaults.batch_size)?,
            )?,
            batch_pause: Duration::from_millis(parse_or(
                &lookup,
                "LIKE_BATCH_PAUSE_MS",
                defaults.batch_pause.as_millis() as u64,
            )?),
            batch_jitter: fraction(
                "LIKE_BATCH_JITTER",
                parse_or(&lookup, "LIKE_BATCH_JITTER", defaults.batch_jitter)?,
            )?,
            per_credential_cap: match lookup("LIKE_PER_CREDENTIAL_CAP") {
                None => defaults.per_credential_cap,
                Some(raw) => parse_cap(&raw)?,
            },
        };
        client.settle_delay = Duration::from_millis(parse_or(
            &lookup,
            "LIKE_SETTLE_DELAY_MS",
            client.settle_delay.as_millis() as u64,
        )?);
        client.request_timeout = Duration::from_secs(positive(
            "LIKE_REQUEST_TIMEOUT_SECS",
            parse_or(
                &lookup,
                "LIKE_REQUEST_TIMEOUT_SECS",
                client.request_timeout.as_secs() as usize,
            )?,
        )? as u64);

        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| SettingsError::Invalid {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

fn positive(key: &'static str, value: usize) -> Result<usize, SettingsError> {
    if value == 0 {
        return Err(SettingsError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

fn fraction(key: &'static str, value: f64) -> Result<f64, SettingsError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SettingsError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be between 0.0 and 1.0".into(),
        });
    }
    Ok(value)
}

/// `0` or `none` lifts the cap.
fn parse_cap(raw: &str) -> Result<Option<usize>, SettingsError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match trimmed.parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(cap) => Ok(Some(cap)),
        Err(err) => Err(SettingsError::Invalid {
            key: "LIKE_PER_CREDENTIAL_CAP",
            value: raw.to_string(),
            reason: err.to_string(),
        }),
    }
}
