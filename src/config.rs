use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::actions::{EndpointTable, RetryPolicy};
use crate::models::ActionKind;

/// Application-level constants
pub const APP_NAME: &str = "Docflow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(5);

const ENV_PREFIX: &str = "DOCFLOW_";

/// Get the application data directory
/// Falls back to the working directory when the platform reports none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME.to_lowercase()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the shared store
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("memory.db")
}

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "docflow=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("{key} must be a socket address, got {value:?}")]
    InvalidAddress { key: String, value: String },

    #[error("{key} must be at least 1")]
    ZeroAttempts { key: String },
}

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub retry: RetryPolicy,
    pub action_timeout: Duration,
    pub endpoints: EndpointTable,
}

impl AppConfig {
    /// Read `DOCFLOW_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup. Unset keys keep
    /// their defaults; set-but-invalid keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        };

        let db_path = get("DB_PATH")
            .map(|(_, value)| PathBuf::from(value))
            .unwrap_or_else(default_db_path);

        let bind_addr: SocketAddr = match get("BIND") {
            Some((key, value)) => value
                .parse()
                .map_err(|_| ConfigError::InvalidAddress { key, value })?,
            None => DEFAULT_BIND
                .parse()
                .map_err(|_| ConfigError::InvalidAddress {
                    key: "default".into(),
                    value: DEFAULT_BIND.into(),
                })?,
        };

        let mut retry = RetryPolicy::default();
        if let Some((key, value)) = get("MAX_ATTEMPTS") {
            let attempts = parse_u64(&key, &value)?;
            if attempts == 0 {
                return Err(ConfigError::ZeroAttempts { key });
            }
            retry.max_attempts = u32::try_from(attempts)
                .map_err(|_| ConfigError::InvalidNumber { key, value })?;
        }
        if let Some((key, value)) = get("RETRY_DELAY_SECS") {
            retry.delay = Duration::from_secs(parse_u64(&key, &value)?);
        }

        let action_timeout = match get("ACTION_TIMEOUT_SECS") {
            Some((key, value)) => Duration::from_secs(parse_u64(&key, &value)?),
            None => DEFAULT_ACTION_TIMEOUT,
        };

        let mut endpoints = EndpointTable::standard();
        for kind in ActionKind::ALL {
            let name = format!("ENDPOINT_{}", kind.as_str().to_uppercase());
            if let Some((_, url)) = get(&name) {
                endpoints.set(kind, url);
            }
        }

        Ok(Self {
            db_path,
            bind_addr,
            retry,
            action_timeout,
            endpoints,
        })
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.action_timeout, DEFAULT_ACTION_TIMEOUT);
        assert_eq!(config.endpoints, EndpointTable::standard());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOCFLOW_DB_PATH", "/tmp/x.db"),
            ("DOCFLOW_BIND", "0.0.0.0:9000"),
            ("DOCFLOW_MAX_ATTEMPTS", "5"),
            ("DOCFLOW_RETRY_DELAY_SECS", "0"),
            ("DOCFLOW_ACTION_TIMEOUT_SECS", "10"),
            ("DOCFLOW_ENDPOINT_CRM_LOG", "http://localhost:1/log"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay, Duration::ZERO);
        assert_eq!(config.action_timeout, Duration::from_secs(10));
        assert_eq!(
            config.endpoints.url_for(ActionKind::CrmLog),
            Some("http://localhost:1/log")
        );
        assert_eq!(
            config.endpoints.url_for(ActionKind::CrmEscalate),
            Some("http://example.com/crm/escalate")
        );
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DOCFLOW_MAX_ATTEMPTS", "  ")])).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn invalid_number_is_error() {
        let err = AppConfig::from_lookup(lookup(&[("DOCFLOW_RETRY_DELAY_SECS", "two")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "DOCFLOW_RETRY_DELAY_SECS".into(),
                value: "two".into(),
            }
        );
    }

    #[test]
    fn zero_attempts_is_error() {
        let err = AppConfig::from_lookup(lookup(&[("DOCFLOW_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroAttempts { .. }));
    }

    #[test]
    fn invalid_bind_is_error() {
        let err = AppConfig::from_lookup(lookup(&[("DOCFLOW_BIND", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { .. }));
    }

    #[test]
    fn app_name_is_docflow() {
        assert_eq!(APP_NAME, "Docflow");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
