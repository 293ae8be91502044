// Runtime configuration read from the environment.
//
// Every key is optional and falls back to a default. A key that is set but cannot be parsed,
// or is out of range, is an error rather than silently replaced by the default.

use crate::modules::groups::infrastructure::event_bus::DEFAULT_HISTORY_CAPACITY;
use crate::modules::groups::use_cases::sync_changes::queue::SyncPolicy;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const API_URL: &str = "SALES_GROUPS_API_URL";
pub const PAGE_SIZE: &str = "SALES_GROUPS_PAGE_SIZE";
pub const HTTP_TIMEOUT_SECS: &str = "SALES_GROUPS_HTTP_TIMEOUT_SECS";
pub const SYNC_INTERVAL_SECS: &str = "SALES_GROUPS_SYNC_INTERVAL_SECS";
pub const SYNC_MAX_ATTEMPTS: &str = "SALES_GROUPS_SYNC_MAX_ATTEMPTS";
pub const HISTORY_CAPACITY: &str = "SALES_GROUPS_HISTORY_CAPACITY";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_PAGE_SIZE: u32 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: expected {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub sync: SyncPolicy,
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sync: SyncPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = lookup(API_URL).unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(invalid(API_URL, "an http(s) url", api_base_url));
        }

        let page_size = positive(PAGE_SIZE, lookup(PAGE_SIZE))?.unwrap_or(defaults.page_size);
        let request_timeout = positive(HTTP_TIMEOUT_SECS, lookup(HTTP_TIMEOUT_SECS))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let interval = positive(SYNC_INTERVAL_SECS, lookup(SYNC_INTERVAL_SECS))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sync.interval);
        let max_attempts = positive(SYNC_MAX_ATTEMPTS, lookup(SYNC_MAX_ATTEMPTS))?;
        let history_capacity = positive(HISTORY_CAPACITY, lookup(HISTORY_CAPACITY))?
            .unwrap_or(defaults.history_capacity);

        Ok(Self {
            api_base_url,
            page_size,
            request_timeout,
            sync: SyncPolicy {
                interval,
                max_attempts,
            },
            history_capacity,
        })
    }
}

fn positive<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(invalid(key, "a positive integer", raw)),
    }
}

fn invalid(key: &'static str, expected: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid {
        key,
        expected,
        value,
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[rstest]
    fn it_should_fall_back_to_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sync.interval, Duration::from_secs(5));
        assert_eq!(config.sync.max_attempts, None);
        assert_eq!(config.history_capacity, 100);
    }

    #[rstest]
    fn it_should_read_every_key() {
        let config = config_from(&[
            (API_URL, "https://crm.example.com/api"),
            (PAGE_SIZE, "250"),
            (HTTP_TIMEOUT_SECS, "10"),
            (SYNC_INTERVAL_SECS, "2"),
            (SYNC_MAX_ATTEMPTS, "8"),
            (HISTORY_CAPACITY, "20"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "https://crm.example.com/api");
        assert_eq!(config.page_size, 250);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(
            config.sync,
            SyncPolicy {
                interval: Duration::from_secs(2),
                max_attempts: Some(8),
            }
        );
        assert_eq!(config.history_capacity, 20);
    }

    #[rstest]
    fn it_should_treat_blank_values_as_unset() {
        let config = config_from(&[(SYNC_MAX_ATTEMPTS, "  ")]).unwrap();
        assert_eq!(config.sync.max_attempts, None);
    }

    #[rstest]
    #[case(SYNC_INTERVAL_SECS, "0")]
    #[case(SYNC_MAX_ATTEMPTS, "-1")]
    #[case(PAGE_SIZE, "lots")]
    #[case(HISTORY_CAPACITY, "0")]
    #[case(API_URL, "localhost:8080")]
    fn it_should_reject_invalid_values(#[case] key: &'static str, #[case] value: &str) {
        let error = config_from(&[(key, value)]).unwrap_err();
        let ConfigError::Invalid { key: reported, value: raw, .. } = error;
        assert_eq!(reported, key);
        assert_eq!(raw, value);
    }
}
