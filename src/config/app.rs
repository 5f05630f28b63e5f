//! `AppConfig`: listen address, store, pagination and request limits.
//!
//! Values come from environment variables (a `.env` file is loaded by the server binary).
//! Only `DATABASE_URL` is required; without it the process refuses to start.

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const ENV_PAGINATE_DEFAULT: &str = "PAGINATE_DEFAULT";
pub const ENV_PAGINATE_MAX: &str = "PAGINATE_MAX";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
pub const ENV_BODY_LIMIT_BYTES: &str = "BODY_LIMIT_BYTES";
pub const ENV_ORIGINS: &str = "ORIGINS";

/// Page sizes for `find`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginateConfig {
    pub default: u64,
    pub max: u64,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        PaginateConfig { default: 10, max: 50 }
    }
}

impl PaginateConfig {
    /// Effective page size: the default when absent, clamped to `max` otherwise.
    pub fn limit(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.default).min(self.max)
    }
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        StoreConfig {
            url: url.into(),
            max_connections: 5,
        }
    }

    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub paginate: PaginateConfig,
    pub request_timeout: Duration,
    pub body_limit: usize,
    /// Allowed CORS origins. Empty allows any origin.
    pub origins: Vec<String>,
}

impl AppConfig {
    /// Defaults around an explicit store URL. Used by tests and embedders.
    pub fn with_store(url: impl Into<String>) -> Self {
        AppConfig {
            host: "localhost".into(),
            port: 3030,
            store: StoreConfig::new(url),
            paginate: PaginateConfig::default(),
            request_timeout: Duration::from_secs(30),
            body_limit: 1024 * 1024,
            origins: Vec::new(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get(ENV_DATABASE_URL).ok_or(ConfigError::MissingStore(ENV_DATABASE_URL))?;
        let mut config = AppConfig::with_store(url);

        if let Some(host) = get(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = parse(ENV_PORT, get(ENV_PORT))? {
            config.port = port;
        }
        if let Some(n) = parse::<u32>(ENV_DATABASE_MAX_CONNECTIONS, get(ENV_DATABASE_MAX_CONNECTIONS))? {
            if n == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_DATABASE_MAX_CONNECTIONS,
                    reason: "must be at least 1".into(),
                });
            }
            config.store.max_connections = n;
        }
        if let Some(n) = parse(ENV_PAGINATE_DEFAULT, get(ENV_PAGINATE_DEFAULT))? {
            config.paginate.default = n;
        }
        if let Some(n) = parse(ENV_PAGINATE_MAX, get(ENV_PAGINATE_MAX))? {
            config.paginate.max = n;
        }
        if config.paginate.default > config.paginate.max {
            return Err(ConfigError::Invalid {
                key: ENV_PAGINATE_DEFAULT,
                reason: format!(
                    "default page size {} exceeds maximum {}",
                    config.paginate.default, config.paginate.max
                ),
            });
        }
        if let Some(ms) = parse::<u64>(ENV_REQUEST_TIMEOUT_MS, get(ENV_REQUEST_TIMEOUT_MS))? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse(ENV_BODY_LIMIT_BYTES, get(ENV_BODY_LIMIT_BYTES))? {
            config.body_limit = n;
        }
        if let Some(origins) = get(ENV_ORIGINS) {
            config.origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|s| {
        s.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", s, e),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_store_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingStore("DATABASE_URL")));
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingStore(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "sqlite://todo.sqlite")])).unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.paginate, PaginateConfig { default: 10, max: 50 });
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.store.max_connections, 5);
        assert!(config.origins.is_empty());
        assert!(!config.store.is_memory());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8998"),
            ("PAGINATE_MAX", "100"),
            ("REQUEST_TIMEOUT_MS", "250"),
            ("ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8998");
        assert_eq!(config.paginate.max, 100);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.store.is_memory());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PAGINATE_DEFAULT", "80")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PAGINATE_DEFAULT", .. }));
    }

    #[test]
    fn page_size_clamps_to_max() {
        let p = PaginateConfig::default();
        assert_eq!(p.limit(None), 10);
        assert_eq!(p.limit(Some(5)), 5);
        assert_eq!(p.limit(Some(0)), 0);
        assert_eq!(p.limit(Some(100)), 50);
    }
}
