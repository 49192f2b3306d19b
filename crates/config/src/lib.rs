// Configuration loading
//
// Every run reads the same fixed set of keys. Required keys must be present
// and non-empty; optional keys fall back to defaults.

pub mod source;

use std::fmt;
use std::time::Duration;

pub use source::{load_env_file, merged_source, Source, DEFAULT_ENV_FILE};

pub const API_URL: &str = "API_URL";
pub const TAMPERPROOF_URL: &str = "TAMPERPROOF_URL";
pub const USER_ID: &str = "USER_ID";
pub const USER_PRIVATE_KEY: &str = "USER_PRIVATE_KEY";
pub const USER_PUBLIC_KEY: &str = "USER_PUBLIC_KEY";
pub const AUTH_SCHEME: &str = "AUTH_SCHEME";
pub const PERSIST_WAIT_SECS: &str = "PERSIST_WAIT_SECS";
pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

/// Required keys, in the order they are checked.
pub const REQUIRED_KEYS: [&str; 5] = [
    API_URL,
    TAMPERPROOF_URL,
    USER_ID,
    USER_PRIVATE_KEY,
    USER_PUBLIC_KEY,
];

/// Every key the loader reads.
pub const ALL_KEYS: [&str; 8] = [
    API_URL,
    TAMPERPROOF_URL,
    USER_ID,
    USER_PRIVATE_KEY,
    USER_PUBLIC_KEY,
    AUTH_SCHEME,
    PERSIST_WAIT_SECS,
    HTTP_TIMEOUT_SECS,
];

pub const DEFAULT_SCHEMA: &str = "se_playground";
pub const DEFAULT_AUTH_SCHEME: &str = "ed25519";
pub const DEFAULT_PERSIST_WAIT: Duration = Duration::from_secs(10);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {key}: set it in your .env file or the environment")]
    Missing { key: &'static str },

    #[error("invalid value for {key}: {value:?} is not a whole number of seconds")]
    Invalid { key: &'static str, value: String },

    #[error("cannot read env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Validated run configuration. Never mutated after load.
#[derive(Clone)]
pub struct Config {
    /// API base, always ending in `/`
    pub api_url: String,
    /// Query endpoint path relative to `api_url`, no leading `/`
    pub tamperproof_url: String,
    pub user_id: String,
    /// Base64 ed25519 private key (32-byte seed or 64-byte keypair)
    pub user_private_key: String,
    /// Base64 ed25519 public key, sent verbatim to the token endpoint
    pub user_public_key: String,
    pub auth_scheme: String,
    /// Schema the capability token's resource lives in
    pub schema: String,
    /// Delay between insert and query
    pub persist_wait: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Build a config from a key/value source and the optional schema argument.
    pub fn from_source(source: &Source, schema: Option<&str>) -> Result<Self, ConfigError> {
        let api_url = required(source, API_URL)?;
        let tamperproof_url = required(source, TAMPERPROOF_URL)?;
        let user_id = required(source, USER_ID)?;
        let user_private_key = required(source, USER_PRIVATE_KEY)?;
        let user_public_key = required(source, USER_PUBLIC_KEY)?;

        let auth_scheme = optional(source, AUTH_SCHEME).unwrap_or_else(|| {
            tracing::debug!("{} not set, defaulting to {}", AUTH_SCHEME, DEFAULT_AUTH_SCHEME);
            DEFAULT_AUTH_SCHEME.to_string()
        });

        let schema = match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => {
                tracing::debug!("no schema provided, defaulting to {}", DEFAULT_SCHEMA);
                DEFAULT_SCHEMA.to_string()
            }
        };

        Ok(Self {
            api_url: normalize_base(&api_url),
            tamperproof_url: tamperproof_url.trim_start_matches('/').to_string(),
            user_id,
            user_private_key,
            user_public_key,
            auth_scheme,
            schema,
            persist_wait: seconds(source, PERSIST_WAIT_SECS)?.unwrap_or(DEFAULT_PERSIST_WAIT),
            http_timeout: seconds(source, HTTP_TIMEOUT_SECS)?.unwrap_or(DEFAULT_HTTP_TIMEOUT),
        })
    }

    /// Full URL for an endpoint path under the API base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Full URL of the tamper-proof query endpoint.
    pub fn query_url(&self) -> String {
        self.endpoint(&self.tamperproof_url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("tamperproof_url", &self.tamperproof_url)
            .field("user_id", &self.user_id)
            .field("user_private_key", &"***")
            .field("user_public_key", &self.user_public_key)
            .field("auth_scheme", &self.auth_scheme)
            .field("schema", &self.schema)
            .field("persist_wait", &self.persist_wait)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn optional(source: &Source, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(source: &Source, key: &'static str) -> Result<String, ConfigError> {
    optional(source, key).ok_or(ConfigError::Missing { key })
}

fn seconds(source: &Source, key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match optional(source, key) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(|n| Some(Duration::from_secs(n)))
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn normalize_base(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_source() -> Source {
        [
            (API_URL, "https://api.example.test/v1/"),
            (TAMPERPROOF_URL, "sql/tamperproof-query"),
            (USER_ID, "alice"),
            (USER_PRIVATE_KEY, "cHJpdmF0ZQ=="),
            (USER_PUBLIC_KEY, "cHVibGlj"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_source(&full_source(), None).unwrap();
        assert_eq!(config.schema, "se_playground");
        assert_eq!(config.auth_scheme, "ed25519");
        assert_eq!(config.persist_wait, Duration::from_secs(10));
        assert_eq!(config.http_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_schema_argument_wins() {
        let config = Config::from_source(&full_source(), Some("analytics")).unwrap();
        assert_eq!(config.schema, "analytics");

        let blank = Config::from_source(&full_source(), Some("  ")).unwrap();
        assert_eq!(blank.schema, "se_playground");
    }

    #[test]
    fn test_each_required_key_is_enforced() {
        for key in REQUIRED_KEYS {
            let mut source = full_source();
            source.remove(key);
            match Config::from_source(&source, None) {
                Err(ConfigError::Missing { key: missing }) => assert_eq!(missing, key),
                other => panic!("expected Missing({}), got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut source = full_source();
        source.insert(USER_ID.into(), "   ".into());
        let err = Config::from_source(&source, None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: USER_ID }));
        assert!(err.to_string().contains("USER_ID"));
    }

    #[test]
    fn test_endpoint_joining() {
        let mut source = full_source();
        source.insert(API_URL.into(), "https://api.example.test/v1".into());
        source.insert(TAMPERPROOF_URL.into(), "/sql/tamperproof-query".into());
        let config = Config::from_source(&source, None).unwrap();

        assert_eq!(config.api_url, "https://api.example.test/v1/");
        assert_eq!(config.endpoint("auth/code"), "https://api.example.test/v1/auth/code");
        assert_eq!(config.query_url(), "https://api.example.test/v1/sql/tamperproof-query");
    }

    #[test]
    fn test_numeric_overrides() {
        let mut source = full_source();
        source.insert(PERSIST_WAIT_SECS.into(), "0".into());
        source.insert(HTTP_TIMEOUT_SECS.into(), "5".into());
        let config = Config::from_source(&source, None).unwrap();
        assert_eq!(config.persist_wait, Duration::ZERO);
        assert_eq!(config.http_timeout, Duration::from_secs(5));

        source.insert(PERSIST_WAIT_SECS.into(), "ten".into());
        let err = Config::from_source(&source, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: PERSIST_WAIT_SECS, .. }));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = Config::from_source(&full_source(), None).unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("cHJpdmF0ZQ=="));
        assert!(dbg.contains("***"));
    }
}
