use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Order of the result list returned by a concurrent dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// `results[i]` belongs to `identifiers[i]`.
    #[default]
    Input,
    /// Results in the order requests finished.
    Completion,
}

/// Transport-level settings for the default reqwest client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    /// Proxy URLs; `https://` entries proxy https traffic, the rest http.
    pub proxies: Vec<String>,
    pub user_agent: Option<String>,
}

impl ClientSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// Declarative part of an endpoint, loadable from TOML and environment.
///
/// The parser and request customizer are code and are attached on the
/// [`EndpointBuilder`](crate::EndpointBuilder) afterwards.
///
/// ```toml
/// base_url = "https://api.weather.gov/offices/"
/// method = "GET"
/// max_parallel = 8
/// max_retries = 3
///
/// [headers]
/// Accept = "application/geo+json"
///
/// [client]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    /// Upper bound on in-flight requests; 0 means no explicit cap.
    pub max_parallel: usize,
    /// Additional attempts after the first transport failure.
    pub max_retries: u32,
    /// Base delay between retries in milliseconds; 0 retries immediately.
    pub retry_backoff_ms: u64,
    pub order: ResultOrder,
    pub client: ClientSettings,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            max_parallel: 0,
            max_retries: 0,
            retry_backoff_ms: 0,
            order: ResultOrder::Input,
            client: ClientSettings::default(),
        }
    }
}

impl EndpointConfig {
    pub const ENV_PREFIX: &str = "FANFETCH_";

    /// Load from defaults, then `path` (TOML) if given, then `FANFETCH_*`
    /// environment variables. Nested keys use `__`, e.g.
    /// `FANFETCH_CLIENT__TIMEOUT_SECS`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path
            && !path.is_file()
        {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(EndpointConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.method, "GET");
        assert_eq!(config.max_parallel, 0);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.order, ResultOrder::Input);
        assert_eq!(config.retry_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EndpointConfig::load(Some(Path::new("/nonexistent/fanfetch.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_toml_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "fanfetch.toml",
                r#"
                base_url = "https://example.com/dictionary/"
                max_parallel = 8
                max_retries = 3
                order = "completion"

                [headers]
                Accept = "text/html"

                [client]
                timeout_secs = 10
                "#,
            )?;
            jail.set_env("FANFETCH_MAX_RETRIES", "5");
            jail.set_env("FANFETCH_CLIENT__CONNECT_TIMEOUT_SECS", "2");

            let config = EndpointConfig::load(Some(Path::new("fanfetch.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.base_url, "https://example.com/dictionary/");
            assert_eq!(config.method, "GET");
            assert_eq!(config.max_parallel, 8);
            assert_eq!(config.max_retries, 5);
            assert_eq!(config.order, ResultOrder::Completion);
            assert_eq!(config.headers.get("Accept").map(String::as_str), Some("text/html"));
            assert_eq!(config.client.timeout(), Some(Duration::from_secs(10)));
            assert_eq!(config.client.connect_timeout(), Some(Duration::from_secs(2)));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_bad_order() {
        Jail::expect_with(|jail| {
            jail.create_file("fanfetch.toml", r#"order = "random""#)?;
            let err = EndpointConfig::load(Some(Path::new("fanfetch.toml"))).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
