use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use crate::WikidataError;

pub const DEFAULT_SPARQL_URL: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_ENTITY_API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "LexSrt/1.0 (https://www.wikidata.org/wiki/User:So9q)";

/// Connection and resilience settings for the Wikidata endpoints.
///
/// # Example
/// ```
/// use wikidata::WikidataConfig;
///
/// let cfg = WikidataConfig {
///     timeout_secs: 5,
///     max_concurrent_requests: 2,
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WikidataConfig {
    /// SPARQL endpoint queried with `GET ?query=..&format=json`.
    pub sparql_url: String,
    /// MediaWiki action API used for `wbgetentities`.
    pub entity_api_url: String,
    /// Sent on every request; the query service rejects anonymous clients.
    pub user_agent: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Requests allowed in flight at once across all workers.
    pub max_concurrent_requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_config: Option<RateLimitConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    /// Turn retry, rate limiting and the circuit breaker on or off together.
    pub enable_resilience: bool,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            sparql_url: DEFAULT_SPARQL_URL.into(),
            entity_api_url: DEFAULT_ENTITY_API_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_concurrent_requests: 4,
            retry_config: None,
            rate_limit_config: None,
            circuit_breaker_config: None,
            enable_resilience: true,
        }
    }
}

impl WikidataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), WikidataError> {
        if self.sparql_url.trim().is_empty() {
            return Err(WikidataError::InvalidConfig("sparql_url must not be empty".into()));
        }
        if self.entity_api_url.trim().is_empty() {
            return Err(WikidataError::InvalidConfig(
                "entity_api_url must not be empty".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(WikidataError::InvalidConfig("user_agent must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(WikidataError::InvalidConfig("timeout_secs must be > 0".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(WikidataError::InvalidConfig(
                "connect_timeout_secs must be > 0".into(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(WikidataError::InvalidConfig(
                "max_concurrent_requests must be > 0".into(),
            ));
        }
        if let Some(rate) = &self.rate_limit_config {
            if rate.requests_per_second <= 0.0 || rate.burst_size == 0 {
                return Err(WikidataError::InvalidConfig(
                    "rate limit needs a positive rate and burst".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_endpoints() {
        let cfg = WikidataConfig::default();
        assert_eq!(cfg.sparql_url, "https://query.wikidata.org/sparql");
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.max_concurrent_requests, 4);
        assert!(cfg.user_agent.starts_with("LexSrt/1.0"));
        assert!(cfg.enable_resilience);
        assert!(cfg.retry_config.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_values() {
        let cfg = WikidataConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(WikidataError::InvalidConfig(_))));

        let cfg = WikidataConfig {
            max_concurrent_requests: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = WikidataConfig {
            connect_timeout_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = WikidataConfig {
            rate_limit_config: Some(RateLimitConfig::default().with_requests_per_second(0.0)),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: WikidataConfig =
            serde_json::from_str(r#"{"timeout_secs": 3, "retry_config": {"max_retries": 1}}"#)
                .unwrap();
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.retry_config.unwrap().max_retries, 1);
        assert_eq!(cfg.sparql_url, DEFAULT_SPARQL_URL);
    }
}
