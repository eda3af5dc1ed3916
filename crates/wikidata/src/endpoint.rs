use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::resilience::{
    execute_with_retry_async, CircuitBreaker, CircuitState, RateLimitStats, TokenBucket,
};
use crate::{Binding, WikidataConfig, WikidataError};

/// Pooled HTTP client for one endpoint. The connect timeout is fixed per
/// client; the overall timeout is applied per request.
pub(crate) fn build_client(config: &WikidataConfig) -> Result<reqwest::Client, WikidataError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(16)
        .connect_timeout(config.connect_timeout())
        .build()
        .map_err(|e| WikidataError::InvalidConfig(format!("http client: {e}")))
}

/// A remote SPARQL service answering `SELECT` queries.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Run `query` and return its bindings. Each binding maps a variable name
    /// to the bound value (URIs and literals alike, as plain strings).
    async fn select(&self, query: &str) -> Result<Vec<Binding>, WikidataError>;
}

#[async_trait]
impl<E: SparqlEndpoint + ?Sized> SparqlEndpoint for Arc<E> {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, WikidataError> {
        (**self).select(query).await
    }
}

/// Guards shared by every HTTP call to the Wikidata hosts: a breaker, a token
/// bucket and a cap on requests in flight.
#[derive(Debug)]
pub(crate) struct Guards {
    breaker: CircuitBreaker,
    limiter: TokenBucket,
    permits: Semaphore,
}

impl Guards {
    pub(crate) fn new(config: &WikidataConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.circuit_breaker_config.unwrap_or_default()),
            limiter: TokenBucket::new(config.rate_limit_config.unwrap_or_default()),
            permits: Semaphore::new(config.max_concurrent_requests.max(1)),
        }
    }

    /// Run `call` behind the breaker, the concurrency cap, the rate limiter
    /// and retry. `what` only labels log lines.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        config: &WikidataConfig,
        what: &str,
        mut call: F,
    ) -> Result<T, WikidataError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, WikidataError>>,
    {
        if !config.enable_resilience {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| WikidataError::Unavailable(e.to_string()))?;
            return call().await;
        }

        if !self.breaker.allow_request() {
            return Err(WikidataError::Unavailable(format!(
                "circuit breaker open for {what}"
            )));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| WikidataError::Unavailable(e.to_string()))?;

        let retry_cfg = config.retry_config.unwrap_or_default();
        let outcome = execute_with_retry_async(&retry_cfg, WikidataError::is_transient, |attempt| {
            if attempt > 0 {
                debug!(attempt, endpoint = what, "retrying remote call");
            }
            let fut = call();
            async move {
                if !self.limiter.acquire().await {
                    return Err(WikidataError::Unavailable(
                        "rate limiter wait budget exhausted".into(),
                    ));
                }
                fut.await
            }
        })
        .await;
        let attempts = outcome.attempts;
        let result = outcome.result.map_err(|err| err.after_attempts(attempts));

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(err) if err.is_outage() => {
                self.breaker.record_failure();
                warn!(
                    error = %err,
                    attempts,
                    elapsed_ms = outcome.total_duration.as_millis() as u64,
                    endpoint = what,
                    "remote call failed"
                );
            }
            // The endpoint answered; the query itself was the problem.
            Err(_) => self.breaker.record_success(),
        }
        result
    }

    pub(crate) fn circuit_state(&self) -> CircuitState {
        self.breaker.current_state()
    }

    pub(crate) fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats()
    }
}

/// [`SparqlEndpoint`] backed by the Wikidata query service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    config: Arc<WikidataConfig>,
    guards: Arc<Guards>,
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(config: WikidataConfig) -> Result<Self, WikidataError> {
        config.validate()?;
        let guards = Arc::new(Guards::new(&config));
        let client = build_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            guards,
            client,
        })
    }

    pub fn config(&self) -> &WikidataConfig {
        &self.config
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.guards.circuit_state()
    }

    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.guards.rate_limit_stats()
    }

    async fn send(&self, query: &str) -> Result<Value, WikidataError> {
        let timeout = self.config.timeout();
        let response = self
            .client
            .get(&self.config.sparql_url)
            .query(&[("query", query), ("format", "json")])
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/sparql-results+json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikidataError::Status {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| map_send_error(e, timeout))
    }
}

#[async_trait]
impl SparqlEndpoint for HttpEndpoint {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, WikidataError> {
        let payload = self
            .guards
            .run(&self.config, "sparql", || self.send(query))
            .await?;
        parse_bindings(&payload)
    }
}

pub(crate) fn map_send_error(err: reqwest::Error, timeout: std::time::Duration) -> WikidataError {
    // A connect timeout means the host is unreachable, not that the query is slow.
    if err.is_connect() {
        WikidataError::Transport(err.to_string())
    } else if err.is_timeout() {
        WikidataError::Timeout(timeout.as_millis() as u64)
    } else {
        WikidataError::from(err)
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Flatten a SPARQL JSON results document into bindings.
///
/// Expects `{"results": {"bindings": [{"var": {"value": ".."}}, ..]}}`;
/// anything else is a [`WikidataError::MalformedResponse`].
pub fn parse_bindings(payload: &Value) -> Result<Vec<Binding>, WikidataError> {
    let rows = payload
        .get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
        .ok_or_else(|| WikidataError::MalformedResponse("missing results.bindings".into()))?;

    rows.iter()
        .map(|row| {
            let cells = row.as_object().ok_or_else(|| {
                WikidataError::MalformedResponse("binding is not an object".into())
            })?;
            cells
                .iter()
                .map(|(var, cell)| {
                    cell.get("value")
                        .and_then(Value::as_str)
                        .map(|v| (var.clone(), v.to_string()))
                        .ok_or_else(|| {
                            WikidataError::MalformedResponse(format!(
                                "binding for '{var}' has no string value"
                            ))
                        })
                })
                .collect::<Result<Binding, _>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bindings() {
        let payload = json!({
            "head": {"vars": ["form"]},
            "results": {"bindings": [
                {"form": {"type": "uri", "value": "http://www.wikidata.org/entity/L1-F1"}},
                {"form": {"type": "uri", "value": "http://www.wikidata.org/entity/L2-F3"}}
            ]}
        });
        let rows = parse_bindings(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["form"], "http://www.wikidata.org/entity/L2-F3");
    }

    #[test]
    fn empty_bindings_are_ok() {
        let rows = parse_bindings(&json!({"results": {"bindings": []}})).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_bindings_is_malformed() {
        for payload in [
            json!({}),
            json!({"results": {}}),
            json!({"results": {"bindings": [1]}}),
            json!({"results": {"bindings": [{"form": {"type": "uri"}}]}}),
        ] {
            assert!(matches!(
                parse_bindings(&payload),
                Err(WikidataError::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn http_endpoint_rejects_invalid_config() {
        let cfg = WikidataConfig {
            sparql_url: String::new(),
            ..Default::default()
        };
        assert!(HttpEndpoint::new(cfg).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_outage() {
        let cfg = WikidataConfig {
            sparql_url: "http://127.0.0.1:9/sparql".into(),
            timeout_secs: 2,
            retry_config: Some(
                crate::RetryConfig::default()
                    .with_max_retries(1)
                    .with_base_delay(std::time::Duration::from_millis(1))
                    .with_jitter(false),
            ),
            ..Default::default()
        };
        let endpoint = HttpEndpoint::new(cfg).unwrap();
        let err = endpoint.select("SELECT ?x WHERE {}").await.unwrap_err();
        assert!(err.is_outage(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn open_breaker_fails_fast() {
        let cfg = WikidataConfig {
            circuit_breaker_config: Some(
                crate::CircuitBreakerConfig::default().with_failure_threshold(1),
            ),
            retry_config: Some(crate::RetryConfig::default().with_max_retries(0)),
            ..Default::default()
        };
        let guards = Guards::new(&cfg);
        let _ = guards
            .run(&cfg, "test", || async {
                Err::<(), _>(WikidataError::Transport("refused".into()))
            })
            .await;
        assert_eq!(guards.circuit_state(), CircuitState::Open);

        let err = guards
            .run(&cfg, "test", || async { Ok::<_, WikidataError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, WikidataError::Unavailable(_)));
    }

    #[tokio::test]
    async fn timeouts_on_every_retry_escalate() {
        let fast = crate::RetryConfig::default()
            .with_base_delay(std::time::Duration::from_millis(1))
            .with_max_delay(std::time::Duration::from_millis(2))
            .with_jitter(false);
        let cfg = WikidataConfig {
            retry_config: Some(fast.with_max_retries(2)),
            ..Default::default()
        };
        let guards = Guards::new(&cfg);
        let err = guards
            .run(&cfg, "test", || async { Err::<(), _>(WikidataError::Timeout(10)) })
            .await
            .unwrap_err();
        assert!(matches!(err, WikidataError::Unavailable(_)), "got {err:?}");

        let single = WikidataConfig {
            retry_config: Some(fast.with_max_retries(0)),
            ..Default::default()
        };
        let guards = Guards::new(&single);
        let err = guards
            .run(&single, "test", || async { Err::<(), _>(WikidataError::Timeout(10)) })
            .await
            .unwrap_err();
        assert_eq!(err, WikidataError::Timeout(10));
    }

    #[tokio::test]
    async fn connect_timeout_bounds_unreachable_hosts() {
        let cfg = WikidataConfig {
            // Non-routable; connecting hangs until the connect timeout.
            sparql_url: "http://10.255.255.1/sparql".into(),
            timeout_secs: 60,
            connect_timeout_secs: 1,
            retry_config: Some(crate::RetryConfig::default().with_max_retries(0)),
            ..Default::default()
        };
        let endpoint = HttpEndpoint::new(cfg).unwrap();
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(15),
            endpoint.select("SELECT ?x WHERE {}"),
        )
        .await
        .expect("connect timeout should end the call well before the request timeout")
        .unwrap_err();
        assert!(err.is_outage(), "unexpected error: {err:?}");
    }
}
