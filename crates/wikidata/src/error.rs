use thiserror::Error;

/// Errors surfaced by the Wikidata access layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WikidataError {
    /// Language codes must be ISO 639-1 (2 chars) or ISO 639-2 (3 chars).
    #[error("invalid language code '{0}': expected 2 or 3 characters")]
    InvalidLanguageCode(String),
    /// Configuration is inconsistent (e.g. empty endpoint URL).
    #[error("invalid wikidata config: {0}")]
    InvalidConfig(String),
    /// A single remote call exceeded its timeout.
    #[error("remote query timed out after {0}ms")]
    Timeout(u64),
    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status code.
    #[error("endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The payload could not be decoded into bindings or an entity.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The circuit breaker is open or the rate limiter gave up waiting.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),
}

impl WikidataError {
    /// Whether another attempt of the same call might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WikidataError::Timeout(_) | WikidataError::Transport(_) => true,
            WikidataError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure indicates the endpoint itself is down, as opposed
    /// to one query being slow or rejected.
    pub fn is_outage(&self) -> bool {
        match self {
            WikidataError::Transport(_) | WikidataError::Unavailable(_) => true,
            WikidataError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Final error of a call that made `attempts` tries. A timeout on every
    /// one of several tries is an outage, not a slow query.
    pub fn after_attempts(self, attempts: u32) -> Self {
        match self {
            WikidataError::Timeout(ms) if attempts > 1 => WikidataError::Unavailable(format!(
                "query timed out on all {attempts} attempts ({ms}ms each)"
            )),
            other => other,
        }
    }
}

impl From<reqwest::Error> for WikidataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return WikidataError::Timeout(0);
        }
        if err.is_decode() {
            return WikidataError::MalformedResponse(err.to_string());
        }
        if let Some(status) = err.status() {
            return WikidataError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        WikidataError::Transport(err.to_string())
    }
}
