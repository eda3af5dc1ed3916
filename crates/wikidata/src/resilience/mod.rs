//! Resilience around the remote endpoints: retry with backoff, rate limiting
//! and a circuit breaker.
//!
//! The query service throttles aggressive clients, so every HTTP call made by
//! this crate goes through all three.

mod circuit_breaker;
mod rate_limit;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limit::{RateLimitConfig, RateLimitStats, TokenBucket};
pub use retry::{execute_with_retry_async, RetryConfig, RetryResult};
