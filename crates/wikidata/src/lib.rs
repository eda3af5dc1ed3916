//! Wikidata access for LexSrt.
//!
//! Everything that talks to the knowledge base lives here: SPARQL text
//! building, the [`SparqlEndpoint`] seam and its HTTP implementation,
//! memoized language and form lookups, and lexeme entity fetching.
//!
//! The HTTP implementations sit behind a circuit breaker, a token bucket and
//! a concurrency cap, and retry transient failures with exponential backoff.
//! The query service is a shared public resource and throttles clients that
//! ignore this.
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wikidata::{CategoryId, FormLookup, HttpEndpoint, LanguageResolver, NormalizedQueryKey, WikidataConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wikidata::WikidataError> {
//!     let endpoint = Arc::new(HttpEndpoint::new(WikidataConfig::default())?);
//!     let language = LanguageResolver::new(endpoint.clone()).resolve("en").await?;
//!
//!     let key = NormalizedQueryKey::new(language, CategoryId::new("Q1084"), "cat", "en");
//!     let forms = FormLookup::new(endpoint).lookup(&key).await?;
//!     println!("{forms:?}");
//!     Ok(())
//! }
//! ```
//!
//! Tests should use [`demo_utils::ScriptedEndpoint`] instead of the network.

pub mod cache;
pub mod config;
pub mod error;
pub mod resilience;
pub mod sparql;
pub mod types;

mod endpoint;
mod entity;
mod forms;
mod language;
mod serde_millis;

#[doc(hidden)]
pub mod demo_utils;

pub use cache::{BoundedCache, ResultCache, RunCache};
pub use config::WikidataConfig;
pub use endpoint::{parse_bindings, HttpEndpoint, SparqlEndpoint};
pub use entity::{parse_entity, EntityFetcher, HttpEntityFetcher, LexemeEntity, Sense, LEXEME_PAGE_BASE};
pub use error::WikidataError;
pub use forms::{FormLookup, FormSet};
pub use language::LanguageResolver;
pub use resilience::{CircuitBreakerConfig, CircuitState, RateLimitConfig, RetryConfig};
pub use types::{Binding, CategoryId, FormId, LanguageId, LexemeId, NormalizedQueryKey};
