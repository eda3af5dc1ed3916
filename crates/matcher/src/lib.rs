//! # LexSrt Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` turns a tagged token (surface text, part-of-speech tag,
//! language code) into the set of Wikidata lexeme forms it spells, or into a
//! structured record explaining why nothing matched.
//!
//! Taggers are wrong often enough that the tag alone is a poor guide, so
//! resolution walks a fixed list of [`MatchHypothesis`] readings:
//!
//! 0. as tagged
//! 1. proper noun read as a common noun
//! 2. proper noun read as an adjective
//! 3. forced noun
//! 4. forced verb
//! 5. forced adjective
//!
//! The first reading whose lookup returns forms wins. Readings that map to a
//! category already tried are skipped. Tags without a lexical category
//! (punctuation, symbols, `X`) are exhausted at once without any remote call.
//!
//! ## Core Types
//!
//! - [`Token`]: immutable tagged word.
//! - [`CategoryMapper`]: tag to lexical category item, with overrides.
//! - [`HypothesisMatcher`]: the resolution engine.
//! - [`MatchResult`] / [`Resolution`]: outcome of one token.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use matcher::{HypothesisMatcher, MatcherConfig, Token};
//! use tokio_util::sync::CancellationToken;
//! use wikidata::{HttpEndpoint, WikidataConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Arc::new(HttpEndpoint::new(WikidataConfig::default())?);
//! let matcher = HypothesisMatcher::new(endpoint, MatcherConfig::default())?;
//!
//! let token = Token::new("cat", "cat", "NOUN", "en");
//! let resolution = matcher.resolve(&token, &CancellationToken::new()).await?;
//! println!("{:?}", resolution.result);
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`ResolveMetrics`] implementation via [`set_resolve_metrics`]
//! to record per-token latency and outcome.

pub mod category;
pub mod engine;
pub mod hypothesis;
pub mod metrics;
pub mod types;

pub use crate::category::{CategoryMapper, ForcedCategory};
pub use crate::engine::HypothesisMatcher;
pub use crate::hypothesis::MatchHypothesis;
pub use crate::metrics::{set_resolve_metrics, ResolveMetrics};
pub use crate::types::{
    DedupKey, ExhaustReason, MatchError, MatchResult, MatcherConfig, Resolution, Token,
    DEFAULT_FOLLOWUP_BASE,
};
