//! Workspace umbrella crate for LexSrt.
//!
//! LexSrt turns subtitle text into confirmed Wikidata lexeme forms. This
//! crate stitches the pieces into a single document-level API:
//!
//! 1. pre-filters drop trailing credits, strip markup and email addresses;
//! 2. a [`Tokenizer`] splits and tags each sentence;
//! 3. tokens shorter than the minimum length are skipped, the rest are
//!    deduplicated by (text, tag);
//! 4. [`matcher::HypothesisMatcher`] resolves each distinct token, several at
//!    a time;
//! 5. results are copied back to every occurrence and summarized, with an
//!    optional [`LexemeReport`] of lemmas and glosses.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lexsrt::{DocumentResolver, LexSrtConfig, PretaggedTokenizer, TaggedDocument};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let tagged = TaggedDocument::from_file("tagged.json")?;
//! let tokenizer = Arc::new(PretaggedTokenizer::new(&tagged));
//! let resolver = DocumentResolver::from_config(&LexSrtConfig::default(), tokenizer)?;
//!
//! let result = resolver
//!     .resolve_document(&tagged.sentence_texts(), "en", &tagged.model)
//!     .await?;
//! println!("{} distinct forms", result.unique_matched_ids.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod prefilter;
pub mod report;
pub mod tokenizer;

mod pipeline;

pub use crate::config::{ConfigLoadError, DocumentConfig, LexSrtConfig, PrefilterConfig};
pub use crate::dedup::dedupe;
pub use crate::document::{
    DocumentResult, DocumentSummary, SentenceResult, TokenResult, TokenStatus, UnmatchedToken,
};
pub use crate::error::PipelineError;
pub use crate::pipeline::DocumentResolver;
pub use crate::prefilter::{CreditsFilter, TokenFilter};
pub use crate::report::{
    build_report, LexemeFetchFailure, LexemeReport, LexemeReportEntry, NO_SENSES,
};
pub use crate::tokenizer::{
    PretaggedTokenizer, TaggedDocument, TaggedSentence, TaggedWord, TokenizeError, Tokenizer,
};

pub use matcher::{HypothesisMatcher, MatchHypothesis, MatcherConfig, Token};
pub use wikidata::WikidataConfig;
