use matcher::MatchError;
use thiserror::Error;
use wikidata::WikidataError;

use crate::config::ConfigLoadError;
use crate::document::DocumentResult;
use crate::tokenizer::TokenizeError;

/// Errors that end a document run.
///
/// Failures that still leave useful output behind carry the partial
/// [`DocumentResult`]; tokens that were never resolved are marked
/// [`crate::TokenStatus::Unresolved`] there.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Checked before anything is tokenized.
    #[error("invalid language code '{0}': expected 2 or 3 characters")]
    InvalidLanguageCode(String),

    #[error("remote service unavailable: {message}")]
    RemoteServiceUnavailable {
        message: String,
        partial: Box<DocumentResult>,
    },

    #[error("document resolution cancelled")]
    Cancelled { partial: Box<DocumentResult> },

    #[error("tokenization failed: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Results gathered before the run stopped, if any.
    pub fn partial(&self) -> Option<&DocumentResult> {
        match self {
            PipelineError::RemoteServiceUnavailable { partial, .. }
            | PipelineError::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(err: ConfigLoadError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<WikidataError> for PipelineError {
    fn from(err: WikidataError) -> Self {
        match err {
            WikidataError::InvalidLanguageCode(code) => PipelineError::InvalidLanguageCode(code),
            other => PipelineError::Config(other.to_string()),
        }
    }
}

/// Maps matcher errors that are not tied to a run in progress. Errors that
/// need partial results are built by the resolver itself.
impl From<MatchError> for PipelineError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::InvalidLanguageCode(code) => PipelineError::InvalidLanguageCode(code),
            MatchError::InvalidConfig(msg) => PipelineError::Config(msg),
            other => PipelineError::Config(other.to_string()),
        }
    }
}
