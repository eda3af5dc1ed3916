//! Tokenizer seam.
//!
//! Tagging is done outside this crate. [`PretaggedTokenizer`] replays tagger
//! output loaded from JSON, so any NLP model can drive the resolver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use matcher::Token;

use crate::prefilter::TokenFilter;

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("no tagged tokens for sentence '{0}'")]
    UnknownSentence(String),

    #[error("failed to read tagged input: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse tagged input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tagger failure: {0}")]
    Tagger(String),
}

/// Splits a sentence into tagged tokens.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Tokens of `text` as tagged by `model_id`. Every token carries
    /// `language_code` as its declared language. Unknown tags are passed
    /// through unchanged; the matcher treats them as unsupported.
    async fn tokenize(
        &self,
        text: &str,
        language_code: &str,
        model_id: &str,
    ) -> Result<Vec<Token>, TokenizeError>;
}

/// One token as emitted by an external tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedWord {
    pub text: String,
    /// Normalized form; the surface text is used when absent.
    #[serde(default)]
    pub norm: Option<String>,
    pub pos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<TaggedWord>,
}

/// Tagger output for a whole document.
///
/// ```json
/// {"model": "en_core_web_sm",
///  "sentences": [{"text": "The cat sat.",
///                 "tokens": [{"text": "The", "pos": "DET"},
///                            {"text": "cat", "pos": "NOUN"}]}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedDocument {
    #[serde(default)]
    pub model: String,
    pub sentences: Vec<TaggedSentence>,
}

impl TaggedDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TokenizeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, TokenizeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Raw sentence texts, in order.
    pub fn sentence_texts(&self) -> Vec<String> {
        self.sentences.iter().map(|s| s.text.clone()).collect()
    }
}

/// [`Tokenizer`] answering from pre-tagged sentences.
///
/// Sentences are keyed by their cleaned text (see
/// [`TokenFilter::clean_sentence`]), which is what the resolver hands to the
/// tokenizer.
#[derive(Debug, Clone, Default)]
pub struct PretaggedTokenizer {
    model: String,
    sentences: HashMap<String, Vec<TaggedWord>>,
}

impl PretaggedTokenizer {
    pub fn new(document: &TaggedDocument) -> Self {
        let mut sentences = HashMap::with_capacity(document.sentences.len());
        for sentence in &document.sentences {
            sentences
                .entry(TokenFilter::clean_sentence(&sentence.text))
                .or_insert_with(|| sentence.tokens.clone());
        }
        Self {
            model: document.model.clone(),
            sentences,
        }
    }

    /// Model recorded in the tagged input.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Tokenizer for PretaggedTokenizer {
    async fn tokenize(
        &self,
        text: &str,
        language_code: &str,
        model_id: &str,
    ) -> Result<Vec<Token>, TokenizeError> {
        if !model_id.is_empty() && !self.model.is_empty() && model_id != self.model {
            debug!(requested = model_id, tagged = %self.model, "model mismatch, using tagged input");
        }
        let words = self
            .sentences
            .get(text)
            .ok_or_else(|| TokenizeError::UnknownSentence(text.to_string()))?;
        Ok(words
            .iter()
            .map(|w| {
                Token::new(
                    w.text.as_str(),
                    w.norm.clone().unwrap_or_default(),
                    w.pos.as_str(),
                    language_code,
                )
            })
            .collect())
    }
}
