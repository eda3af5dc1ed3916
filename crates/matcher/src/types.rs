use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use wikidata::{FormId, WikidataError};

use crate::hypothesis::MatchHypothesis;

/// A tagged word as produced by the tokenizer.
///
/// Tokens are values: the matcher never rewrites a token's tag, it threads
/// category overrides through each attempt instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    text: String,
    #[serde(default)]
    normalized: String,
    pos_tag: String,
    language_code: String,
}

impl Token {
    /// Build a token. An empty `normalized` falls back to `text`.
    pub fn new(
        text: impl Into<String>,
        normalized: impl Into<String>,
        pos_tag: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let mut normalized = normalized.into();
        if normalized.is_empty() {
            normalized = text.clone();
        }
        Self {
            text,
            normalized,
            pos_tag: pos_tag.into(),
            language_code: language_code.into(),
        }
    }

    /// Surface text exactly as it appeared in the sentence.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Representation used for lookups.
    pub fn normalized(&self) -> &str {
        if self.normalized.is_empty() {
            &self.text
        } else {
            &self.normalized
        }
    }

    /// Coarse part-of-speech tag (`NOUN`, `PROPN`, `PUNCT`, ...).
    pub fn pos_tag(&self) -> &str {
        &self.pos_tag
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            text: self.text.clone(),
            pos_tag: self.pos_tag.clone(),
        }
    }
}

/// Identity of a token for deduplication: surface text plus tag.
///
/// `run`/NOUN and `run`/VERB are different keys and resolve separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub text: String,
    pub pos_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// The tag has no lexical category (punctuation, symbols, unknown tags).
    UnsupportedCategory,
    /// Every applicable hypothesis came back empty.
    NoResults,
}

/// Final outcome of resolving one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        ids: BTreeSet<FormId>,
        hypothesis: MatchHypothesis,
    },
    Exhausted {
        reason: ExhaustReason,
        /// Hypotheses that issued a lookup, in order.
        tried: Vec<MatchHypothesis>,
        /// Search link for a human to follow up on, when lookups were made.
        #[serde(skip_serializing_if = "Option::is_none")]
        followup_url: Option<String>,
    },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    /// Matched ids, empty when exhausted.
    pub fn ids(&self) -> BTreeSet<FormId> {
        match self {
            MatchResult::Matched { ids, .. } => ids.clone(),
            MatchResult::Exhausted { .. } => BTreeSet::new(),
        }
    }

    pub fn hypothesis(&self) -> Option<MatchHypothesis> {
        match self {
            MatchResult::Matched { hypothesis, .. } => Some(*hypothesis),
            MatchResult::Exhausted { .. } => None,
        }
    }
}

/// A [`MatchResult`] plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub result: MatchResult,
    /// At least one hypothesis counted as a non-match because its lookup
    /// timed out after retries.
    pub timed_out: bool,
}

pub const DEFAULT_FOLLOWUP_BASE: &str = "https://ordia.toolforge.org/search?q=";

/// Matcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Prefix of the followup link recorded for unmatched tokens; the
    /// lowercased cleaned representation is appended.
    pub followup_base: String,
    /// Extra or replacement tag -> category item mappings, e.g.
    /// `{"PROPN": "Q1084"}`.
    pub category_overrides: BTreeMap<String, String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            followup_base: DEFAULT_FOLLOWUP_BASE.into(),
            category_overrides: BTreeMap::new(),
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.followup_base.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "followup_base must not be empty".into(),
            ));
        }
        for (tag, item) in &self.category_overrides {
            if tag.trim().is_empty() {
                return Err(MatchError::InvalidConfig(
                    "category_overrides contains an empty tag".into(),
                ));
            }
            let well_formed = item.len() > 1
                && item.starts_with('Q')
                && item[1..].chars().all(|c| c.is_ascii_digit());
            if !well_formed {
                return Err(MatchError::InvalidConfig(format!(
                    "category override for '{tag}' is not an item id: '{item}'"
                )));
            }
        }
        Ok(())
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
    /// The token's language code is not 2 or 3 characters long.
    #[error("invalid language code '{0}'")]
    InvalidLanguageCode(String),
    /// A single lookup failed. [`crate::HypothesisMatcher::resolve`] turns
    /// these into non-matches or [`MatchError::RemoteServiceUnavailable`].
    #[error("remote query failed: {0}")]
    Query(#[source] WikidataError),
    /// The knowledge base cannot be reached; continuing would report an
    /// outage as "no match".
    #[error("remote service unavailable: {0}")]
    RemoteServiceUnavailable(String),
    #[error("resolution cancelled")]
    Cancelled,
}

impl From<WikidataError> for MatchError {
    fn from(err: WikidataError) -> Self {
        match err {
            WikidataError::InvalidLanguageCode(code) => MatchError::InvalidLanguageCode(code),
            other => MatchError::Query(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_accessors_and_fallback() {
        let token = Token::new("Cats", "", "NOUN", "en");
        assert_eq!(token.text(), "Cats");
        assert_eq!(token.normalized(), "Cats");
        assert_eq!(token.pos_tag(), "NOUN");
        assert_eq!(token.language_code(), "en");
    }

    #[test]
    fn dedup_key_separates_tags() {
        let noun = Token::new("run", "run", "NOUN", "en");
        let verb = Token::new("run", "run", "VERB", "en");
        assert_ne!(noun.dedup_key(), verb.dedup_key());
        assert_eq!(noun.dedup_key(), Token::new("run", "RUN", "NOUN", "en").dedup_key());
    }

    #[test]
    fn token_deserializes_without_normalized() {
        let token: Token =
            serde_json::from_str(r#"{"text":"hej","pos_tag":"INTJ","language_code":"da"}"#)
                .unwrap();
        assert_eq!(token.normalized(), "hej");
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = MatcherConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.followup_base, "https://ordia.toolforge.org/search?q=");
    }

    #[test]
    fn bad_override_rejected() {
        let cfg = MatcherConfig {
            category_overrides: BTreeMap::from([("PROPN".to_string(), "noun".to_string())]),
            ..Default::default()
        };
        match cfg.validate().expect_err("config should be invalid") {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("PROPN")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn match_result_serializes_with_status_tag() {
        let exhausted = MatchResult::Exhausted {
            reason: ExhaustReason::UnsupportedCategory,
            tried: vec![],
            followup_url: None,
        };
        let json = serde_json::to_value(&exhausted).unwrap();
        assert_eq!(json["status"], "exhausted");
        assert_eq!(json["reason"], "unsupported_category");
        assert!(json.get("followup_url").is_none());
    }

    #[test]
    fn invalid_language_code_maps_through() {
        let err: MatchError = WikidataError::InvalidLanguageCode("eng1".into()).into();
        assert!(matches!(err, MatchError::InvalidLanguageCode(code) if code == "eng1"));
    }
}
