//! Per-token, per-sentence and per-document results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use matcher::{MatchResult, Resolution, Token};
use wikidata::FormId;

use crate::report::LexemeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Matched,
    /// Every hypothesis was tried without a result.
    Unmatched,
    /// Never looked up: too short, or a tag without a lexical category.
    Skipped,
    /// The run stopped before this token was resolved.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub text: String,
    pub pos_tag: String,
    pub matched_ids: BTreeSet<FormId>,
    /// Index of the winning hypothesis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<u8>,
    pub status: TokenStatus,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_url: Option<String>,
}

impl TokenResult {
    pub(crate) fn skipped(token: &Token) -> Self {
        Self::bare(token, TokenStatus::Skipped)
    }

    pub(crate) fn unresolved(token: &Token) -> Self {
        Self::bare(token, TokenStatus::Unresolved)
    }

    pub(crate) fn from_resolution(token: &Token, resolution: &Resolution) -> Self {
        let mut result = match &resolution.result {
            MatchResult::Matched { ids, hypothesis } => Self {
                matched_ids: ids.clone(),
                hypothesis: Some(hypothesis.index()),
                ..Self::bare(token, TokenStatus::Matched)
            },
            MatchResult::Exhausted {
                followup_url: None, ..
            } => Self::bare(token, TokenStatus::Skipped),
            MatchResult::Exhausted { followup_url, .. } => Self {
                followup_url: followup_url.clone(),
                ..Self::bare(token, TokenStatus::Unmatched)
            },
        };
        result.timed_out = resolution.timed_out;
        result
    }

    fn bare(token: &Token, status: TokenStatus) -> Self {
        Self {
            text: token.text().to_string(),
            pos_tag: token.pos_tag().to_string(),
            matched_ids: BTreeSet::new(),
            hypothesis: None,
            status,
            timed_out: false,
            followup_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceResult {
    /// The sentence as given, before cleanup.
    pub text: String,
    pub tokens: Vec<TokenResult>,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub skipped_count: usize,
}

impl SentenceResult {
    pub(crate) fn new(text: impl Into<String>, tokens: Vec<TokenResult>) -> Self {
        let count = |status: TokenStatus| tokens.iter().filter(|t| t.status == status).count();
        Self {
            text: text.into(),
            matched_count: count(TokenStatus::Matched),
            unmatched_count: count(TokenStatus::Unmatched),
            skipped_count: count(TokenStatus::Skipped),
            tokens,
        }
    }
}

/// A distinct (text, tag) pair nobody could match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedToken {
    pub text: String,
    pub pos_tag: String,
    pub followup_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub total_tokens: usize,
    /// Tokens at or above the minimum length.
    pub eligible_tokens: usize,
    /// Eligible tokens after deduplication.
    pub unique_tokens: usize,
    pub matched_tokens: usize,
    pub unmatched_tokens: usize,
    pub skipped_tokens: usize,
    pub timed_out_tokens: usize,
    pub unique_matched_ids: usize,
    pub unique_lexemes: usize,
    /// Matched lexemes without any gloss; only known when a report was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexemes_lacking_gloss: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub sentences: Vec<SentenceResult>,
    pub unique_matched_ids: BTreeSet<FormId>,
    /// In order of first occurrence.
    pub unmatched_tokens: Vec<UnmatchedToken>,
    pub summary: DocumentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LexemeReport>,
}

impl DocumentResult {
    /// Aggregate sentence results. `eligible` and `unique` come from the
    /// resolver, which is the only one that saw the token stream.
    pub(crate) fn assemble(sentences: Vec<SentenceResult>, eligible: usize, unique: usize) -> Self {
        let mut unique_matched_ids = BTreeSet::new();
        let mut unmatched_tokens: Vec<UnmatchedToken> = Vec::new();
        let mut summary = DocumentSummary {
            eligible_tokens: eligible,
            unique_tokens: unique,
            ..Default::default()
        };

        for token in sentences.iter().flat_map(|s| s.tokens.iter()) {
            summary.total_tokens += 1;
            if token.timed_out {
                summary.timed_out_tokens += 1;
            }
            match token.status {
                TokenStatus::Matched => {
                    summary.matched_tokens += 1;
                    unique_matched_ids.extend(token.matched_ids.iter().cloned());
                }
                TokenStatus::Unmatched => {
                    summary.unmatched_tokens += 1;
                    let known = unmatched_tokens
                        .iter()
                        .any(|u| u.text == token.text && u.pos_tag == token.pos_tag);
                    if !known {
                        unmatched_tokens.push(UnmatchedToken {
                            text: token.text.clone(),
                            pos_tag: token.pos_tag.clone(),
                            followup_url: token.followup_url.clone().unwrap_or_default(),
                        });
                    }
                }
                TokenStatus::Skipped => summary.skipped_tokens += 1,
                TokenStatus::Unresolved => {}
            }
        }

        summary.unique_matched_ids = unique_matched_ids.len();
        summary.unique_lexemes = unique_matched_ids
            .iter()
            .map(FormId::lexeme_id)
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            sentences,
            unique_matched_ids,
            unmatched_tokens,
            summary,
            report: None,
        }
    }

    pub(crate) fn attach_report(&mut self, report: LexemeReport) {
        self.summary.lexemes_lacking_gloss = Some(report.lacking_gloss_count());
        self.report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcher::{ExhaustReason, MatchHypothesis};

    fn matched(text: &str, ids: &[&str], hypothesis: MatchHypothesis) -> TokenResult {
        let token = Token::new(text, "", "NOUN", "en");
        TokenResult::from_resolution(
            &token,
            &Resolution {
                result: MatchResult::Matched {
                    ids: ids.iter().map(|id| FormId::new(*id)).collect(),
                    hypothesis,
                },
                timed_out: false,
            },
        )
    }

    fn unmatched(text: &str) -> TokenResult {
        let token = Token::new(text, "", "NOUN", "en");
        TokenResult::from_resolution(
            &token,
            &Resolution {
                result: MatchResult::Exhausted {
                    reason: ExhaustReason::NoResults,
                    tried: vec![MatchHypothesis::AsTagged],
                    followup_url: Some(format!("https://ordia.toolforge.org/search?q={text}")),
                },
                timed_out: true,
            },
        )
    }

    #[test]
    fn token_result_reflects_resolution() {
        let hit = matched("cat", &["L1234-F1"], MatchHypothesis::ForcedNoun);
        assert_eq!(hit.status, TokenStatus::Matched);
        assert_eq!(hit.hypothesis, Some(3));

        let miss = unmatched("zzz");
        assert_eq!(miss.status, TokenStatus::Unmatched);
        assert!(miss.timed_out);
        assert!(miss.followup_url.unwrap().ends_with("zzz"));

        let punct = TokenResult::from_resolution(
            &Token::new(".", "", "PUNCT", "en"),
            &Resolution {
                result: MatchResult::Exhausted {
                    reason: ExhaustReason::UnsupportedCategory,
                    tried: vec![],
                    followup_url: None,
                },
                timed_out: false,
            },
        );
        assert_eq!(punct.status, TokenStatus::Skipped);
    }

    #[test]
    fn sentence_counts_by_status() {
        let short = TokenResult::skipped(&Token::new("a", "", "DET", "en"));
        let sentence = SentenceResult::new(
            "a cat zzz",
            vec![short, matched("cat", &["L1-F1"], MatchHypothesis::AsTagged), unmatched("zzz")],
        );
        assert_eq!(sentence.matched_count, 1);
        assert_eq!(sentence.unmatched_count, 1);
        assert_eq!(sentence.skipped_count, 1);
    }

    #[test]
    fn document_summary_collapses_ids_and_unmatched() {
        let first = SentenceResult::new(
            "cats zzz",
            vec![
                matched("cats", &["L1-F2", "L1-F1"], MatchHypothesis::AsTagged),
                unmatched("zzz"),
            ],
        );
        let second = SentenceResult::new(
            "cat zzz",
            vec![matched("cat", &["L1-F1"], MatchHypothesis::AsTagged), unmatched("zzz")],
        );
        let doc = DocumentResult::assemble(vec![first, second], 4, 3);

        assert_eq!(doc.summary.total_tokens, 4);
        assert_eq!(doc.summary.matched_tokens, 2);
        assert_eq!(doc.summary.unmatched_tokens, 2);
        assert_eq!(doc.summary.timed_out_tokens, 2);
        assert_eq!(doc.summary.unique_matched_ids, 2);
        assert_eq!(doc.summary.unique_lexemes, 1);
        assert_eq!(doc.unmatched_tokens.len(), 1);
        assert_eq!(doc.summary.lexemes_lacking_gloss, None);
    }
}
