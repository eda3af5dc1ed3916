//! Lexeme report for matched forms: lemma, glosses and link per lexeme.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use wikidata::{EntityFetcher, FormId, LexemeEntity, LexemeId};

pub const NO_SENSES: &str = "No senses (help wanted)";
pub const GLOSS_SEPARATOR: &str = " | ";

/// Placeholder shown for a sense without a gloss in `language`.
pub fn missing_gloss(language: &str) -> String {
    format!("No gloss for '{language}' language for this sense, please add one")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexemeReportEntry {
    pub lexeme_id: LexemeId,
    /// Lemma in the document language with hyphens removed.
    pub lemma: String,
    pub glosses: String,
    pub has_sense: bool,
    /// At least one sense is glossed in the document language.
    pub has_gloss: bool,
    pub url: String,
}

impl LexemeReportEntry {
    pub fn from_entity(entity: &LexemeEntity, language: &str) -> Self {
        let lemma = entity.lemma(language).unwrap_or_default().replace('-', "");
        let glossed = entity
            .senses
            .iter()
            .filter(|s| s.glosses.contains_key(language))
            .count();

        let glosses = if entity.has_senses() {
            entity
                .senses
                .iter()
                .map(|sense| {
                    sense
                        .glosses
                        .get(language)
                        .cloned()
                        .unwrap_or_else(|| missing_gloss(language))
                })
                .collect::<Vec<_>>()
                .join(GLOSS_SEPARATOR)
        } else {
            NO_SENSES.to_string()
        };

        Self {
            lexeme_id: entity.id.clone(),
            lemma,
            glosses,
            has_sense: entity.has_senses(),
            has_gloss: glossed > 0,
            url: entity.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexemeFetchFailure {
    pub lexeme_id: LexemeId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexemeReport {
    /// Sorted by lemma, then id.
    pub entries: Vec<LexemeReportEntry>,
    pub failures: Vec<LexemeFetchFailure>,
}

impl LexemeReport {
    pub fn lacking_gloss_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.has_gloss).count()
    }
}

/// Fetch the lexemes behind `forms` and build the report.
///
/// Fetch failures are recorded per lexeme and never fail the report.
pub async fn build_report(
    fetcher: &dyn EntityFetcher,
    forms: &BTreeSet<FormId>,
    language: &str,
    max_concurrency: usize,
) -> LexemeReport {
    let lexemes: BTreeSet<LexemeId> = forms.iter().map(FormId::lexeme_id).collect();
    debug!(lexemes = lexemes.len(), "fetching lexemes for report");

    let pending: Vec<_> = lexemes
        .into_iter()
        .map(|id| async move {
            let result = fetcher.fetch(&id).await;
            (id, result)
        })
        .collect();
    let fetched: Vec<(LexemeId, Result<LexemeEntity, _>)> = stream::iter(pending)
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let mut report = LexemeReport::default();
    for (id, result) in fetched {
        match result {
            Ok(entity) => report
                .entries
                .push(LexemeReportEntry::from_entity(&entity, language)),
            Err(err) => {
                warn!(lexeme = %id, error = %err, "lexeme fetch failed");
                report.failures.push(LexemeFetchFailure {
                    lexeme_id: id,
                    error: err.to_string(),
                });
            }
        }
    }
    report
        .entries
        .sort_by(|a, b| a.lemma.cmp(&b.lemma).then_with(|| a.lexeme_id.cmp(&b.lexeme_id)));
    report.failures.sort_by(|a, b| a.lexeme_id.cmp(&b.lexeme_id));
    report
}
