use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wikidata::sparql::clean_representation;
use wikidata::{
    CategoryId, FormLookup, FormSet, LanguageResolver, NormalizedQueryKey, SparqlEndpoint,
    WikidataError,
};

use crate::category::CategoryMapper;
use crate::hypothesis::MatchHypothesis;
use crate::metrics::metrics_recorder;
use crate::types::{ExhaustReason, MatchError, MatchResult, MatcherConfig, Resolution, Token};


/// Resolves tokens to lexeme forms by trying category hypotheses in order.
#[derive(Debug, Clone)]
pub struct HypothesisMatcher {
    languages: LanguageResolver,
    forms: FormLookup,
    categories: CategoryMapper,
    config: MatcherConfig,
}

impl HypothesisMatcher {
    /// Matcher over `endpoint` with run-scoped caches.
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, config: MatcherConfig) -> Result<Self, MatchError> {
        Self::with_parts(
            LanguageResolver::new(endpoint.clone()),
            FormLookup::new(endpoint),
            config,
        )
    }

    /// Matcher over explicitly built lookups, e.g. ones sharing long-lived
    /// caches.
    pub fn with_parts(
        languages: LanguageResolver,
        forms: FormLookup,
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            languages,
            forms,
            categories: CategoryMapper::with_overrides(&config.category_overrides),
            config,
        })
    }

    pub fn languages(&self) -> &LanguageResolver {
        &self.languages
    }

    pub fn categories(&self) -> &CategoryMapper {
        &self.categories
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Search link recorded for a token nobody could match.
    pub fn followup_url(&self, token: &Token) -> String {
        format!(
            "{}{}",
            self.config.followup_base,
            clean_representation(token.normalized()).to_lowercase()
        )
    }

    /// Run a single hypothesis for `token`.
    ///
    /// Returns `Ok(None)` when the hypothesis gives the tag no category or
    /// the lookup comes back empty. The token is never modified.
    pub async fn try_hypothesis(
        &self,
        token: &Token,
        hypothesis: MatchHypothesis,
    ) -> Result<Option<FormSet>, MatchError> {
        let Some(category) = self
            .categories
            .category_id(token.pos_tag(), hypothesis.forced())
        else {
            return Ok(None);
        };
        let forms = self.lookup(token, category).await?;
        Ok(if forms.is_empty() { None } else { Some(forms) })
    }

    async fn lookup(&self, token: &Token, category: CategoryId) -> Result<FormSet, MatchError> {
        let language = self.languages.resolve(token.language_code()).await?;
        let key = NormalizedQueryKey::new(
            language,
            category,
            token.normalized(),
            token.language_code(),
        );
        Ok(self.forms.lookup(&key).await?)
    }

    /// Resolve `token`, trying each hypothesis until one matches.
    ///
    /// Lookups that time out once or return an unreadable answer count as a
    /// non-match for that hypothesis. Outage-class failures, including a
    /// timeout that outlasted its retries, abort with
    /// [`MatchError::RemoteServiceUnavailable`]. `cancel` is checked before
    /// every hypothesis, never while a lookup is in flight.
    pub async fn resolve(
        &self,
        token: &Token,
        cancel: &CancellationToken,
    ) -> Result<Resolution, MatchError> {
        let start = Instant::now();

        if !self.categories.is_supported(token.pos_tag()) {
            debug!(token = token.text(), pos = token.pos_tag(), "unsupported tag, skipping lookup");
            let resolution = Resolution {
                result: MatchResult::Exhausted {
                    reason: ExhaustReason::UnsupportedCategory,
                    tried: Vec::new(),
                    followup_url: None,
                },
                timed_out: false,
            };
            self.record(token, &resolution, 0, start);
            return Ok(resolution);
        }

        let mut seen: Vec<CategoryId> = Vec::with_capacity(MatchHypothesis::ALL.len());
        let mut tried = Vec::with_capacity(MatchHypothesis::ALL.len());
        let mut timed_out = false;

        for hypothesis in MatchHypothesis::ALL {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
            let Some(category) = self
                .categories
                .category_id(token.pos_tag(), hypothesis.forced())
            else {
                continue;
            };
            // Same category means same query key, so the answer is already known.
            if seen.contains(&category) {
                continue;
            }
            seen.push(category.clone());
            tried.push(hypothesis);

            match self.lookup(token, category).await {
                Ok(forms) if !forms.is_empty() => {
                    debug!(
                        token = token.text(),
                        hypothesis = hypothesis.index(),
                        forms = forms.len(),
                        "matched"
                    );
                    let resolution = Resolution {
                        result: MatchResult::Matched {
                            ids: forms,
                            hypothesis,
                        },
                        timed_out,
                    };
                    self.record(token, &resolution, tried.len(), start);
                    return Ok(resolution);
                }
                Ok(_) => {}
                Err(MatchError::Query(err)) if !err.is_outage() => {
                    if matches!(err, WikidataError::Timeout(_)) {
                        timed_out = true;
                    }
                    warn!(
                        error = %err,
                        token = token.text(),
                        hypothesis = hypothesis.index(),
                        "lookup failed, treating hypothesis as no match"
                    );
                }
                Err(MatchError::Query(err)) => {
                    return Err(MatchError::RemoteServiceUnavailable(err.to_string()));
                }
                Err(other) => return Err(other),
            }
        }

        let lookups = tried.len();
        let followup = self.followup_url(token);
        warn!(
            token = token.text(),
            pos = token.pos_tag(),
            followup = %followup,
            "no lexeme match; needs manual followup"
        );
        let resolution = Resolution {
            result: MatchResult::Exhausted {
                reason: ExhaustReason::NoResults,
                tried,
                followup_url: Some(followup),
            },
            timed_out,
        };
        self.record(token, &resolution, lookups, start);
        Ok(resolution)
    }

    fn record(&self, token: &Token, resolution: &Resolution, lookups: usize, start: Instant) {
        if let Some(recorder) = metrics_recorder() {
            recorder.record_resolution(
                token.pos_tag(),
                resolution.result.hypothesis(),
                lookups,
                start.elapsed(),
            );
        }
    }
}
