use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use matcher::{DedupKey, HypothesisMatcher, MatchError, Resolution, Token};
use wikidata::{EntityFetcher, HttpEndpoint, WikidataError};

use crate::config::{DocumentConfig, LexSrtConfig, PrefilterConfig};
use crate::dedup::dedupe;
use crate::document::{DocumentResult, SentenceResult, TokenResult};
use crate::error::PipelineError;
use crate::prefilter::TokenFilter;
use crate::report::build_report;
use crate::tokenizer::Tokenizer;

/// Resolves whole documents: tokenize, filter, dedupe, match, stitch.
///
/// Each distinct (text, tag) pair is resolved once per run, with up to
/// `max_concurrency` resolutions in flight. Results are copied back to every
/// occurrence.
#[derive(Clone)]
pub struct DocumentResolver {
    matcher: HypothesisMatcher,
    tokenizer: Arc<dyn Tokenizer>,
    fetcher: Option<Arc<dyn EntityFetcher>>,
    document: DocumentConfig,
    prefilter: PrefilterConfig,
}

impl fmt::Debug for DocumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentResolver")
            .field("matcher", &self.matcher)
            .field("has_fetcher", &self.fetcher.is_some())
            .field("document", &self.document)
            .field("prefilter", &self.prefilter)
            .finish()
    }
}

/// A sentence after cleanup, tokenization and token filtering.
struct PreparedSentence {
    text: String,
    tokens: Vec<Token>,
}

impl DocumentResolver {
    pub fn new(matcher: HypothesisMatcher, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            matcher,
            tokenizer,
            fetcher: None,
            document: DocumentConfig::default(),
            prefilter: PrefilterConfig::default(),
        }
    }

    /// Resolver talking to the configured Wikidata endpoint, without a
    /// lexeme report.
    pub fn from_config(
        config: &LexSrtConfig,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let endpoint = Arc::new(HttpEndpoint::new(config.wikidata.clone())?);
        let matcher = HypothesisMatcher::new(endpoint, config.matcher.clone())?;
        Ok(Self::new(matcher, tokenizer)
            .with_document_config(config.document.clone())
            .with_prefilter(config.prefilter.clone()))
    }

    /// Build a [`crate::LexemeReport`] for every successful run.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn EntityFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_document_config(mut self, document: DocumentConfig) -> Self {
        self.document = document;
        self
    }

    pub fn with_prefilter(mut self, prefilter: PrefilterConfig) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn matcher(&self) -> &HypothesisMatcher {
        &self.matcher
    }

    pub async fn resolve_document(
        &self,
        sentences: &[String],
        language_code: &str,
        model_id: &str,
    ) -> Result<DocumentResult, PipelineError> {
        self.resolve_document_with_cancel(sentences, language_code, model_id, &CancellationToken::new())
            .await
    }

    /// Like [`Self::resolve_document`], stopping early once `cancel` fires.
    ///
    /// Cancellation is observed between sentences during tokenization and
    /// between hypotheses during matching; lookups already in flight finish.
    pub async fn resolve_document_with_cancel(
        &self,
        sentences: &[String],
        language_code: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DocumentResult, PipelineError> {
        let kept = self.prefilter.credits.apply(sentences);
        if kept.len() < sentences.len() {
            debug!(dropped = sentences.len() - kept.len(), "credits filter dropped entries");
        }
        let span = info_span!("resolve_document", language = language_code, model = model_id);
        self.run(kept, language_code, model_id, cancel)
            .instrument(span)
            .await
    }

    /// Resolve a single sentence. The credits filter does not apply.
    pub async fn process_sentence(
        &self,
        sentence: &str,
        language_code: &str,
        model_id: &str,
    ) -> Result<SentenceResult, PipelineError> {
        let sentences = [sentence.to_string()];
        let document = self
            .run(&sentences, language_code, model_id, &CancellationToken::new())
            .await?;
        Ok(document.sentences.into_iter().next().unwrap_or_default())
    }

    async fn run(
        &self,
        sentences: &[String],
        language_code: &str,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DocumentResult, PipelineError> {
        let start = Instant::now();
        self.check_language(language_code).await?;

        let mut prepared = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    partial: Box::new(self.stitch(&prepared, &HashMap::new(), 0, 0)),
                });
            }
            prepared.push(self.prepare(sentence, language_code, model_id).await?);
        }

        let eligible: Vec<Token> = prepared
            .iter()
            .flat_map(|s| s.tokens.iter())
            .filter(|t| self.is_eligible(t))
            .cloned()
            .collect();
        let eligible_count = eligible.len();
        let unique = dedupe(eligible);
        let unique_count = unique.len();
        debug!(eligible = eligible_count, unique = unique_count, "tokens ready for matching");

        let (resolutions, failure) = self.resolve_unique(unique, cancel).await;
        let mut document = self.stitch(&prepared, &resolutions, eligible_count, unique_count);

        if let Some(err) = failure {
            let partial = Box::new(document);
            return Err(match err {
                MatchError::Cancelled => {
                    info!(resolved = resolutions.len(), "document run cancelled");
                    PipelineError::Cancelled { partial }
                }
                MatchError::InvalidLanguageCode(code) => PipelineError::InvalidLanguageCode(code),
                other => {
                    let message = match other {
                        MatchError::RemoteServiceUnavailable(message) => message,
                        other => other.to_string(),
                    };
                    warn!(error = %message, resolved = resolutions.len(), "aborting document run");
                    PipelineError::RemoteServiceUnavailable { message, partial }
                }
            });
        }

        if let Some(fetcher) = &self.fetcher {
            let report = build_report(
                fetcher.as_ref(),
                &document.unique_matched_ids,
                language_code,
                self.document.max_concurrency,
            )
            .await;
            document.attach_report(report);
        }

        info!(
            sentences = document.sentences.len(),
            tokens = document.summary.total_tokens,
            matched = document.summary.matched_tokens,
            unmatched = document.summary.unmatched_tokens,
            ids = document.summary.unique_matched_ids,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "document resolved"
        );
        Ok(document)
    }

    /// Fail fast on codes that can never resolve and on an unreachable
    /// service. An unknown language is only logged; its lookups come back
    /// empty and the tokens end up unmatched.
    async fn check_language(&self, language_code: &str) -> Result<(), PipelineError> {
        match self.matcher.languages().resolve(language_code).await {
            Ok(language) if language.is_not_found() => {
                warn!(code = language_code, "language not found in Wikidata");
                Ok(())
            }
            Ok(language) => {
                debug!(code = language_code, item = %language, "language resolved");
                Ok(())
            }
            Err(WikidataError::InvalidLanguageCode(code)) => {
                Err(PipelineError::InvalidLanguageCode(code))
            }
            Err(err) if err.is_outage() => Err(PipelineError::RemoteServiceUnavailable {
                message: err.to_string(),
                partial: Box::default(),
            }),
            Err(err) => {
                warn!(code = language_code, error = %err, "language lookup failed, retrying per token");
                Ok(())
            }
        }
    }

    async fn prepare(
        &self,
        sentence: &str,
        language_code: &str,
        model_id: &str,
    ) -> Result<PreparedSentence, PipelineError> {
        let cleaned = TokenFilter::clean_sentence(sentence);
        let tokens = if cleaned.is_empty() {
            Vec::new()
        } else {
            self.tokenizer
                .tokenize(&cleaned, language_code, model_id)
                .await?
        };
        Ok(PreparedSentence {
            text: sentence.to_string(),
            tokens: self.prefilter.tokens.retain(tokens),
        })
    }

    fn is_eligible(&self, token: &Token) -> bool {
        token.text().chars().count() >= self.document.min_token_length
    }

    /// Resolve distinct tokens concurrently. The first hard failure stops
    /// further hypotheses from starting; lookups already running complete
    /// and their results are kept.
    async fn resolve_unique(
        &self,
        tokens: Vec<Token>,
        cancel: &CancellationToken,
    ) -> (HashMap<DedupKey, Resolution>, Option<MatchError>) {
        let stop = cancel.child_token();
        let stop_ref = &stop;
        let mut resolutions = HashMap::with_capacity(tokens.len());
        let mut failure: Option<MatchError> = None;

        let pending: Vec<_> = tokens
            .into_iter()
            .map(|token| self.resolve_one(token, stop_ref))
            .collect();
        let mut outcomes =
            stream::iter(pending).buffer_unordered(self.document.max_concurrency.max(1));

        while let Some((key, outcome)) = outcomes.next().await {
            match outcome {
                Ok(resolution) => {
                    resolutions.insert(key, resolution);
                }
                Err(err) => {
                    debug!(token = %key.text, error = %err, "token resolution stopped");
                    stop.cancel();
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }
        (resolutions, failure)
    }

    async fn resolve_one(
        &self,
        token: Token,
        stop: &CancellationToken,
    ) -> (DedupKey, Result<Resolution, MatchError>) {
        let outcome = self.matcher.resolve(&token, stop).await;
        (token.dedup_key(), outcome)
    }

    fn stitch(
        &self,
        prepared: &[PreparedSentence],
        resolutions: &HashMap<DedupKey, Resolution>,
        eligible: usize,
        unique: usize,
    ) -> DocumentResult {
        let sentences = prepared
            .iter()
            .map(|sentence| {
                let tokens = sentence
                    .tokens
                    .iter()
                    .map(|token| {
                        if !self.is_eligible(token) {
                            return TokenResult::skipped(token);
                        }
                        match resolutions.get(&token.dedup_key()) {
                            Some(resolution) => TokenResult::from_resolution(token, resolution),
                            None => TokenResult::unresolved(token),
                        }
                    })
                    .collect();
                SentenceResult::new(sentence.text.clone(), tokens)
            })
            .collect();
        DocumentResult::assemble(sentences, eligible, unique)
    }
}
