use std::sync::Arc;
use tracing::debug;

use crate::cache::{ResultCache, RunCache};
use crate::sparql::{entity_id_from_uri, language_query};
use crate::{LanguageId, SparqlEndpoint, WikidataError};

/// Resolves ISO 639 codes to language items, memoized by the exact code.
#[derive(Clone)]
pub struct LanguageResolver {
    endpoint: Arc<dyn SparqlEndpoint>,
    cache: Arc<dyn ResultCache<String, LanguageId>>,
}

impl LanguageResolver {
    /// Resolver with a run-scoped cache.
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>) -> Self {
        Self::with_cache(endpoint, Arc::new(RunCache::new()))
    }

    pub fn with_cache(
        endpoint: Arc<dyn SparqlEndpoint>,
        cache: Arc<dyn ResultCache<String, LanguageId>>,
    ) -> Self {
        Self { endpoint, cache }
    }

    /// Language item for `code`, or [`LanguageId::not_found`] when the
    /// knowledge base has no language with that code. Codes must be two or
    /// three characters long.
    pub async fn resolve(&self, code: &str) -> Result<LanguageId, WikidataError> {
        let query = language_query(code)?;
        if let Some(hit) = self.cache.get(&code.to_string()) {
            return Ok(hit);
        }

        let bindings = self.endpoint.select(&query).await?;
        let language = bindings
            .first()
            .and_then(|row| row.get("code"))
            .and_then(|uri| entity_id_from_uri(uri))
            .map(LanguageId::new)
            .unwrap_or_else(LanguageId::not_found);

        debug!(code, language = %language, "resolved language code");
        self.cache.put(code.to_string(), language.clone());
        Ok(language)
    }
}

impl std::fmt::Debug for LanguageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageResolver")
            .field("cached", &self.cache.len())
            .finish()
    }
}
