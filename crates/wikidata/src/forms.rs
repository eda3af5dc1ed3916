use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{ResultCache, RunCache};
use crate::sparql::{entity_id_from_uri, form_query};
use crate::{FormId, NormalizedQueryKey, SparqlEndpoint, WikidataError};

/// Set of forms matching one query key.
pub type FormSet = BTreeSet<FormId>;

/// Looks up lexeme forms by (language, category, representation).
///
/// Results are memoized per [`NormalizedQueryKey`]. Concurrent lookups of the
/// same key wait for the first one, so each key reaches the endpoint once as
/// long as it succeeds. Failures are not cached.
#[derive(Clone)]
pub struct FormLookup {
    endpoint: Arc<dyn SparqlEndpoint>,
    cache: Arc<dyn ResultCache<NormalizedQueryKey, FormSet>>,
    inflight: Arc<DashMap<NormalizedQueryKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl FormLookup {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>) -> Self {
        Self::with_cache(endpoint, Arc::new(RunCache::new()))
    }

    pub fn with_cache(
        endpoint: Arc<dyn SparqlEndpoint>,
        cache: Arc<dyn ResultCache<NormalizedQueryKey, FormSet>>,
    ) -> Self {
        Self {
            endpoint,
            cache,
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Forms for `key`.
    pub async fn lookup(&self, key: &NormalizedQueryKey) -> Result<FormSet, WikidataError> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }

        let gate = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let result = {
            let _guard = gate.lock().await;
            match self.cache.get(key) {
                Some(hit) => Ok(hit),
                None => self.fetch(key).await,
            }
        };
        // Only drop our own gate; a later caller may have installed a new one.
        self.inflight.remove_if(key, |_, current| Arc::ptr_eq(current, &gate));
        result
    }

    async fn fetch(&self, key: &NormalizedQueryKey) -> Result<FormSet, WikidataError> {
        let query = form_query(&key.language, &key.category, &key.representation, &key.iso_code);
        let bindings = self.endpoint.select(&query).await?;
        let forms: FormSet = bindings
            .iter()
            .filter_map(|row| row.get("form"))
            .filter_map(|uri| entity_id_from_uri(uri))
            .map(FormId::new)
            .collect();

        debug!(
            representation = %key.representation,
            category = %key.category,
            iso_code = %key.iso_code,
            forms = forms.len(),
            "form lookup"
        );
        self.cache.put(key.clone(), forms.clone());
        Ok(forms)
    }

    #[cfg(test)]
    fn inflight_keys(&self) -> usize {
        self.inflight.len()
    }

    /// Number of memoized keys.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for FormLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormLookup")
            .field("cached", &self.cache.len())
            .finish()
    }
}
