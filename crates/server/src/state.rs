use crate::config::ServerConfig;
use crate::error::ServerResult;
use dashmap::DashMap;
use lexsrt::{DocumentResolver, HypothesisMatcher, LexSrtConfig, Tokenizer};
use std::sync::Arc;
use wikidata::{
    BoundedCache, CircuitState, EntityFetcher, FormLookup, HttpEndpoint, HttpEntityFetcher,
    LanguageResolver, SparqlEndpoint,
};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,

    /// Resolver settings applied to every request.
    pub lexsrt: Arc<LexSrtConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    /// Matcher whose language and form caches outlive single requests.
    pub matcher: HypothesisMatcher,

    pub fetcher: Option<Arc<dyn EntityFetcher>>,

    /// The live endpoint, kept for its circuit breaker state.
    http: Option<Arc<HttpEndpoint>>,
}

impl ServerState {
    /// State backed by the Wikidata endpoints named in the resolver config.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let lexsrt = match &config.lexsrt_config {
            Some(path) => LexSrtConfig::from_file(path)?,
            None => LexSrtConfig::default(),
        };
        lexsrt.validate()?;

        let http = Arc::new(HttpEndpoint::new(lexsrt.wikidata.clone())?);
        let fetcher: Arc<dyn EntityFetcher> =
            Arc::new(HttpEntityFetcher::new(lexsrt.wikidata.clone())?);

        let mut state = Self::with_endpoint(config, lexsrt, http.clone(), Some(fetcher))?;
        state.http = Some(http);
        Ok(state)
    }

    /// State over any SPARQL endpoint.
    pub fn with_endpoint(
        config: ServerConfig,
        lexsrt: LexSrtConfig,
        endpoint: Arc<dyn SparqlEndpoint>,
        fetcher: Option<Arc<dyn EntityFetcher>>,
    ) -> ServerResult<Self> {
        let languages = LanguageResolver::with_cache(
            endpoint.clone(),
            Arc::new(BoundedCache::new(config.language_cache_capacity)),
        );
        let forms = FormLookup::with_cache(
            endpoint,
            Arc::new(BoundedCache::new(config.form_cache_capacity)),
        );
        let matcher = HypothesisMatcher::with_parts(languages, forms, lexsrt.matcher.clone())?;
        let fetcher = fetcher.filter(|_| config.enable_reports);

        Ok(Self {
            config: Arc::new(config),
            lexsrt: Arc::new(lexsrt),
            rate_limiter: Arc::new(DashMap::new()),
            matcher,
            fetcher,
            http: None,
        })
    }

    /// Resolver for one request, sharing this state's matcher caches.
    pub fn resolver(&self, tokenizer: Arc<dyn Tokenizer>, with_report: bool) -> DocumentResolver {
        let resolver = DocumentResolver::new(self.matcher.clone(), tokenizer)
            .with_document_config(self.lexsrt.document.clone())
            .with_prefilter(self.lexsrt.prefilter.clone());
        match (&self.fetcher, with_report) {
            (Some(fetcher), true) => resolver.with_fetcher(fetcher.clone()),
            _ => resolver,
        }
    }

    /// `None` when not talking to a live endpoint.
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.http.as_ref().map(|http| http.circuit_state())
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Fixed one-minute window per API key.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikidata::demo_utils::ScriptedEndpoint;

    fn state(rate_limit_per_minute: u32) -> ServerState {
        let config = ServerConfig {
            rate_limit_per_minute,
            ..Default::default()
        };
        ServerState::with_endpoint(
            config,
            LexSrtConfig::default(),
            Arc::new(ScriptedEndpoint::new()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn rate_limit_is_per_key() {
        let state = state(2);
        assert!(state.check_rate_limit("a"));
        assert!(state.check_rate_limit("a"));
        assert!(!state.check_rate_limit("a"));
        assert!(state.check_rate_limit("b"));
    }

    #[test]
    fn scripted_state_has_no_circuit() {
        assert!(state(1).circuit_state().is_none());
    }
}
