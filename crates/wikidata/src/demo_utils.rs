//! In-process stand-ins for the remote services, used by tests and demos.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::sparql::{iso_property, ENTITY_PREFIX};
use crate::{
    Binding, EntityFetcher, LexemeEntity, LexemeId, Sense, SparqlEndpoint, WikidataError,
};

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Binding>),
    Fail(WikidataError),
}

#[derive(Debug, Clone)]
struct Rule {
    needles: Vec<String>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, query: &str) -> bool {
        self.needles.iter().all(|n| query.contains(n.as_str()))
    }
}

/// [`SparqlEndpoint`] answering from scripted rules.
///
/// A rule fires when the query contains all of its needle strings. Failure
/// rules are checked before data rules; a query matching nothing gets zero
/// bindings. Every query is recorded.
#[derive(Debug, Default)]
pub struct ScriptedEndpoint {
    rules: Vec<Rule>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an ISO 639 code to a language item.
    pub fn with_language(mut self, code: &str, qid: &str) -> Self {
        let property = iso_property(code).unwrap_or("P218");
        self.rules.push(Rule {
            needles: vec![
                "SELECT ?code".into(),
                format!("wdt:{property} \"{code}\""),
            ],
            reply: Reply::Rows(vec![uri_binding("code", qid)]),
        });
        self
    }

    /// Answer form queries for (language item, category item, cleaned
    /// representation) with the given form ids.
    pub fn with_forms(mut self, language: &str, category: &str, representation: &str, forms: &[&str]) -> Self {
        self.rules.push(Rule {
            needles: vec![
                "SELECT DISTINCT ?form".into(),
                format!("dct:language wd:{language} ;"),
                format!("wd:{category} ;"),
                format!("\"{representation}\"@"),
            ],
            reply: Reply::Rows(forms.iter().map(|id| uri_binding("form", id)).collect()),
        });
        self
    }

    /// Fail every query containing `needle`.
    pub fn with_failure(mut self, needle: &str, error: WikidataError) -> Self {
        self.rules.insert(
            0,
            Rule {
                needles: vec![needle.to_string()],
                reply: Reply::Fail(error),
            },
        );
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls that reached the endpoint for which `query` contains
    /// `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls().iter().filter(|q| q.contains(needle)).count()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SparqlEndpoint for ScriptedEndpoint {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, WikidataError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .rules
            .iter()
            .find(|rule| rule.matches(query))
            .map(|rule| rule.reply.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match reply {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(err)) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

fn uri_binding(var: &str, id: &str) -> Binding {
    let mut row = BTreeMap::new();
    row.insert(var.to_string(), format!("{ENTITY_PREFIX}{id}"));
    row
}

/// [`EntityFetcher`] serving canned lexemes.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    entities: BTreeMap<LexemeId, LexemeEntity>,
    failing: Vec<LexemeId>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lexeme with one lemma and one sense per gloss list entry.
    /// An empty `glosses` slice produces a lexeme without senses.
    pub fn with_lexeme(
        mut self,
        id: &str,
        language: &str,
        lemma: &str,
        glosses: &[Option<&str>],
    ) -> Self {
        let mut entity = LexemeEntity::new(LexemeId::new(id));
        entity.lemmas.insert(language.to_string(), lemma.to_string());
        entity.senses = glosses
            .iter()
            .enumerate()
            .map(|(i, gloss)| Sense {
                id: format!("{id}-S{}", i + 1),
                glosses: gloss
                    .map(|g| BTreeMap::from([(language.to_string(), g.to_string())]))
                    .unwrap_or_default(),
            })
            .collect();
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    pub fn with_failure(mut self, id: &str) -> Self {
        self.failing.push(LexemeId::new(id));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityFetcher for ScriptedFetcher {
    async fn fetch(&self, id: &LexemeId) -> Result<LexemeEntity, WikidataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(WikidataError::Transport(format!("scripted failure for {id}")));
        }
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| WikidataError::MalformedResponse(format!("entity {id} missing")))
    }
}
