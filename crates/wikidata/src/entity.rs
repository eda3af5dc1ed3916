use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::endpoint::{build_client, map_send_error, truncate, Guards};
use crate::{LexemeId, WikidataConfig, WikidataError};

/// Base of human-facing lexeme pages.
pub const LEXEME_PAGE_BASE: &str = "https://www.wikidata.org/wiki/Lexeme:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    pub id: String,
    /// Gloss text keyed by language code.
    pub glosses: BTreeMap<String, String>,
}

/// Lemmas and senses of one lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexemeEntity {
    pub id: LexemeId,
    /// Lemma text keyed by language code (spelling variants count as codes).
    pub lemmas: BTreeMap<String, String>,
    pub senses: Vec<Sense>,
    pub url: String,
}

impl LexemeEntity {
    pub fn new(id: LexemeId) -> Self {
        let url = format!("{LEXEME_PAGE_BASE}{id}");
        Self {
            id,
            lemmas: BTreeMap::new(),
            senses: Vec::new(),
            url,
        }
    }

    /// Lemma in `language`, falling back to the first lemma in code order.
    pub fn lemma(&self, language: &str) -> Option<&str> {
        self.lemmas
            .get(language)
            .or_else(|| self.lemmas.values().next())
            .map(String::as_str)
    }

    pub fn has_senses(&self) -> bool {
        !self.senses.is_empty()
    }

    /// Whether any sense carries a gloss in any language.
    pub fn has_any_gloss(&self) -> bool {
        self.senses.iter().any(|s| !s.glosses.is_empty())
    }
}

/// Source of lexeme entity data.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch(&self, id: &LexemeId) -> Result<LexemeEntity, WikidataError>;
}

/// [`EntityFetcher`] using the `wbgetentities` action API.
#[derive(Debug, Clone)]
pub struct HttpEntityFetcher {
    config: Arc<WikidataConfig>,
    guards: Arc<Guards>,
    client: reqwest::Client,
}

impl HttpEntityFetcher {
    pub fn new(config: WikidataConfig) -> Result<Self, WikidataError> {
        config.validate()?;
        let guards = Arc::new(Guards::new(&config));
        let client = build_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            guards,
            client,
        })
    }

    async fn send(&self, id: &LexemeId) -> Result<Value, WikidataError> {
        let timeout = self.config.timeout();
        let response = self
            .client
            .get(&self.config.entity_api_url)
            .query(&[
                ("action", "wbgetentities"),
                ("ids", id.as_str()),
                ("format", "json"),
            ])
            .header(USER_AGENT, &self.config.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikidataError::Status {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| map_send_error(e, timeout))
    }
}

#[async_trait]
impl EntityFetcher for HttpEntityFetcher {
    async fn fetch(&self, id: &LexemeId) -> Result<LexemeEntity, WikidataError> {
        let payload = self
            .guards
            .run(&self.config, "wbgetentities", || self.send(id))
            .await?;
        parse_entity(id, &payload)
    }
}

fn language_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(lang, term)| {
                    term.get("value")
                        .and_then(Value::as_str)
                        .map(|text| (lang.clone(), text.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Extract one lexeme from a `wbgetentities` response.
pub fn parse_entity(id: &LexemeId, payload: &Value) -> Result<LexemeEntity, WikidataError> {
    let entity = payload
        .get("entities")
        .and_then(|e| e.get(id.as_str()))
        .ok_or_else(|| {
            WikidataError::MalformedResponse(format!("entity {id} missing from response"))
        })?;
    if entity.get("missing").is_some() {
        return Err(WikidataError::MalformedResponse(format!(
            "entity {id} does not exist"
        )));
    }

    let mut lexeme = LexemeEntity::new(id.clone());
    lexeme.lemmas = language_map(entity.get("lemmas"));
    lexeme.senses = entity
        .get("senses")
        .and_then(Value::as_array)
        .map(|senses| {
            senses
                .iter()
                .map(|sense| Sense {
                    id: sense
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    glosses: language_map(sense.get("glosses")),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(lexeme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "entities": {
                "L1234": {
                    "id": "L1234",
                    "lemmas": {"en": {"language": "en", "value": "cat"}},
                    "senses": [
                        {"id": "L1234-S1", "glosses": {
                            "en": {"language": "en", "value": "small domesticated feline"},
                            "da": {"language": "da", "value": "kat"}
                        }},
                        {"id": "L1234-S2", "glosses": {}}
                    ]
                }
            }
        })
    }

    #[test]
    fn parses_lemmas_and_senses() {
        let lexeme = parse_entity(&LexemeId::new("L1234"), &payload()).unwrap();
        assert_eq!(lexeme.lemma("en"), Some("cat"));
        assert_eq!(lexeme.senses.len(), 2);
        assert_eq!(lexeme.senses[0].glosses["da"], "kat");
        assert!(lexeme.senses[1].glosses.is_empty());
        assert!(lexeme.has_any_gloss());
        assert_eq!(lexeme.url, "https://www.wikidata.org/wiki/Lexeme:L1234");
    }

    #[test]
    fn lemma_falls_back_to_first_language() {
        let lexeme = parse_entity(&LexemeId::new("L1234"), &payload()).unwrap();
        assert_eq!(lexeme.lemma("sv"), Some("cat"));
        assert_eq!(LexemeEntity::new(LexemeId::new("L1")).lemma("en"), None);
    }

    #[test]
    fn missing_entity_is_malformed() {
        let err = parse_entity(&LexemeId::new("L9"), &payload()).unwrap_err();
        assert!(matches!(err, WikidataError::MalformedResponse(_)));

        let gone = json!({"entities": {"L9": {"id": "L9", "missing": ""}}});
        assert!(parse_entity(&LexemeId::new("L9"), &gone).is_err());
    }

    #[test]
    fn lexeme_without_senses() {
        let bare = json!({"entities": {"L5": {"lemmas": {"en": {"value": "um"}}}}});
        let lexeme = parse_entity(&LexemeId::new("L5"), &bare).unwrap();
        assert!(!lexeme.has_senses());
        assert!(!lexeme.has_any_gloss());
    }
}
