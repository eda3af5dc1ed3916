//! Shared fixtures for the integration tests: a scripted Wikidata, tagged
//! sentences and resolver wiring.

#![allow(dead_code)]

use std::sync::Arc;

use lexsrt::{
    DocumentConfig, DocumentResolver, HypothesisMatcher, MatcherConfig, PretaggedTokenizer,
    TaggedDocument, TaggedSentence, TaggedWord,
};
use wikidata::demo_utils::ScriptedEndpoint;

pub const ENGLISH: &str = "Q1860";
pub const NOUN: &str = "Q1084";
pub const VERB: &str = "Q24905";
pub const ADJ: &str = "Q34698";
pub const PROPN: &str = "Q147276";

/// `text` tagged word by word; each entry is `(word, tag)`.
pub fn sentence(text: &str, words: &[(&str, &str)]) -> TaggedSentence {
    TaggedSentence {
        text: text.to_string(),
        tokens: words
            .iter()
            .map(|(word, pos)| TaggedWord {
                text: word.to_string(),
                norm: None,
                pos: pos.to_string(),
            })
            .collect(),
    }
}

pub fn document(sentences: Vec<TaggedSentence>) -> TaggedDocument {
    TaggedDocument {
        model: "en_core_web_sm".to_string(),
        sentences,
    }
}

/// "The cat sat on the mat." tagged the way a small English model does.
pub fn cat_sentence() -> TaggedSentence {
    sentence(
        "The cat sat on the mat.",
        &[
            ("The", "DET"),
            ("cat", "NOUN"),
            ("sat", "VERB"),
            ("on", "ADP"),
            ("the", "DET"),
            ("mat", "NOUN"),
            (".", "PUNCT"),
        ],
    )
}

/// English with forms for `cat`/NOUN and `sat`/VERB.
pub fn english_endpoint() -> ScriptedEndpoint {
    ScriptedEndpoint::new()
        .with_language("en", ENGLISH)
        .with_forms(ENGLISH, NOUN, "cat", &["L1234-F1"])
        .with_forms(ENGLISH, VERB, "sat", &["L5-F3"])
}

pub fn resolver(endpoint: Arc<ScriptedEndpoint>, tagged: &TaggedDocument) -> DocumentResolver {
    resolver_with(endpoint, tagged, DocumentConfig::default())
}

pub fn resolver_with(
    endpoint: Arc<ScriptedEndpoint>,
    tagged: &TaggedDocument,
    document: DocumentConfig,
) -> DocumentResolver {
    let matcher = HypothesisMatcher::new(endpoint, MatcherConfig::default())
        .expect("default matcher config is valid");
    DocumentResolver::new(matcher, Arc::new(PretaggedTokenizer::new(tagged)))
        .with_document_config(document)
}
