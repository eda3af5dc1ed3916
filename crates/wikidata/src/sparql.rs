//! SPARQL query text for the Wikidata query service.
//!
//! Builders here are pure string functions; nothing in this module touches
//! the network.

use crate::{CategoryId, LanguageId, WikidataError};

/// Prefix of every entity URI bound by the query service.
pub const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Strip the characters that never appear in a lexeme representation
/// lookup: double quotes and hyphens.
///
/// `he said "run-on"` becomes `he said runon`.
pub fn clean_representation(text: &str) -> String {
    text.chars().filter(|c| *c != '"' && *c != '-').collect()
}

/// Escape a value for embedding inside a double-quoted SPARQL literal.
/// Backslashes are escaped before quotes so the quote escapes survive.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// ISO 639 property used for a language code: `P218` for two-letter codes,
/// `P219` for three-letter codes.
pub fn iso_property(code: &str) -> Result<&'static str, WikidataError> {
    match code.chars().count() {
        2 => Ok("P218"),
        3 => Ok("P219"),
        _ => Err(WikidataError::InvalidLanguageCode(code.to_string())),
    }
}

/// Query resolving an ISO 639 code to the language item.
pub fn language_query(code: &str) -> Result<String, WikidataError> {
    let property = iso_property(code)?;
    Ok(format!(
        "SELECT ?code WHERE {{ ?code wdt:{property} \"{}\" }}",
        escape_literal(code)
    ))
}

/// Query listing forms of lexemes in `language` whose lexical category is
/// `category` (or a subclass of it) and whose representation equals
/// `representation` in the `iso_code` language tag.
///
/// `representation` is cleaned and escaped here; callers pass the raw
/// normalized token text.
pub fn form_query(
    language: &LanguageId,
    category: &CategoryId,
    representation: &str,
    iso_code: &str,
) -> String {
    let literal = escape_literal(&clean_representation(representation));
    format!(
        "SELECT DISTINCT ?form {{\n  \
         ?lexeme dct:language wd:{language} ;\n    \
         wikibase:lexicalCategory / wdt:P279* wd:{category} ;\n    \
         ontolex:lexicalForm ?form .\n  \
         ?form ontolex:representation \"{literal}\"@{iso_code} .\n\
         }}"
    )
}

/// Entity id at the end of a bound URI, or `None` when the value is not an
/// entity URI.
pub fn entity_id_from_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(ENTITY_PREFIX).filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_drops_quotes_and_hyphens() {
        assert_eq!(clean_representation("he said \"run-on\""), "he said runon");
        assert_eq!(clean_representation("plain"), "plain");
    }

    #[test]
    fn escaping_order_keeps_quote_escapes() {
        assert_eq!(escape_literal(r#"a\"b"#), r#"a\\\"b"#);
        assert_eq!(escape_literal("o'neil"), "o'neil");
    }

    #[test]
    fn language_query_picks_property_by_length() {
        assert_eq!(
            language_query("en").unwrap(),
            "SELECT ?code WHERE { ?code wdt:P218 \"en\" }"
        );
        assert!(language_query("dan").unwrap().contains("wdt:P219 \"dan\""));
    }

    #[test]
    fn language_query_rejects_bad_lengths() {
        for code in ["", "e", "engl"] {
            assert!(matches!(
                language_query(code),
                Err(WikidataError::InvalidLanguageCode(_))
            ));
        }
    }

    #[test]
    fn form_query_embeds_all_parts() {
        let q = form_query(
            &LanguageId::new("Q1860"),
            &CategoryId::new("Q1084"),
            "cat",
            "en",
        );
        assert!(q.starts_with("SELECT DISTINCT ?form {"));
        assert!(q.contains("dct:language wd:Q1860 ;"));
        assert!(q.contains("wdt:P279* wd:Q1084 ;"));
        assert!(q.contains("ontolex:representation \"cat\"@en ."));
        assert!(q.ends_with('}'));
    }

    #[test]
    fn form_query_cleans_before_escaping() {
        let q = form_query(
            &LanguageId::new("Q1860"),
            &CategoryId::new("Q1084"),
            "x-\"y\\",
            "en",
        );
        assert!(q.contains("\"xy\\\\\"@en"));
    }

    #[test]
    fn entity_ids_are_suffixes() {
        assert_eq!(ENTITY_PREFIX.len(), 31);
        assert_eq!(
            entity_id_from_uri("http://www.wikidata.org/entity/L1234-F1"),
            Some("L1234-F1")
        );
        assert_eq!(entity_id_from_uri("http://example.org/L1"), None);
        assert_eq!(entity_id_from_uri(ENTITY_PREFIX), None);
    }
}
