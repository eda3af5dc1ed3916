//! Filters applied before tokens reach the matcher.

use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use matcher::Token;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("markup regex"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex")
});

/// Drops the trailing credit entries of a subtitle file.
///
/// Subtitle sites commonly append an advert entry and one or two entries
/// crediting the translators. When enabled, the last `drop_trailing`
/// entries are removed first; then the last entry is removed if it mentions
/// `marker`, and the last two if the second to last one does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsFilter {
    pub enabled: bool,
    /// Matched case-insensitively.
    pub marker: String,
    pub drop_trailing: usize,
}

impl Default for CreditsFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            marker: "subtitles".to_string(),
            drop_trailing: 1,
        }
    }
}

impl CreditsFilter {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.marker.trim().is_empty() {
            return Err("prefilter.credits.marker must not be empty".to_string());
        }
        Ok(())
    }

    /// The entries left after removing credits.
    pub fn apply<'a>(&self, entries: &'a [String]) -> &'a [String] {
        if !self.enabled {
            return entries;
        }
        let marker = self.marker.to_lowercase();
        let mentions = |entry: &String| entry.to_lowercase().contains(&marker);

        let mut end = entries.len().saturating_sub(self.drop_trailing);
        if end >= 1 && mentions(&entries[end - 1]) {
            end -= 1;
        }
        if end >= 2 && mentions(&entries[end - 2]) {
            end -= 2;
        }
        &entries[..end]
    }
}

/// Sentence cleanup and token-level junk removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFilter {
    pub drop_emails: bool,
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self { drop_emails: true }
    }
}

impl TokenFilter {
    /// Strip `<...>` markup and `--` (which taggers split badly) from a
    /// subtitle line, and decode HTML character references such as `&amp;`
    /// and `&#39;`.
    pub fn clean_sentence(text: &str) -> String {
        let stripped = MARKUP.replace_all(text, "");
        decode_entities(&stripped).replace("--", "").trim().to_string()
    }

    pub fn looks_like_email(text: &str) -> bool {
        EMAIL.is_match(text)
    }

    /// Whether `token` should be dropped before matching.
    pub fn rejects(&self, token: &Token) -> bool {
        self.drop_emails && Self::looks_like_email(token.text())
    }

    pub fn retain(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter().filter(|t| !self.rejects(t)).collect()
    }
}

/// Decode each reference on its own so an unknown name or a bare `&` leaves
/// the rest of the line intact.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            unescape_with(&caps[0], resolve_html5_entity)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn credits_filter_is_off_by_default() {
        let lines = entries(&["Hello.", "Subtitles by Bob", "Advert"]);
        assert_eq!(CreditsFilter::default().apply(&lines).len(), 3);
    }

    #[test]
    fn credits_filter_drops_advert_and_credit_lines() {
        let filter = CreditsFilter {
            enabled: true,
            ..Default::default()
        };
        let lines = entries(&["Hello.", "Bye.", "SUBTITLES by Bob", "Advert"]);
        assert_eq!(filter.apply(&lines), &lines[..2]);

        let lines = entries(&["Hello.", "Subtitles: Bob", "Synced by Ann", "Advert"]);
        assert_eq!(filter.apply(&lines), &lines[..1]);

        let lines = entries(&["Hello.", "Bye.", "Advert"]);
        assert_eq!(filter.apply(&lines), &lines[..2]);
    }

    #[test]
    fn credits_filter_handles_short_input() {
        let filter = CreditsFilter {
            enabled: true,
            ..Default::default()
        };
        assert!(filter.apply(&entries(&["Advert"])).is_empty());
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn clean_sentence_strips_markup_and_double_hyphens() {
        assert_eq!(
            TokenFilter::clean_sentence("<i>Wait--</i> what?"),
            "Wait what?"
        );
        assert_eq!(
            TokenFilter::clean_sentence("<font color=\"#fff\">well-known</font>"),
            "well-known"
        );
    }

    #[test]
    fn clean_sentence_decodes_character_references() {
        assert_eq!(
            TokenFilter::clean_sentence("Tom &amp; Jerry aren&#39;t here"),
            "Tom & Jerry aren't here"
        );
        assert_eq!(
            TokenFilter::clean_sentence("<i>caf&eacute;&nbsp;&#x2014;</i>"),
            "caf\u{e9}\u{a0}\u{2014}"
        );
        assert_eq!(TokenFilter::clean_sentence("&lt;i&gt;"), "<i>");
    }

    #[test]
    fn unknown_references_and_bare_ampersands_survive() {
        assert_eq!(
            TokenFilter::clean_sentence("R & D &bogus; &amp;"),
            "R & D &bogus; &"
        );
    }

    #[test]
    fn drops_email_tokens_only() {
        let filter = TokenFilter::default();
        let tokens = vec![
            Token::new("subs@example.com", "", "X", "en"),
            Token::new("cat", "", "NOUN", "en"),
            Token::new("@", "", "SYM", "en"),
        ];
        let kept = filter.retain(tokens);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text(), "cat");

        let permissive = TokenFilter { drop_emails: false };
        assert!(!permissive.rejects(&Token::new("a@b.org", "", "X", "en")));
    }
}
