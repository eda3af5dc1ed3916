use std::collections::HashMap;

use wikidata::CategoryId;

/// Coarse tag to lexical category item.
const DEFAULT_TABLE: &[(&str, &str)] = &[
    ("ADJ", "Q34698"),
    ("ADV", "Q380057"),
    ("INTJ", "Q83034"),
    ("NOUN", "Q1084"),
    ("PROPN", "Q147276"),
    ("VERB", "Q24905"),
    ("ADP", "Q134316"),
    ("AUX", "Q24905"),
    ("CCONJ", "Q36484"),
    ("DET", "Q576271"),
    ("NUM", "Q63116"),
    ("PART", "Q184943"),
    ("PRON", "Q36224"),
    ("SCONJ", "Q36484"),
];

/// Tags that never name a lexical category, whatever the table says.
const EXCLUDED: &[&str] = &["PUNCT", "SYM", "X", "SPACE"];

/// Attempt-scoped category override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedCategory {
    /// Read `PROPN` tokens as this tag; other tags are unaffected.
    ProperNounAs(&'static str),
    /// Read the token as this tag whatever it was tagged as.
    Tag(&'static str),
}

/// Maps coarse part-of-speech tags to lexical category items.
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    table: HashMap<String, CategoryId>,
}

impl Default for CategoryMapper {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE
                .iter()
                .map(|(tag, item)| (tag.to_string(), CategoryId::new(*item)))
                .collect(),
        }
    }
}

impl CategoryMapper {
    /// Default table with `overrides` (tag -> item) applied on top.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut mapper = Self::default();
        for (tag, item) in overrides {
            mapper
                .table
                .insert(tag.trim().to_ascii_uppercase(), CategoryId::new(item.as_str()));
        }
        mapper
    }

    /// Category for `tag` under an optional override. `None` means the
    /// token must not be looked up at all.
    pub fn category_id(&self, tag: &str, forced: Option<ForcedCategory>) -> Option<CategoryId> {
        let effective = match forced {
            None => tag,
            Some(ForcedCategory::Tag(forced_tag)) => forced_tag,
            Some(ForcedCategory::ProperNounAs(forced_tag)) => {
                if tag.eq_ignore_ascii_case("PROPN") {
                    forced_tag
                } else {
                    tag
                }
            }
        };
        self.lookup(effective)
    }

    fn lookup(&self, tag: &str) -> Option<CategoryId> {
        let tag = tag.trim().to_ascii_uppercase();
        if EXCLUDED.contains(&tag.as_str()) {
            return None;
        }
        self.table.get(&tag).cloned()
    }

    /// Whether the tag as given can ever be looked up.
    pub fn is_supported(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn id(s: &str) -> Option<CategoryId> {
        Some(CategoryId::new(s))
    }

    #[test]
    fn default_table() {
        let mapper = CategoryMapper::default();
        assert_eq!(mapper.category_id("NOUN", None), id("Q1084"));
        assert_eq!(mapper.category_id("PROPN", None), id("Q147276"));
        assert_eq!(mapper.category_id("AUX", None), mapper.category_id("VERB", None));
        assert_eq!(mapper.category_id("SCONJ", None), id("Q36484"));
    }

    #[test]
    fn tags_are_case_insensitive() {
        let mapper = CategoryMapper::default();
        assert_eq!(mapper.category_id("noun", None), id("Q1084"));
        assert_eq!(mapper.category_id(" Adj ", None), id("Q34698"));
    }

    #[test]
    fn punctuation_and_unknown_tags_are_unsupported() {
        let mapper = CategoryMapper::default();
        for tag in ["PUNCT", "SYM", "X", "SPACE", "", "FOO"] {
            assert_eq!(mapper.category_id(tag, None), None, "tag {tag}");
            assert!(!mapper.is_supported(tag));
        }
    }

    #[test]
    fn proper_noun_override_only_touches_propn() {
        let mapper = CategoryMapper::default();
        let forced = Some(ForcedCategory::ProperNounAs("NOUN"));
        assert_eq!(mapper.category_id("PROPN", forced), id("Q1084"));
        assert_eq!(mapper.category_id("VERB", forced), id("Q24905"));
        assert_eq!(mapper.category_id("PUNCT", forced), None);
        // Shared table is unchanged afterwards.
        assert_eq!(mapper.category_id("PROPN", None), id("Q147276"));
    }

    #[test]
    fn tag_override_replaces_any_tag() {
        let mapper = CategoryMapper::default();
        let forced = Some(ForcedCategory::Tag("VERB"));
        assert_eq!(mapper.category_id("NOUN", forced), id("Q24905"));
        assert_eq!(mapper.category_id("PUNCT", forced), id("Q24905"));
    }

    #[test]
    fn config_overrides_extend_the_table() {
        let overrides = BTreeMap::from([
            ("propn".to_string(), "Q1084".to_string()),
            ("ABBR".to_string(), "Q102786".to_string()),
        ]);
        let mapper = CategoryMapper::with_overrides(&overrides);
        assert_eq!(mapper.category_id("PROPN", None), id("Q1084"));
        assert_eq!(mapper.category_id("ABBR", None), id("Q102786"));
        assert_eq!(mapper.category_id("NOUN", None), id("Q1084"));
    }
}
