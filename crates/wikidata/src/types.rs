use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of a SPARQL `SELECT` result: variable name to bound value.
pub type Binding = BTreeMap<String, String>;

/// Knowledge-base item id of a language (e.g. `Q1860` for English).
///
/// The empty id is the "not found" sentinel returned when the code has no
/// binding. It is a valid value, not an error: queries built from it simply
/// match nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct LanguageId(String);

impl LanguageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn not_found() -> Self {
        Self(String::new())
    }

    pub fn is_not_found(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Knowledge-base item id of a lexical category (e.g. `Q1084`, noun).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id of a lexeme form, `L<n>-F<m>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lexeme owning this form (`L1234-F1` -> `L1234`). Ids without a
    /// form suffix are returned unchanged.
    pub fn lexeme_id(&self) -> LexemeId {
        let lexeme = self.0.split_once('-').map_or(self.0.as_str(), |(l, _)| l);
        LexemeId::new(lexeme)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexemeId(String);

impl LexemeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LexemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache key for form lookups. Two tokens producing the same key always get
/// the same answer, so the remote call is made at most once per key.
///
/// The ISO code is part of the key because the query matches the literal's
/// language tag: `en` and `eng` share an item but not their representations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedQueryKey {
    pub language: LanguageId,
    pub category: CategoryId,
    /// Surface form after cleaning (see [`crate::sparql::clean_representation`]).
    pub representation: String,
    /// Language tag of the representation literal.
    pub iso_code: String,
}

impl NormalizedQueryKey {
    pub fn new(
        language: LanguageId,
        category: CategoryId,
        representation: &str,
        iso_code: &str,
    ) -> Self {
        Self {
            language,
            category,
            representation: crate::sparql::clean_representation(representation),
            iso_code: iso_code.to_string(),
        }
    }
}
