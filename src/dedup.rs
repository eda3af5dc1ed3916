use std::collections::HashSet;

use matcher::{DedupKey, Token};

/// Collapse tokens with the same [`DedupKey`], keeping the first occurrence
/// of each in input order.
pub fn dedupe<I>(tokens: I) -> Vec<Token>
where
    I: IntoIterator<Item = Token>,
{
    let mut seen: HashSet<DedupKey> = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.dedup_key()))
        .collect()
}
