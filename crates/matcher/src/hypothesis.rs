use serde::{Deserialize, Serialize};

use crate::category::ForcedCategory;

/// One reading of a token's category tried during resolution.
///
/// Readings are tried in declaration order and the first one with results
/// wins. Proper-noun reinterpretations come before the blunt overrides since
/// capitalized tokens are more often common words than misspelled names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchHypothesis {
    AsTagged,
    ProperNounAsNoun,
    ProperNounAsAdjective,
    ForcedNoun,
    ForcedVerb,
    ForcedAdjective,
}

impl MatchHypothesis {
    pub const ALL: [MatchHypothesis; 6] = [
        MatchHypothesis::AsTagged,
        MatchHypothesis::ProperNounAsNoun,
        MatchHypothesis::ProperNounAsAdjective,
        MatchHypothesis::ForcedNoun,
        MatchHypothesis::ForcedVerb,
        MatchHypothesis::ForcedAdjective,
    ];

    /// Position in the trial order, 0 to 5.
    pub fn index(self) -> u8 {
        match self {
            MatchHypothesis::AsTagged => 0,
            MatchHypothesis::ProperNounAsNoun => 1,
            MatchHypothesis::ProperNounAsAdjective => 2,
            MatchHypothesis::ForcedNoun => 3,
            MatchHypothesis::ForcedVerb => 4,
            MatchHypothesis::ForcedAdjective => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Category override applied for this attempt only.
    pub fn forced(self) -> Option<ForcedCategory> {
        match self {
            MatchHypothesis::AsTagged => None,
            MatchHypothesis::ProperNounAsNoun => Some(ForcedCategory::ProperNounAs("NOUN")),
            MatchHypothesis::ProperNounAsAdjective => Some(ForcedCategory::ProperNounAs("ADJ")),
            MatchHypothesis::ForcedNoun => Some(ForcedCategory::Tag("NOUN")),
            MatchHypothesis::ForcedVerb => Some(ForcedCategory::Tag("VERB")),
            MatchHypothesis::ForcedAdjective => Some(ForcedCategory::Tag("ADJ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_fixed() {
        let indices: Vec<u8> = MatchHypothesis::ALL.iter().map(|h| h.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(MatchHypothesis::from_index(3), Some(MatchHypothesis::ForcedNoun));
        assert_eq!(MatchHypothesis::from_index(6), None);
    }

    #[test]
    fn only_as_tagged_keeps_the_tag() {
        assert!(MatchHypothesis::AsTagged.forced().is_none());
        assert!(MatchHypothesis::ALL[1..].iter().all(|h| h.forced().is_some()));
    }
}
