//! Utterance intent classification.
//!
//! Decides whether an utterance asks about a physical shop. Matching is a
//! plain case-insensitive substring test against a fixed keyword set, so
//! "workshop" counts as a shop query just as "shop" does.

/// Keywords that mark an utterance as a directory query.
pub const DIRECTORY_KEYWORDS: &[&str] = &[
    "shop",
    "location",
    "nearest shop",
    "where can i find",
    "shop near me",
];

/// What the processor should do with an utterance besides asking the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnIntent {
    /// Look the utterance up in the shop directory.
    DirectoryQuery,
    /// Model answer only.
    General,
}

/// Rule-based intent classifier.
pub struct QueryParser {
    keywords: Vec<String>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// A parser using [`DIRECTORY_KEYWORDS`].
    pub fn new() -> Self {
        Self::with_keywords(DIRECTORY_KEYWORDS.iter().copied())
    }

    /// A parser with a custom keyword set. Keywords are lower-cased.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Classify a raw utterance.
    pub fn classify(&self, utterance: &str) -> TurnIntent {
        let lower = utterance.to_lowercase();
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            TurnIntent::DirectoryQuery
        } else {
            TurnIntent::General
        }
    }
}
