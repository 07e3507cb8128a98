//! Fallback responder: keyword extraction over the advisory table.

use super::table::{fold_case, Keyword, KnowledgeTable};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Used only if a table somehow has no generic sentences, so an answer is never empty.
pub const DEFAULT_GENERIC_RESPONSE: &str =
    "I can answer questions about beekeeping, bloom times and honey production in Europe. What would you like to know?";

/// Keywords found in a question. At most one of each kind; first in list order wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMatch<'a> {
    pub country: Option<&'a str>,
    pub plant: Option<&'a str>,
    pub topic: Option<&'a str>,
}

/// Answers questions from a [`KnowledgeTable`]. Never fails and never returns an empty string.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    table: Arc<KnowledgeTable>,
}

impl QueryMatcher {
    pub fn new(table: Arc<KnowledgeTable>) -> Self {
        Self { table }
    }

    pub fn builtin() -> Self {
        Self::new(Arc::new(KnowledgeTable::builtin()))
    }

    pub fn table(&self) -> &KnowledgeTable {
        &self.table
    }

    /// Case-insensitive substring scan of each ordered keyword list.
    pub fn extract(&self, question: &str) -> QueryMatch<'_> {
        let lowered = fold_case(question);
        QueryMatch {
            country: first_match(self.table.countries(), &lowered),
            plant: first_match(self.table.plants(), &lowered),
            topic: first_match(self.table.topics(), &lowered),
        }
    }

    /// Resolves an advisory: exact country/plant pair, then general topic, then a random generic sentence.
    pub fn answer_with<R: Rng + ?Sized>(&self, question: &str, rng: &mut R) -> String {
        let found = self.extract(question);
        if let (Some(country), Some(plant)) = (found.country, found.plant) {
            if let Some(text) = self.table.advisory(country, plant) {
                return text.to_string();
            }
        }
        if let Some(text) = found.topic.and_then(|topic| self.table.general_advisory(topic)) {
            return text.to_string();
        }
        self.table
            .generic()
            .iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_GENERIC_RESPONSE.to_string())
    }

    /// [`QueryMatcher::answer_with`] using the thread-local RNG.
    pub fn answer(&self, question: &str) -> String {
        self.answer_with(question, &mut rand::thread_rng())
    }
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}

fn first_match<'a>(keywords: &'a [Keyword], lowered: &str) -> Option<&'a str> {
    keywords
        .iter()
        .find(|k| k.matches(lowered))
        .map(|k| k.name.as_str())
}
