//! Question/answer pairs used as few-shot context for the upstream model.

use super::table::fold_case;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

/// How many examples go into a prompt.
pub const RELEVANT_EXAMPLE_LIMIT: usize = 5;

/// Related terms added to a question's keywords before scoring.
const KEYWORD_EXPANSIONS: &[(&str, &[&str])] = &[
    ("daisies", &["daisy", "bellis", "marguerite", "oxeye"]),
    ("grow", &["growing", "cultivate", "plant", "planting", "cultivation"]),
    ("best", &["optimal", "ideal", "perfect", "excellent", "suitable"]),
    ("where", &["location", "place", "region", "area", "country"]),
    ("bees", &["bee", "honeybee", "pollinator", "pollination"]),
    ("honey", &["nectar", "honey production", "honey yield"]),
    ("bloom", &["blooming", "flowering", "blossom", "blossoming"]),
    ("season", &["time", "period", "when", "timing"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleMessage {
    pub role: String,
    pub content: String,
}

/// One JSONL line: `{"messages": [{"role": "user", ...}, {"role": "assistant", ...}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ExampleMessage>,
}

impl TrainingExample {
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            messages: vec![
                ExampleMessage {
                    role: "user".to_string(),
                    content: question.to_string(),
                },
                ExampleMessage {
                    role: "assistant".to_string(),
                    content: answer.to_string(),
                },
            ],
        }
    }

    fn content_for(&self, role: &str) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    pub fn question(&self) -> &str {
        self.content_for("user")
    }

    pub fn answer(&self) -> &str {
        self.content_for("assistant")
    }

    /// Relevance in half points: per keyword +6 in the question, +4 in the answer, +2 in both
    /// joined, and +1 for each word of the joined text that contains, or is contained in, a
    /// keyword longer than three characters.
    fn score(&self, keywords: &[&str]) -> usize {
        let user = fold_case(self.question());
        let assistant = fold_case(self.answer());
        let combined = format!("{} {}", user, assistant);
        let words: Vec<&str> = combined.split_whitespace().collect();
        keywords
            .iter()
            .map(|k| {
                let mut s = 0;
                if user.contains(k) {
                    s += 6;
                }
                if assistant.contains(k) {
                    s += 4;
                }
                if combined.contains(k) {
                    s += 2;
                }
                if k.chars().count() > 3 {
                    s += words.iter().filter(|w| w.contains(k) || k.contains(*w)).count();
                }
                s
            })
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
    examples: Vec<TrainingExample>,
}

impl ExampleStore {
    pub fn new(examples: Vec<TrainingExample>) -> Self {
        Self { examples }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            TrainingExample::new(
                "When does wild garlic bloom in Germany?",
                "Wild garlic typically blooms from late March to early May in central Germany. Based on BloomWatch forecasts and GBIF 2025 records, you should move your hives in early April to align with peak nectar flow.",
            ),
            TrainingExample::new(
                "When does clover bloom in northern Spain?",
                "In northern Spain, BloomWatch 2025 satellite data shows clover blooming from mid-April through June.",
            ),
            TrainingExample::new(
                "What's the best period for honey collection in southern Spain?",
                "According to GBIF 2025 data, sunflowers in southern Spain reach full bloom between late June and August. Start honey collection in mid-July when nectar availability peaks.",
            ),
        ])
    }

    /// Parses JSONL. Blank lines are ignored and malformed lines are skipped with a warning.
    pub fn from_jsonl<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut examples = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TrainingExample>(line) {
                Ok(example) => examples.push(example),
                Err(e) => tracing::warn!(
                    target: "beeai::knowledge",
                    line = n + 1,
                    error = %e,
                    "Skipping malformed training example"
                ),
            }
        }
        Ok(Self::new(examples))
    }

    /// Tries each path in order; the first file yielding at least one example wins.
    /// Falls back to [`ExampleStore::builtin`].
    pub fn load_first<P: AsRef<Path>>(paths: &[P]) -> Self {
        for path in paths {
            let path = path.as_ref();
            let file = match std::fs::File::open(path) {
                Ok(f) => f,
                Err(_) => continue,
            };
            match Self::from_jsonl(std::io::BufReader::new(file)) {
                Ok(store) if !store.is_empty() => {
                    tracing::info!(
                        target: "beeai::knowledge",
                        path = %path.display(),
                        entries = store.len(),
                        "Loaded training examples"
                    );
                    return store;
                }
                Ok(_) => tracing::warn!(target: "beeai::knowledge", path = %path.display(), "Training file has no examples"),
                Err(e) => tracing::warn!(target: "beeai::knowledge", path = %path.display(), error = %e, "Failed to read training file"),
            }
        }
        tracing::info!(target: "beeai::knowledge", "Using built-in training examples");
        Self::builtin()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Top `limit` examples with a positive keyword score, best first. Ties keep file order.
    pub fn relevant(&self, question: &str, limit: usize) -> Vec<&TrainingExample> {
        let lowered = fold_case(question);
        let expanded = expand_keywords(&lowered);
        let keywords: Vec<&str> = expanded.iter().copied().collect();
        let mut scored: Vec<(usize, &TrainingExample)> = self
            .examples
            .iter()
            .map(|e| (e.score(&keywords), e))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

/// Whitespace-split keywords plus their related terms, deduplicated.
fn expand_keywords(lowered: &str) -> BTreeSet<&str> {
    let mut keywords: BTreeSet<&str> = lowered.split_whitespace().collect();
    for word in lowered.split_whitespace() {
        if let Some((_, related)) = KEYWORD_EXPANSIONS.iter().find(|(k, _)| *k == word) {
            keywords.extend(related.iter().copied());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_relevant_orders_by_score() {
        let store = ExampleStore::builtin();
        let hits = store.relevant("wild garlic Germany", RELEVANT_EXAMPLE_LIMIT);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].question(), "When does wild garlic bloom in Germany?");
    }

    #[test]
    fn test_relevant_respects_limit_and_drops_zero_scores() {
        let store = ExampleStore::new(vec![
            TrainingExample::new("clover", "Spring."),
            TrainingExample::new("clover clover", "May."),
            TrainingExample::new("heather", "August."),
        ]);
        assert_eq!(store.relevant("clover", 1).len(), 1);
        assert_eq!(store.relevant("clover", 5).len(), 2);
        assert!(store.relevant("zzz", 5).is_empty());
        assert!(store.relevant("", 5).is_empty());
    }

    #[test]
    fn test_related_terms_find_examples() {
        let store = ExampleStore::new(vec![
            TrainingExample::new("When does heather flower?", "Flowering starts in August."),
            TrainingExample::new("Rain forecast?", "Tomorrow."),
        ]);
        let hits = store.relevant("bloom", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].question(), "When does heather flower?");

        let keywords = expand_keywords("bees");
        assert!(keywords.contains("honeybee"));
        assert!(keywords.contains("bees"));
    }

    #[test]
    fn test_partial_word_matches_score_half_points() {
        let example = TrainingExample::new("Heather honey", "Dark.");
        assert_eq!(example.score(&["heathers"]), 1);
        // Short keywords only count as whole substrings.
        assert_eq!(example.score(&["hea"]), 6 + 2);
        assert_eq!(example.score(&["heather"]), 6 + 2 + 1);
    }

    #[test]
    fn test_partial_match_lifts_inflected_question() {
        let store = ExampleStore::new(vec![
            TrainingExample::new("Rain forecast?", "Tomorrow."),
            TrainingExample::new("Lavender", "July."),
        ]);
        let hits = store.relevant("Lavenders", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].answer(), "July.");
    }

    #[test]
    fn test_jsonl_skips_bad_lines() {
        let input = "{\"messages\":[{\"role\":\"user\",\"content\":\"Q1\"},{\"role\":\"assistant\",\"content\":\"A1\"}]}\n\nnot json\n";
        let store = ExampleStore::from_jsonl(input.as_bytes()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.relevant("q1", 3)[0].answer(), "A1");
    }

    #[test]
    fn test_load_first_picks_first_readable_file() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(
            file,
            "{}",
            serde_json::to_string(&TrainingExample::new("When does heather bloom?", "August.")).unwrap()
        )
        .unwrap();
        let store = ExampleStore::load_first(&[Path::new("./missing.jsonl"), file.path()]);
        assert_eq!(store.len(), 1);

        let fallback = ExampleStore::load_first::<&Path>(&[]);
        assert_eq!(fallback.len(), ExampleStore::builtin().len());
    }
}
