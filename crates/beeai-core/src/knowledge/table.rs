//! Advisory table: `country → plant → text` plus `general → topic → text` and generic sentences.
//!
//! The table is plain data. The built-in copy is compiled in; a JSON file with the shape of
//! [`TableData`] may replace it at start-up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Reserved country key holding topic-keyed advisories.
pub const GENERAL_KEY: &str = "general";

/// A keyword with optional aliases. Matching any term selects `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Keyword {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// True when `lowered` contains the name or one of the aliases. Caller case-folds `lowered`.
    pub fn matches(&self, lowered: &str) -> bool {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|term| !term.is_empty() && lowered.contains(term.as_str()))
    }

    fn normalized(&self) -> Self {
        Self {
            name: normalize(&self.name),
            aliases: self
                .aliases
                .iter()
                .map(|a| normalize(a))
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantAdvisory {
    pub country: String,
    pub plant: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAdvisory {
    pub topic: String,
    pub text: String,
}

/// Serializable shape of a knowledge table. Keyword order is match order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub countries: Vec<Keyword>,
    pub plants: Vec<Keyword>,
    pub topics: Vec<Keyword>,
    #[serde(default)]
    pub advisories: Vec<PlantAdvisory>,
    #[serde(default)]
    pub general: Vec<TopicAdvisory>,
    pub generic: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse table file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generic response list is empty")]
    EmptyGeneric,
    #[error("empty {0} keyword")]
    EmptyKeyword(&'static str),
    #[error("country keyword '{0}' is reserved")]
    ReservedCountry(String),
    #[error("advisory references unknown {kind} '{name}'")]
    UnknownKeyword { kind: &'static str, name: String },
    #[error("advisory text for '{0}' is empty")]
    EmptyAdvisory(String),
}

/// Immutable lookup table built once at start-up.
#[derive(Debug, Clone)]
pub struct KnowledgeTable {
    countries: Vec<Keyword>,
    plants: Vec<Keyword>,
    topics: Vec<Keyword>,
    entries: HashMap<String, HashMap<String, String>>,
    generic: Vec<String>,
}

impl KnowledgeTable {
    /// The compiled-in table.
    pub fn builtin() -> Self {
        Self::assemble(builtin_data())
    }

    /// Validates and builds a table from data.
    pub fn from_data(data: TableData) -> Result<Self, TableError> {
        validate(&data)?;
        Ok(Self::assemble(data))
    }

    pub fn try_load_json_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let data: TableData = serde_json::from_str(&raw)?;
        Self::from_data(data)
    }

    /// Loads a table file, falling back to the built-in table on any error.
    pub fn load_json_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_json_path(path) {
            Ok(table) => {
                tracing::info!(
                    target: "beeai::knowledge",
                    path = %path.display(),
                    advisories = table.advisory_count(),
                    "Loaded knowledge table"
                );
                table
            }
            Err(e) => {
                tracing::warn!(
                    target: "beeai::knowledge",
                    path = %path.display(),
                    error = %e,
                    "Knowledge table not loaded, using built-in table"
                );
                Self::builtin()
            }
        }
    }

    fn assemble(data: TableData) -> Self {
        let mut entries: HashMap<String, HashMap<String, String>> = HashMap::new();
        for a in &data.advisories {
            entries
                .entry(normalize(&a.country))
                .or_default()
                .insert(normalize(&a.plant), a.text.clone());
        }
        let general = entries.entry(GENERAL_KEY.to_string()).or_default();
        for g in &data.general {
            general.insert(normalize(&g.topic), g.text.clone());
        }
        Self {
            countries: data.countries.iter().map(Keyword::normalized).collect(),
            plants: data.plants.iter().map(Keyword::normalized).collect(),
            topics: data.topics.iter().map(Keyword::normalized).collect(),
            entries,
            generic: data.generic,
        }
    }

    pub fn countries(&self) -> &[Keyword] {
        &self.countries
    }

    pub fn plants(&self) -> &[Keyword] {
        &self.plants
    }

    pub fn topics(&self) -> &[Keyword] {
        &self.topics
    }

    pub fn generic(&self) -> &[String] {
        &self.generic
    }

    pub fn advisory(&self, country: &str, plant: &str) -> Option<&str> {
        self.entries
            .get(country)
            .and_then(|plants| plants.get(plant))
            .map(String::as_str)
    }

    pub fn general_advisory(&self, topic: &str) -> Option<&str> {
        self.advisory(GENERAL_KEY, topic)
    }

    /// Number of keyed advisories, general topics included.
    pub fn advisory_count(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}

impl Default for KnowledgeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(s: &str) -> String {
    fold_case(s.trim())
}

/// Lowercases and folds the Turkish dotless/dotted `i` so `İ`, `I`, `ı` and `i` compare equal.
pub(crate) fn fold_case(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

fn validate(data: &TableData) -> Result<(), TableError> {
    if data.generic.iter().all(|s| s.trim().is_empty()) {
        return Err(TableError::EmptyGeneric);
    }
    for (kind, list) in [("country", &data.countries), ("plant", &data.plants), ("topic", &data.topics)] {
        if list.iter().any(|k| k.name.trim().is_empty()) {
            return Err(TableError::EmptyKeyword(kind));
        }
    }
    if let Some(k) = data.countries.iter().find(|k| normalize(&k.name) == GENERAL_KEY) {
        return Err(TableError::ReservedCountry(k.name.clone()));
    }
    let known = |list: &[Keyword], name: &str| list.iter().any(|k| normalize(&k.name) == normalize(name));
    for a in &data.advisories {
        if !known(&data.countries, &a.country) {
            return Err(TableError::UnknownKeyword { kind: "country", name: a.country.clone() });
        }
        if !known(&data.plants, &a.plant) {
            return Err(TableError::UnknownKeyword { kind: "plant", name: a.plant.clone() });
        }
        if a.text.trim().is_empty() {
            return Err(TableError::EmptyAdvisory(format!("{}/{}", a.country, a.plant)));
        }
    }
    for g in &data.general {
        if !known(&data.topics, &g.topic) {
            return Err(TableError::UnknownKeyword { kind: "topic", name: g.topic.clone() });
        }
        if g.text.trim().is_empty() {
            return Err(TableError::EmptyAdvisory(format!("{}/{}", GENERAL_KEY, g.topic)));
        }
    }
    Ok(())
}

const COUNTRIES: &[(&str, &[&str])] = &[
    ("germany", &["almanya", "deutschland", "alemania"]),
    ("spain", &["ispanya", "españa"]),
    ("france", &["fransa", "francia"]),
    ("italy", &["italya", "italia"]),
    ("turkey", &["türkiye", "turkiye"]),
];

const PLANTS: &[(&str, &[&str])] = &[
    ("wild garlic", &["yabani sarımsak", "ramsons", "bärlauch"]),
    ("rapeseed", &["canola", "kolza"]),
    ("clover", &["yonca", "trébol"]),
    ("sunflower", &["ayçiçeği", "girasol"]),
    ("lavender", &["lavanta", "lavanda"]),
    ("acacia", &["robinia", "akasya"]),
    ("linden", &["lime tree", "ıhlamur"]),
    ("heather", &["calluna"]),
    ("chestnut", &["kestane"]),
];

const TOPICS: &[(&str, &[&str])] = &[
    ("climate change", &["global warming", "iklim değişikliği"]),
    ("honey production", &["honey yield", "bal üretimi"]),
    ("bee health", &["varroa", "colony health"]),
    ("pollination", &["pollinate", "tozlaşma"]),
];

const ADVISORIES: &[(&str, &str, &str)] = &[
    (
        "germany",
        "wild garlic",
        "Wild garlic typically blooms from late March to early May in central Germany. Based on BloomWatch forecasts and GBIF 2025 records, you should move your hives in early April to align with peak nectar flow.",
    ),
    (
        "germany",
        "rapeseed",
        "Rapeseed fields in Germany flower from mid-April to mid-May. Place colonies at field edges before the first yellow blooms and extract promptly, since rapeseed honey crystallises within days.",
    ),
    (
        "germany",
        "linden",
        "Linden trees along German avenues bloom from mid-June to early July. The flow is strong but short, so add supers a week before the first blossoms open.",
    ),
    (
        "germany",
        "heather",
        "Heather on the Lüneburg Heath blooms from early August to mid-September. Move hives there in late July for the late-season heather harvest.",
    ),
    (
        "spain",
        "sunflower",
        "According to GBIF 2025 data, sunflowers in southern Spain reach full bloom between late June and August. Start honey collection in mid-July when nectar availability peaks.",
    ),
    (
        "spain",
        "clover",
        "In northern Spain, BloomWatch 2025 satellite data shows clover blooming from mid-April through June. Keep colonies strong through May to make the most of the flow.",
    ),
    (
        "spain",
        "lavender",
        "Lavender in central Spain blooms from late June to late July. Position hives near the fields in mid-June and harvest once the bloom fades.",
    ),
    (
        "france",
        "lavender",
        "Lavender in Provence flowers from mid-June to mid-August, peaking in July. Move colonies onto the plateaus in late June and harvest before the fields are cut.",
    ),
    (
        "france",
        "sunflower",
        "Sunflowers in south-western France bloom from early July to mid-August. Colonies placed at the start of July usually fill a super within three weeks.",
    ),
    (
        "france",
        "acacia",
        "Acacia (black locust) in France blooms for about ten days in May. Watch the buds closely and place hives just before the blossoms open.",
    ),
    (
        "italy",
        "chestnut",
        "Chestnut trees in the Italian Apennines bloom from mid-June to mid-July. Chestnut honey is dark and bitter, so harvest it separately from spring honeys.",
    ),
    (
        "italy",
        "acacia",
        "Acacia in northern Italy flowers from late April to mid-May depending on altitude. Start low in the Po valley and follow the bloom uphill.",
    ),
    (
        "italy",
        "sunflower",
        "Sunflowers in central Italy bloom from late June through July. Plan for a single strong flow and extract at the end of July.",
    ),
    (
        "turkey",
        "linden",
        "Linden in the Black Sea region of Turkey blooms from late May to early July. Place colonies near forest edges for a mild, fragrant honey.",
    ),
    (
        "turkey",
        "chestnut",
        "Chestnut in northern Turkey flowers through June and July. Expect a dark honey and keep colonies supplied with water during the summer heat.",
    ),
    (
        "turkey",
        "clover",
        "White clover in the Thracian pastures of Turkey blooms from May to July and gives a steady, light-coloured flow.",
    ),
];

const GENERAL: &[(&str, &str)] = &[
    (
        "climate change",
        "Climate change is shifting European bloom dates earlier by several days per decade. Track local flowering each season instead of relying on fixed calendars, and watch for forage gaps between early and late flows.",
    ),
    (
        "honey production",
        "Honey production depends on strong colonies arriving at the main flow. Build up populations six weeks before peak bloom and add supers as soon as nectar comes in.",
    ),
    (
        "bee health",
        "Healthy colonies need monthly varroa monitoring, clean comb and diverse forage. Treat mites right after the summer harvest so winter bees are raised mite-free.",
    ),
    (
        "pollination",
        "Bees pollinate most European fruit and oilseed crops. Place two to three colonies per hectare at the start of flowering for the best results.",
    ),
];

const GENERIC: &[&str] = &[
    "I can help with bloom times, forage plants and honey production across Europe. Which plant and country are you interested in?",
    "Bloom times in Europe vary with region and weather. Tell me the plant and the country and I will share what I know.",
    "I am answering from my offline notes right now. Try asking about a specific plant such as wild garlic, lavender or sunflower in a European country.",
    "Beekeeping questions are welcome! Mention a country like Germany or Spain and a plant like clover or linden for a precise answer.",
];

fn keywords(list: &[(&str, &[&str])]) -> Vec<Keyword> {
    list.iter().map(|(name, aliases)| Keyword::new(name, aliases)).collect()
}

fn builtin_data() -> TableData {
    TableData {
        countries: keywords(COUNTRIES),
        plants: keywords(PLANTS),
        topics: keywords(TOPICS),
        advisories: ADVISORIES
            .iter()
            .map(|(country, plant, text)| PlantAdvisory {
                country: country.to_string(),
                plant: plant.to_string(),
                text: text.to_string(),
            })
            .collect(),
        general: GENERAL
            .iter()
            .map(|(topic, text)| TopicAdvisory {
                topic: topic.to_string(),
                text: text.to_string(),
            })
            .collect(),
        generic: GENERIC.iter().map(|s| s.to_string()).collect(),
    }
}
