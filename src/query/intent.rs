//! Keyword intent classification and entity extraction.
//!
//! Works on the lowercased query text only; no model is involved.

use std::sync::LazyLock;

use regex::Regex;

use crate::data::RecordFilter;

static ROOM_FLAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-5])[\s-]?room\b").expect("room pattern is valid"));
static MULTI_GENERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bmulti[\s-]?gen(?:eration)?\b").expect("multi-gen pattern is valid"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(199\d|20\d{2})\b").expect("year pattern is valid"));

const TREND_KEYWORDS: [&str; 7] = [
    "trend",
    "trends",
    "over time",
    "over the years",
    "changed",
    "history",
    "historical",
];
const AVERAGE_KEYWORDS: [&str; 3] = ["average", "mean", "avg"];

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Mean resale price for some slice of the data
    AveragePrice,
    /// Price over time for some slice of the data
    PriceTrend,
    /// Nothing recognized
    Unknown,
}

/// A classified query with the entities found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Trimmed original text
    pub raw: String,
    /// Lowercased text with punctuation folded to spaces
    pub normalized: String,
    pub intent: Intent,
    pub flat_type: Option<String>,
    pub year: Option<i32>,
    pub town: Option<String>,
}

impl ParsedQuery {
    /// Equality filter built from the extracted entities.
    pub fn filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::new();
        if let Some(town) = &self.town {
            filter = filter.town(town);
        }
        if let Some(flat_type) = &self.flat_type {
            filter = filter.flat_type(flat_type);
        }
        if let Some(year) = self.year {
            filter = filter.year(year);
        }
        filter
    }

    pub fn has_entities(&self) -> bool {
        self.town.is_some() || self.flat_type.is_some() || self.year.is_some()
    }
}

/// Classify `query` and pull out flat type, year and town.
///
/// `known_towns` are the towns present in the loaded data; the longest one
/// contained in the query wins.
pub fn classify(query: &str, known_towns: &[String]) -> ParsedQuery {
    let raw = query.trim().to_string();
    let normalized = normalize(&raw);

    ParsedQuery {
        intent: detect_intent(&normalized),
        flat_type: extract_flat_type(&normalized),
        year: extract_year(&normalized),
        town: extract_town(&normalized, known_towns),
        raw,
        normalized,
    }
}

/// Lowercase, fold everything except letters, digits and `-` into single
/// spaces.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_intent(normalized: &str) -> Intent {
    if TREND_KEYWORDS.iter().any(|k| contains_word(normalized, k)) {
        return Intent::PriceTrend;
    }
    let asks_average = AVERAGE_KEYWORDS.iter().any(|k| contains_word(normalized, k)) && normalized.contains("price");
    if asks_average || contains_word(normalized, "how much") {
        return Intent::AveragePrice;
    }
    Intent::Unknown
}

fn extract_flat_type(normalized: &str) -> Option<String> {
    if let Some(caps) = ROOM_FLAT.captures(normalized) {
        return Some(format!("{} room", &caps[1]));
    }
    if contains_word(normalized, "executive") {
        return Some("executive".to_string());
    }
    if MULTI_GENERATION.is_match(normalized) {
        return Some("multi generation".to_string());
    }
    None
}

fn extract_year(normalized: &str) -> Option<i32> {
    YEAR.captures(normalized).and_then(|caps| caps[1].parse().ok())
}

fn extract_town(normalized: &str, known_towns: &[String]) -> Option<String> {
    let padded = format!(" {} ", normalized);
    known_towns
        .iter()
        .filter(|town| {
            let needle = normalize(town);
            !needle.is_empty() && padded.contains(&format!(" {} ", needle))
        })
        .max_by_key(|town| town.len())
        .cloned()
}

/// Whole-word (or whole-phrase) match on normalized text.
fn contains_word(text: &str, word: &str) -> bool {
    format!(" {} ", text).contains(&format!(" {} ", word))
}
