//! Turns free-text vision-model output into a `HerbIdentity`.
//!
//! The common name comes from an ordered cascade of pure strategies; the
//! first one that yields a candidate wins and sets the heuristic confidence.
//! Scientific name, Sanskrit name, explicit confidence and Ayurvedic
//! properties are read independently from labeled lines.

use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::sanitize_extracted;
use crate::models::{slugify, HerbIdentity, HerbName, UNKNOWN_HERB};

/// Confidence when no strategy matched.
pub const DEFAULT_CONFIDENCE: u8 = 70;
const LABELED_CONFIDENCE: u8 = 85;
const NATURAL_LANGUAGE_CONFIDENCE: u8 = 75;
const CAPITALIZED_CONFIDENCE: u8 = 65;

/// Words that are never a herb name on their own.
const STOP_WORDS: &[&str] = &[
    "the", "an", "a", "this", "that", "image", "picture", "photo", "not", "rather", "but",
    "however",
];

/// Capitalized words that open sentences or labels in model output.
const CAPITALIZED_DENYLIST: &[&str] = &[
    "Image",
    "Please",
    "However",
    "Unfortunately",
    "Description",
    "Scientific",
    "Name",
    "Based",
    "Looking",
];

/// Leading words dropped from a natural-language candidate.
const LEADING_ARTICLES: &[&str] = &["a", "an", "the", "some"];

/// Trailing words dropped from any candidate phrase.
const TRAILING_CONNECTORS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "which", "that", "with", "and", "or", "in", "on", "of",
    "from", "for", "used", "to", "as", "it", "its",
];

// ──────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────

static LABELED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:ITEM|HERB)[ \t]+NAME[ \t]*:[ \t]*([^\r\n]+)").unwrap()
});

static LABELED_SCIENTIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SCIENTIFIC[ \t]+NAME[ \t]*:[ \t]*([^\r\n]+)").unwrap()
});

static LABELED_SANSKRIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SANSKRIT[ \t]+NAME[ \t]*:[ \t]*([^\r\n]+)").unwrap()
});

static LABELED_CONFIDENCE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CONFIDENCE[ \t]*:[ \t*]*(\d+)").unwrap());

static LABELED_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)AYURVEDIC[ \t]+PROPERTIES[ \t]*:[ \t]*([^\r\n]+)").unwrap()
});

/// Binomial in parentheses: "(Curcuma longa)", also "(Ocimum Sanctum)".
static PARENTHESIZED_BINOMIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z][a-z]+[ \t]+[A-Za-z][a-z]+)\)").unwrap());

/// Descriptive phrases, in priority order. Each captures up to three words.
static NATURAL_LANGUAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:jar|bottle|container)[ \t]+of[ \t]+([a-z]+(?:[ \t]+[a-z]+){0,2})")
            .unwrap(),
        Regex::new(
            r"(?i)\b(?:this[ \t]+is|appears[ \t]+to[ \t]+be|looks[ \t]+like|identified[ \t]+as)[ \t]+([a-z]+(?:[ \t]+[a-z]+){0,2})",
        )
        .unwrap(),
        Regex::new(r"(?i)\b(?:see|seeing|image[ \t]+shows)[ \t]+([a-z]+(?:[ \t]+[a-z]+){0,2})")
            .unwrap(),
    ]
});

static CAPITALIZED_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[a-z]+)?\b").unwrap());

// ──────────────────────────────────────────────
// Name strategies
// ──────────────────────────────────────────────

/// A possible common name and the confidence its strategy carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub confidence: u8,
}

pub type NameStrategy = fn(&str) -> Option<Candidate>;

/// Strategies in priority order; first `Some` wins.
pub const NAME_STRATEGIES: [(&str, NameStrategy); 3] = [
    ("labeled_field", labeled_field),
    ("natural_language", natural_language),
    ("capitalized_token", capitalized_token),
];

/// `HERB NAME: X` or `ITEM NAME: X`.
pub fn labeled_field(text: &str) -> Option<Candidate> {
    let name = labeled_value(&LABELED_NAME, text)?;
    Some(Candidate {
        name,
        confidence: LABELED_CONFIDENCE,
    })
}

/// "jar of X", "appears to be X", "image shows X" and siblings.
pub fn natural_language(text: &str) -> Option<Candidate> {
    NATURAL_LANGUAGE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .find_map(|m| clean_phrase(m.as_str()))
        .map(|name| Candidate {
            name,
            confidence: NATURAL_LANGUAGE_CONFIDENCE,
        })
}

/// First capitalized word (plus an optional lower-case follower) that is
/// neither denylisted, a stop-word, nor shorter than four characters.
pub fn capitalized_token(text: &str) -> Option<Candidate> {
    CAPITALIZED_SEQUENCE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|phrase| {
            let first = phrase.split_whitespace().next().unwrap_or_default();
            first.chars().count() >= 4
                && !CAPITALIZED_DENYLIST.contains(&first)
                && !is_stop_word(first)
        })
        .find_map(trim_trailing_connectors)
        .map(|name| Candidate {
            name,
            confidence: CAPITALIZED_CONFIDENCE,
        })
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word.to_lowercase().as_str())
}

/// Normalize a natural-language capture; `None` if nothing usable remains.
fn clean_phrase(raw: &str) -> Option<String> {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while words
        .first()
        .is_some_and(|w| LEADING_ARTICLES.contains(&w.to_lowercase().as_str()))
    {
        words.remove(0);
    }
    let first = *words.first()?;
    if is_stop_word(first) {
        return None;
    }

    let name = trim_trailing_connectors(&words.join(" "))?;
    (name.chars().count() > 2).then_some(name)
}

fn trim_trailing_connectors(phrase: &str) -> Option<String> {
    let mut words: Vec<&str> = phrase.split_whitespace().collect();
    while words
        .last()
        .is_some_and(|w| TRAILING_CONNECTORS.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }
    let name = sanitize_extracted(&words.join(" "));
    (!name.is_empty()).then_some(name)
}

// ──────────────────────────────────────────────
// Independent fields
// ──────────────────────────────────────────────

fn labeled_value(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| sanitize_extracted(m.as_str()))
        .find(|v| !v.is_empty())
}

/// `SCIENTIFIC NAME:` line, else a parenthesized binomial, else empty.
pub fn extract_scientific_name(text: &str) -> String {
    labeled_value(&LABELED_SCIENTIFIC, text)
        .or_else(|| {
            PARENTHESIZED_BINOMIAL
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| sanitize_extracted(m.as_str()))
        })
        .unwrap_or_default()
}

/// Explicit `CONFIDENCE: <int>`, clamped to 100.
pub fn extract_confidence(text: &str) -> Option<u8> {
    let digits = LABELED_CONFIDENCE_VALUE.captures(text)?.get(1)?.as_str();
    digits.parse::<u64>().ok().map(|v| v.min(100) as u8)
}

// ──────────────────────────────────────────────
// Entry point
// ──────────────────────────────────────────────

/// Extract a herb identity from raw model text. Never fails.
///
/// `ai_metadata` is left empty for the calling stage to fill in.
pub fn extract_identity(raw_text: &str) -> HerbIdentity {
    let (common, heuristic_confidence) = NAME_STRATEGIES
        .iter()
        .find_map(|(label, strategy)| {
            strategy(raw_text).inspect(|c| {
                tracing::debug!(strategy = label, confidence = c.confidence, "Herb name candidate found");
            })
        })
        .map(|c| (c.name, c.confidence))
        .unwrap_or_else(|| {
            tracing::debug!("No herb name candidate, using default");
            (UNKNOWN_HERB.to_string(), DEFAULT_CONFIDENCE)
        });

    let confidence = extract_confidence(raw_text).unwrap_or(heuristic_confidence);

    HerbIdentity {
        generated_id: slugify(&common),
        name: HerbName {
            common,
            scientific: extract_scientific_name(raw_text),
            sanskrit: labeled_value(&LABELED_SANSKRIT, raw_text).unwrap_or_default(),
        },
        confidence,
        description: raw_text.to_string(),
        properties: labeled_value(&LABELED_PROPERTIES, raw_text).unwrap_or_default(),
        alternative_matches: Vec::new(),
        ai_metadata: None,
    }
}
