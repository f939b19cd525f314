use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Paragraph boundary: one or more blank lines.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").unwrap());

/// Keywords that locate one concern in free-text remedy output, and the
/// longest excerpt kept for it.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub keywords: &'static [&'static str],
    pub max_len: usize,
}

pub const PREPARATION: SectionRule = SectionRule {
    keywords: &["preparation", "method", "prepare"],
    max_len: 150,
};

pub const DOSAGE: SectionRule = SectionRule {
    keywords: &["dosage", "administration", "take"],
    max_len: 100,
};

pub const DIETARY: SectionRule = SectionRule {
    keywords: &["diet", "food", "avoid", "include"],
    max_len: 100,
};

pub const PRECAUTIONS: SectionRule = SectionRule {
    keywords: &["precaution", "contraindication", "side effect", "avoid"],
    max_len: 100,
};

pub const TIMELINE: SectionRule = SectionRule {
    keywords: &["result", "timeline", "expect", "improvement"],
    max_len: 80,
};

/// Excerpts of a generated remedy, one per concern. Empty when not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemedySections {
    pub preparation: String,
    pub dosage: String,
    pub dietary: String,
    pub precautions: String,
    pub timeline: String,
}

pub fn extract_sections(text: &str) -> RemedySections {
    RemedySections {
        preparation: extract_section(text, &PREPARATION),
        dosage: extract_section(text, &DOSAGE),
        dietary: extract_section(text, &DIETARY),
        precautions: extract_section(text, &PRECAUTIONS),
        timeline: extract_section(text, &TIMELINE),
    }
}

/// Excerpt for one concern, truncated to `max_len` characters plus `...`.
///
/// Keywords are tried in priority order; the first paragraph containing the
/// earliest matching keyword (case-insensitive) wins. A later paragraph that
/// names the section outranks an earlier one that only mentions a weaker
/// keyword in passing.
pub fn extract_section(text: &str, rule: &SectionRule) -> String {
    let paragraphs: Vec<(&str, String)> = PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| (p, p.to_lowercase()))
        .collect();

    rule.keywords
        .iter()
        .find_map(|keyword| {
            paragraphs
                .iter()
                .find(|(_, lower)| lower.contains(keyword))
        })
        .map(|(p, _)| truncate_chars(p, rule.max_len))
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REMEDY: &str = "\
**Primary Preparation Method:**
Boil 1 tsp of turmeric powder in a cup of milk.

**Dosage & Administration:**
Take twice daily after meals.

**Dietary Recommendations:**
Favor warm, light food.

**Precautions & Contraindications:**
Not advised during pregnancy.

**Expected Results:**
Improvement within 1-2 weeks.";

    #[test]
    fn extracts_each_concern() {
        let sections = extract_sections(REMEDY);
        assert!(sections.preparation.contains("Boil 1 tsp"));
        assert!(sections.dosage.contains("twice daily"));
        assert!(sections.dietary.contains("warm, light food"));
        assert!(sections.precautions.contains("pregnancy"));
        assert!(sections.timeline.contains("1-2 weeks"));
    }

    #[test]
    fn earlier_keyword_outranks_text_order() {
        let text = "First avoid cold drinks.\n\nDiet: eat rice.";
        assert_eq!(extract_section(text, &DIETARY), "Diet: eat rice.");
    }

    #[test]
    fn same_keyword_takes_first_paragraph() {
        let text = "Take with honey.\n\nTake before bed.";
        assert_eq!(extract_section(text, &DOSAGE), "Take with honey.");
    }

    #[test]
    fn passing_mentions_do_not_steal_sections() {
        let text = "\
**1. Primary Preparation Method:**
Boil 1 tsp of ginger in water, take it off the flame after 5 minutes.

**2. Dosage & Administration:**
One cup twice daily.

**4. Dietary Recommendations:**
Include warm soups. Avoid cold drinks.

**5. Precautions & Contraindications:**
Not for people with ulcers.

**6. Expected Results:**
Relief within a week.";

        let sections = extract_sections(text);
        assert!(sections.preparation.contains("Boil 1 tsp"));
        assert!(sections.dosage.contains("One cup twice daily"));
        assert!(sections.dietary.contains("warm soups"));
        assert!(sections.precautions.contains("ulcers"));
        assert!(sections.timeline.contains("within a week"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(
            extract_section("PRECAUTION: none known", &PRECAUTIONS),
            "PRECAUTION: none known"
        );
    }

    #[test]
    fn no_keyword_gives_empty() {
        assert_eq!(extract_section("Drink water.\n\nSleep well.", &DOSAGE), "");
        assert_eq!(extract_section("", &TIMELINE), "");
    }

    #[test]
    fn long_paragraph_truncated_with_ellipsis() {
        let paragraph = format!("Dosage {}", "x".repeat(200));
        let excerpt = extract_section(&paragraph, &DOSAGE);
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.starts_with("Dosage xx"));
    }

    #[test]
    fn exact_length_is_not_truncated() {
        let paragraph = format!("result{}", "y".repeat(74));
        assert_eq!(paragraph.chars().count(), 80);
        assert_eq!(extract_section(&paragraph, &TIMELINE), paragraph);
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let paragraph = format!("take {}", "हल्दी".repeat(40));
        let excerpt = extract_section(&paragraph, &DOSAGE);
        assert_eq!(excerpt.chars().count(), 103);
    }

    #[test]
    fn windows_line_endings_split_paragraphs() {
        let text = "Rest well.\r\n\r\nTake with honey.";
        assert_eq!(extract_section(text, &DOSAGE), "Take with honey.");
    }
}
