/// Characters dropped anywhere in an extracted value: brackets and
/// Markdown emphasis/markup markers.
const STRIPPED_CHARS: &[char] = &['[', ']', '{', '}', '*', '_', '`', '~', '#'];

/// Clean a value pulled out of model text.
///
/// Removes bracket and markup characters, then trims leading punctuation
/// and surrounding whitespace. `"** [Turmeric]"` becomes `"Turmeric"`.
pub fn sanitize_extracted(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    stripped
        .trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '-' | '.' | ',' | ';' | '•' | '>')
        })
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_emphasis() {
        assert_eq!(sanitize_extracted("**Turmeric**"), "Turmeric");
        assert_eq!(sanitize_extracted("_Curcuma longa_"), "Curcuma longa");
    }

    #[test]
    fn strips_brackets() {
        assert_eq!(sanitize_extracted("[Ashwagandha]"), "Ashwagandha");
    }

    #[test]
    fn trims_leading_punctuation() {
        assert_eq!(sanitize_extracted(": - Neem"), "Neem");
        assert_eq!(sanitize_extracted("** : Tulsi  "), "Tulsi");
    }

    #[test]
    fn keeps_inner_punctuation() {
        assert_eq!(
            sanitize_extracted("Rasa: Tikta, Katu; Virya: Ushna"),
            "Rasa: Tikta, Katu; Virya: Ushna"
        );
        assert_eq!(sanitize_extracted("Holy Basil (Tulsi)"), "Holy Basil (Tulsi)");
    }

    #[test]
    fn markup_only_becomes_empty() {
        assert_eq!(sanitize_extracted("** []"), "");
        assert_eq!(sanitize_extracted(""), "");
    }
}
