// ABOUTME: Bracket option tokens embedded in assistant text
// ABOUTME: Extracts `[...]` quick-choice labels and strips them from display text

use regex::Regex;

lazy_static::lazy_static! {
    static ref BRACKET_OPTION: Regex = Regex::new(r"\[([^\]]+)\]").expect("valid bracket pattern");
    static ref EXTRA_SPACES: Regex = Regex::new(r"[ \t]{2,}").expect("valid whitespace pattern");
}

/// Labels found inside square brackets, in order of appearance
pub fn extract_bracket_options(text: &str) -> Vec<String> {
    BRACKET_OPTION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Text with every bracket token removed
pub fn strip_bracket_options(text: &str) -> String {
    let stripped = BRACKET_OPTION.replace_all(text, "");
    let collapsed = EXTRA_SPACES.replace_all(&stripped, " ");

    collapsed
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_tokens_in_order() {
        assert_eq!(
            extract_bracket_options("고르세요 [A] [B] [C]"),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn test_strips_tokens_from_display_text() {
        assert_eq!(strip_bracket_options("고르세요 [A] [B] [C]"), "고르세요");
        assert_eq!(
            strip_bracket_options("어떤 고민이신가요?\n[연애/재회/궁합]\n[기타]"),
            "어떤 고민이신가요?"
        );
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        assert!(extract_bracket_options("그냥 질문입니다").is_empty());
        assert_eq!(strip_bracket_options("그냥 질문입니다"), "그냥 질문입니다");
    }

    #[test]
    fn test_empty_brackets_are_ignored() {
        assert!(extract_bracket_options("[] [ ]").is_empty());
    }
}
