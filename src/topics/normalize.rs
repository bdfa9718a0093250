// Text normalization — the first step of the topic pipeline.
//
// Review text arrives with emoji, punctuation, Jamo fragments ("ㅋㅋㅋ") and
// arbitrary whitespace. Everything outside the permitted alphabet becomes a
// separator, then whitespace is collapsed.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Runs of characters outside Hangul syllables, ASCII letters and digits.
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^가-힣a-zA-Z0-9]+").expect("static pattern is valid")
});

/// Normalize review text for tokenization.
///
/// The output contains only Hangul syllables, ASCII letters, ASCII digits and
/// single spaces, with no leading or trailing whitespace. Empty input yields
/// an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let replaced = DISALLOWED.replace_all(text, " ");
    collapse_whitespace(&replaced)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `c` survives normalization (space excluded).
pub fn is_permitted(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_emoji() {
        assert_eq!(normalize("정말 좋아요!!! 👍👍"), "정말 좋아요");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  너무\t\t느려요 \n  app v2  "), "너무 느려요 app v2");
    }

    #[test]
    fn test_jamo_is_removed() {
        // Compatibility Jamo are outside the syllable block
        assert_eq!(normalize("ㅋㅋㅋ 재밌다ㅎㅎ"), "재밌다");
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(normalize("좋다,빠르다"), "좋다 빠르다");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_output_alphabet() {
        let inputs = [
            "Hello, World! 123",
            "앱이   자꾸 꺼져요... 😡 (버전 3.2)",
            "\u{00A0}non\u{2003}breaking\u{3000}space",
            "émigré café — naïve",
        ];
        for input in inputs {
            let out = normalize(input);
            assert!(!out.contains("  "), "double space in {out:?}");
            assert_eq!(out.trim(), out);
            assert!(
                out.chars().all(|c| c == ' ' || is_permitted(c)),
                "unexpected character in {out:?}"
            );
        }
    }
}
