//! Reading time estimate

use super::ContentBlock;

/// Average reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words; leading, trailing and repeated
/// whitespace produce no empty words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Text read for the estimate: each heading followed directly by its body
pub fn content_text(content: &[ContentBlock]) -> String {
    let mut text = String::new();
    for block in content {
        text.push_str(&block.heading);
        text.push_str(&block.body.as_text());
    }
    text
}

/// Words in the concatenated headings and bodies
pub fn content_words(content: &[ContentBlock]) -> usize {
    count_words(&content_text(content))
}

/// Minutes needed to read `content` at [`WORDS_PER_MINUTE`], rounded up
pub fn estimate(content: &[ContentBlock]) -> usize {
    estimate_with(content, WORDS_PER_MINUTE)
}

/// Minutes needed to read `content` at `words_per_minute`, rounded up
pub fn estimate_with(content: &[ContentBlock], words_per_minute: usize) -> usize {
    content_words(content).div_ceil(words_per_minute.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichText;
    use serde_json::json;

    fn block(heading: &str, body: &str) -> ContentBlock {
        let body: RichText = if body.is_empty() {
            RichText::default()
        } else {
            serde_json::from_value(json!([{ "type": "paragraph", "text": body, "spans": [] }]))
                .unwrap()
        };
        ContentBlock {
            heading: heading.to_string(),
            body,
        }
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(estimate(&[]), 0);
    }

    #[test]
    fn test_single_short_heading() {
        assert_eq!(estimate(&[block("a b c", "")]), 1);
    }

    #[test]
    fn test_surrounding_whitespace_is_not_a_word() {
        assert_eq!(count_words("  leading and trailing  "), 3);
        assert_eq!(count_words("\n\tword\n"), 1);
        assert_eq!(count_words("   "), 0);
        assert_eq!(content_words(&[block("  one", "  two three ")]), 3);
    }

    #[test]
    fn test_heading_runs_into_body() {
        // No separator is added between a heading and its body
        assert_eq!(content_text(&[block("a", "b")]), "ab");
        assert_eq!(content_words(&[block("a", "b")]), 1);
        assert_eq!(content_words(&[block("the end", "start here")]), 3);
        assert_eq!(content_words(&[block("the end ", "start here")]), 4);
    }

    #[test]
    fn test_blocks_run_into_each_other() {
        assert_eq!(content_words(&[block("one", "two"), block("three", "")]), 1);
        assert_eq!(content_words(&[block("one ", "two "), block("three", "")]), 3);
    }

    #[test]
    fn test_rounds_up() {
        let words = vec!["w"; 200].join(" ");
        assert_eq!(estimate(&[block("", &words)]), 1);
        assert_eq!(estimate(&[block("extra ", &words)]), 2);
    }

    #[test]
    fn test_monotonic_in_word_count() {
        let mut previous = 0;
        for n in [0usize, 1, 199, 200, 201, 399, 400, 401, 1000] {
            let text = vec!["w"; n].join(" ");
            let minutes = estimate(&[block("", &text)]);
            assert!(minutes >= previous, "{} words gave {} < {}", n, minutes, previous);
            previous = minutes;
        }
    }

    #[test]
    fn test_custom_speed() {
        let text = vec!["w"; 100].join(" ");
        assert_eq!(estimate_with(&[block("", &text)], 50), 2);
        assert_eq!(estimate_with(&[block("", &text)], 0), 100);
    }
}
