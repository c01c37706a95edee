use std::collections::HashMap;

use super::text::split_sentences;
use super::Draft;

const MAX_CANDIDATES: usize = 10;
const MAX_KEYWORD_SEGMENTS: usize = 6;
/// Tokens this short or shorter are never keywords.
const MAX_IGNORED_TOKEN_CHARS: usize = 3;

/// Stop words longer than three characters; shorter tokens are dropped anyway.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "because", "been", "before", "being",
    "below", "between", "both", "could", "does", "doing", "down", "during", "each", "from",
    "further", "have", "having", "here", "into", "itself", "just", "more", "most", "much",
    "once", "only", "other", "ours", "over", "same", "should", "some", "such", "than", "that",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "under", "until", "very", "were", "what", "when", "where", "which", "while",
    "will", "with", "would", "your", "yours", "yourself",
];

/// Most frequent non-stop-word tokens, ties in first-seen order.
pub(crate) fn extract_keywords(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    let mut order: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for token in normalized.split_whitespace() {
        if token.chars().count() <= MAX_IGNORED_TOKEN_CHARS || STOP_WORDS.contains(&token) {
            continue;
        }
        match positions.get(token) {
            Some(&pos) => order[pos].1 += 1,
            None => {
                positions.insert(token.to_string(), order.len());
                order.push((token.to_string(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(word, _)| word)
        .collect()
}

/// One draft per top keyword, gathering every sentence that mentions it.
///
/// Keywords found in no sentence (say `cats` from "cat's") are skipped before
/// the cap, so they never cost a slot. Returns `None` when no keyword matched any sentence so the caller can fall back
/// to paragraph segmentation.
pub(crate) fn drafts(text: &str) -> Option<Vec<Draft>> {
    let sentences = split_sentences(text);
    let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();

    let drafts: Vec<Draft> = extract_keywords(text)
        .into_iter()
        .filter_map(|keyword| {
            let matching: Vec<&str> = sentences
                .iter()
                .zip(&lowered)
                .filter(|(_, lower)| lower.contains(&keyword))
                .map(|(sentence, _)| sentence.as_str())
                .collect();
            if matching.is_empty() {
                return None;
            }
            Some(Draft {
                title: format!("About {}", keyword),
                body: matching.join(" "),
                keyword: Some(keyword),
            })
        })
        .take(MAX_KEYWORD_SEGMENTS)
        .collect();

    (!drafts.is_empty()).then_some(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_then_first_seen() {
        let text = "Rust compilers love Rust. Borrow checkers guard memory. Memory safety matters. Compilers compile.";
        let keywords = extract_keywords(text);
        assert_eq!(keywords[0], "rust");
        assert_eq!(keywords[1], "compilers");
        assert_eq!(keywords[2], "memory");
        assert_eq!(keywords[3], "love");
    }

    #[test]
    fn drops_short_tokens_stop_words_and_punctuation() {
        let keywords = extract_keywords("The cat, which was there, sat. Cat's whiskers!");
        assert_eq!(keywords, vec!["cats", "whiskers"]);
    }

    #[test]
    fn caps_candidates_at_ten() {
        let text = (0..20)
            .map(|i| format!("keyword{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_keywords(&text).len(), 10);
    }

    #[test]
    fn gathers_sentences_per_keyword() {
        let text = "Solar output rises in summer. Wind output peaks in winter. Storage smooths solar variability.";
        let drafts = drafts(text).unwrap();
        assert!(drafts.len() <= 6);
        assert_eq!(drafts[0].title, "About solar");
        assert_eq!(
            drafts[0].body,
            "Solar output rises in summer. Storage smooths solar variability."
        );
        assert_eq!(drafts[0].keyword.as_deref(), Some("solar"));
    }

    #[test]
    fn unmatched_keywords_do_not_take_slots() {
        let text = "Cat's naps. Cat's meals. Cat's purrs. Alpha bravo charlie delta echo foxtrot.";
        assert_eq!(extract_keywords(text)[0], "cats");

        let drafts = drafts(text).unwrap();
        let keywords: Vec<_> = drafts.iter().filter_map(|d| d.keyword.as_deref()).collect();
        assert_eq!(
            keywords,
            vec!["naps", "meals", "purrs", "alpha", "bravo", "charlie"]
        );
    }

    #[test]
    fn no_keywords_signals_fallback() {
        assert!(drafts("a an of to in on at by").is_none());
    }
}
