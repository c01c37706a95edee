//! Text helpers shared by the segmentation strategies

/// Titles at or above this many characters are shortened to words.
const MAX_SENTENCE_TITLE_CHARS: usize = 60;
const TITLE_WORDS: usize = 8;

/// Split on blank lines. Lines containing only whitespace count as blank.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    paragraphs
}

/// Split into sentences after `.`, `!` or `?`, keeping the terminator.
///
/// Fragments without any alphanumeric character (e.g. the tail of an ellipsis)
/// are dropped.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let collapsed = collapse_whitespace(raw);
    if collapsed.chars().any(char::is_alphanumeric) {
        sentences.push(collapsed);
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Derive a slide title from a segment body.
///
/// The first sentence (without its terminator) when it is shorter than 60
/// characters, otherwise the first 8 words followed by `...`. Never empty for a
/// body with any non-whitespace content.
pub fn derive_title(body: &str) -> String {
    let first_sentence = body
        .split(|c: char| matches!(c, '.' | '!' | '?'))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    if !first_sentence.is_empty() && first_sentence.chars().count() < MAX_SENTENCE_TITLE_CHARS {
        return first_sentence;
    }

    let words: Vec<&str> = body.split_whitespace().take(TITLE_WORDS).collect();
    if words.is_empty() {
        return String::new();
    }
    format!("{}...", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_whitespace_only_lines() {
        let text = "first line\nstill first\n   \nsecond\n\n\n\nthird\n";
        assert_eq!(
            split_paragraphs(text),
            vec!["first line\nstill first", "second", "third"]
        );
    }

    #[test]
    fn sentences_keep_terminators_and_drop_punctuation_runs() {
        let sentences = split_sentences("Wait... What?! Yes.\nNo trailing");
        assert_eq!(sentences, vec!["Wait.", "What?", "Yes.", "No trailing"]);
    }

    #[test]
    fn title_uses_short_first_sentence() {
        assert_eq!(derive_title("AI is transforming industries. More here."), "AI is transforming industries");
        assert_eq!(derive_title("Intro"), "Intro");
    }

    #[test]
    fn title_truncates_long_first_sentence_to_eight_words() {
        let body = "Large language models are reshaping how teams draft, review and publish long technical documents.";
        assert_eq!(
            derive_title(body),
            "Large language models are reshaping how teams draft,..."
        );
    }

    #[test]
    fn title_never_empty_for_punctuation_led_body() {
        assert_eq!(derive_title("... and then"), "and then");
        assert_eq!(derive_title("?!"), "?!...");
        assert!(!derive_title("   x   ").is_empty());
    }
}
