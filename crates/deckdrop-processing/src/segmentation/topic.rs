use regex::Regex;
use std::sync::LazyLock;

use super::text::derive_title;
use super::Draft;

/// Lines at or above this length are never headings.
const MAX_HEADING_CHARS: usize = 100;

static CAPITALIZED_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][^.!?]*$").expect("valid heading regex"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid numbered-item regex"));

pub(crate) fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.chars().count() >= MAX_HEADING_CHARS {
        return false;
    }

    line.ends_with(':')
        || CAPITALIZED_PHRASE.is_match(line)
        || NUMBERED_ITEM.is_match(line)
        || is_all_caps(line)
}

fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && !line.chars().any(char::is_lowercase)
}

struct Topic {
    heading: Option<String>,
    lines: Vec<String>,
}

impl Topic {
    fn into_draft(self) -> Option<Draft> {
        let body = self.lines.join("\n");
        match self.heading {
            Some(heading) => {
                let stripped = heading.trim_end_matches(':').trim().to_string();
                let title = if !stripped.is_empty() {
                    stripped
                } else if !body.is_empty() {
                    derive_title(&body)
                } else {
                    heading.clone()
                };
                let body = if body.is_empty() { heading } else { body };
                Some(Draft {
                    title,
                    body,
                    keyword: None,
                })
            }
            // Content ahead of the first heading
            None if !body.is_empty() => Some(Draft {
                title: derive_title(&body),
                body,
                keyword: None,
            }),
            None => None,
        }
    }
}

/// Group lines under detected headings.
///
/// Returns `None` when the text has no heading at all so the caller can fall back
/// to paragraph segmentation.
pub(crate) fn drafts(text: &str) -> Option<Vec<Draft>> {
    let mut topics = Vec::new();
    let mut current = Topic {
        heading: None,
        lines: Vec::new(),
    };
    let mut headings = 0usize;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_heading(line) {
            headings += 1;
            let previous = std::mem::replace(
                &mut current,
                Topic {
                    heading: Some(line.to_string()),
                    lines: Vec::new(),
                },
            );
            topics.push(previous);
        } else {
            current.lines.push(line.to_string());
        }
    }
    topics.push(current);

    if headings == 0 {
        return None;
    }

    let drafts: Vec<Draft> = topics.into_iter().filter_map(Topic::into_draft).collect();
    (!drafts.is_empty()).then_some(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_rules() {
        assert!(is_heading("Overview:"));
        assert!(is_heading("Market Landscape"));
        assert!(is_heading("3. risks and mitigations"));
        assert!(is_heading("KEY TAKEAWAYS"));
        assert!(!is_heading("AI is transforming industries."));
        assert!(!is_heading("lowercase start without colon"));
        assert!(!is_heading(&format!("A{}", "b".repeat(120))));
    }

    #[test]
    fn lines_group_under_headings() {
        let text = "Intro\n\nAI is transforming industries.\n\nConclusion\n\nThanks for reading.";
        let drafts = drafts(text).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "Intro");
        assert_eq!(drafts[0].body, "AI is transforming industries.");
        assert_eq!(drafts[1].title, "Conclusion");
        assert_eq!(drafts[1].body, "Thanks for reading.");
    }

    #[test]
    fn preamble_and_trailing_colon() {
        let text = "this deck was generated automatically.\nBackground:\nthe team grew quickly.\nit doubled in size.";
        let drafts = drafts(text).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "this deck was generated automatically");
        assert_eq!(drafts[1].title, "Background");
        assert_eq!(drafts[1].body, "the team grew quickly.\nit doubled in size.");
    }

    #[test]
    fn heading_without_body_keeps_its_own_slide() {
        let drafts = drafts("AGENDA\nNEXT STEPS").unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].title, "NEXT STEPS");
        assert_eq!(drafts[1].body, "NEXT STEPS");
    }

    #[test]
    fn no_headings_signals_fallback() {
        assert!(drafts("just some prose.\nmore prose here.").is_none());
    }
}
