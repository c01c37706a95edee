use super::text::{derive_title, split_paragraphs};
use super::Draft;

/// One draft per blank-line separated paragraph.
pub(crate) fn drafts(text: &str) -> Vec<Draft> {
    split_paragraphs(text)
        .into_iter()
        .map(|body| Draft {
            title: derive_title(&body),
            body,
            keyword: None,
        })
        .collect()
}
