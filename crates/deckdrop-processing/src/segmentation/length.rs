use super::text::derive_title;
use super::Draft;

/// Smallest chunk, so short inputs stay on a few slides.
const MIN_CHUNK_WORDS: usize = 50;
/// Target number of chunks for long inputs.
const TARGET_CHUNKS: usize = 8;

pub(crate) fn chunk_size(total_words: usize) -> usize {
    MIN_CHUNK_WORDS.max(total_words / TARGET_CHUNKS)
}

/// Fixed-size word chunks; at most 9 for any input.
pub(crate) fn drafts(text: &str) -> Vec<Draft> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let size = chunk_size(words.len());

    words
        .chunks(size)
        .map(|chunk| {
            let body = chunk.join(" ");
            Draft {
                title: derive_title(&body),
                body,
                keyword: None,
            }
        })
        .collect()
}
