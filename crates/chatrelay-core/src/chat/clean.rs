//! Response cleaning.
//!
//! Models occasionally repeat themselves verbatim: the same paragraph twice in
//! a row, or the whole answer doubled. `clean` strips both patterns and trims
//! the result. It is pure and never fails.

/// Returned when the provider produced no text at all.
pub const FALLBACK_RESPONSE: &str = "no response available.";

/// Paragraph separator used for splitting and rejoining.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Normalize raw model output.
///
/// 1. Empty or absent input yields [`FALLBACK_RESPONSE`].
/// 2. Runs of adjacent identical paragraphs collapse to one. Non-adjacent
///    repeats are kept.
/// 3. If the text is exactly two copies of the same string, only the first
///    copy is kept (checked once, not recursively).
/// 4. Leading and trailing whitespace is trimmed.
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return FALLBACK_RESPONSE.to_string();
    };

    let mut paragraphs: Vec<&str> = Vec::new();
    for paragraph in text.split(PARAGRAPH_BREAK) {
        if paragraphs.last() != Some(&paragraph) {
            paragraphs.push(paragraph);
        }
    }
    let joined = paragraphs.join(PARAGRAPH_BREAK);

    halve_if_doubled(&joined).trim().to_string()
}

/// Keep the first half when both halves match character-for-character.
///
/// Halves are measured in characters, not bytes, so multi-byte text splits
/// on a char boundary.
fn halve_if_doubled(text: &str) -> &str {
    let char_len = text.chars().count();
    if char_len < 2 {
        return text;
    }

    let mid = text
        .char_indices()
        .nth(char_len / 2)
        .map_or(text.len(), |(idx, _)| idx);
    let (first, second) = text.split_at(mid);

    if first == second { first } else { text }
}
