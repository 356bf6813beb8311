//! Text normalization shared by the locator, the rule engine and the validator.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const COMBINING_TILDE: char = '\u{0303}';

/// Fold text for keyword comparison: trim, decompose, drop combining marks and lowercase.
///
/// `"  Vía Pública "` and `"via publica"` fold to the same string. The `ñ` is
/// a letter of its own and survives: `"Riña"` folds to `"riña"`, never `"rina"`.
pub fn fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut chars = text.trim().nfd().peekable();
    while let Some(c) = chars.next() {
        if is_combining_mark(c) {
            continue;
        }
        if matches!(c, 'n' | 'N') && chars.peek() == Some(&COMBINING_TILDE) {
            chars.next();
            folded.push('ñ');
            continue;
        }
        folded.extend(c.to_lowercase());
    }
    folded
}

/// Collapse runs of whitespace into single spaces after folding.
pub fn fold_compact(text: &str) -> String {
    fold(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
