//! Word-boundary scanning: find the word under an offset and splice a value in its place.
//!
//! All offsets are char indices. A "word" is a maximal run of chars for which the
//! boundary predicate holds.

use std::ops::Range;

/// Default word predicate: anything that is not whitespace.
pub fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace()
}

/// Scan left from `i` while `pred` holds and return the first in-word index.
///
/// `None` when the char at `i` is not part of a word (or `i` is past the end).
pub fn start(text: &str, i: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    if !chars.get(i).is_some_and(|&c| pred(c)) {
        return None;
    }
    let mut s = i;
    while s > 0 && pred(chars[s - 1]) {
        s -= 1;
    }
    Some(s)
}

/// Scan right from `i` while `pred` holds and return one past the last in-word index.
pub fn end(text: &str, i: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    if !chars.get(i).is_some_and(|&c| pred(c)) {
        return None;
    }
    let mut e = i;
    while e < chars.len() && pred(chars[e]) {
        e += 1;
    }
    Some(e)
}

/// Char range of the word at `i`.
pub fn span(text: &str, i: usize, pred: impl Fn(char) -> bool) -> Option<Range<usize>> {
    let s = start(text, i, &pred)?;
    let e = end(text, i, &pred)?;
    Some(s..e)
}

/// The word at `i`, or an empty string when `i` sits on a boundary char.
pub fn word(text: &str, i: usize, pred: impl Fn(char) -> bool) -> String {
    match span(text, i, pred) {
        Some(r) => text.chars().skip(r.start).take(r.len()).collect(),
        None => String::new(),
    }
}

/// Result of [`replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub text: String,
    /// Char range the inserted value occupies in `text`; `None` if nothing was replaced.
    pub span: Option<Range<usize>>,
}

/// Replace the word at `i` with `value`.
///
/// If there is no word at `i` the text comes back unchanged.
pub fn replace(value: &str, text: &str, i: usize, pred: impl Fn(char) -> bool) -> Replacement {
    let Some(r) = span(text, i, pred) else {
        return Replacement { text: text.to_string(), span: None };
    };

    let mut out: String = text.chars().take(r.start).collect();
    out.push_str(value);
    out.extend(text.chars().skip(r.end));

    let inserted = r.start..r.start + value.chars().count();
    Replacement { text: out, span: Some(inserted) }
}
