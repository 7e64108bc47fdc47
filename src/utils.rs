//! Utility functions.

use std::cmp::min; // comparison helpers
use std::path::PathBuf;
use unicode_width::UnicodeWidthChar;

/// Convert a "character index" to a "byte index" in a UTF‑8 string.
///
/// All offsets handed around by the suggestion engine are char indices; slicing needs bytes.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(bi, _)| bi)
}

/// Convert a byte offset back into a character index.
pub fn byte_to_char_index(s: &str, byte_idx: usize) -> usize {
    let mut b = min(byte_idx, s.len());
    while !s.is_char_boundary(b) {
        b -= 1;
    }
    s[..b].chars().count()
}

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    s.chars().map(|ch| UnicodeWidthChar::width(ch).unwrap_or(1)).sum()
}

/// Cut `s` down to at most `width` terminal columns.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(1);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Get the default directories searched for `fpad.toml`.
///
/// Returns:
/// - the current working directory
/// - the directory containing the executable
pub fn default_config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== char_to_byte_index tests ====================

    #[test]
    fn char_to_byte_ascii() {
        let s = "hello";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 5), 5);
    }

    #[test]
    fn char_to_byte_unicode() {
        // 'é' is 2 bytes in UTF-8
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 4), 5);
    }

    #[test]
    fn char_to_byte_beyond_end() {
        assert_eq!(char_to_byte_index("abc", 10), 3);
        assert_eq!(char_to_byte_index("", 5), 0);
    }

    // ==================== byte_to_char_index tests ====================

    #[test]
    fn byte_to_char_unicode() {
        let s = "héllo";
        assert_eq!(byte_to_char_index(s, 0), 0);
        assert_eq!(byte_to_char_index(s, 1), 1);
        assert_eq!(byte_to_char_index(s, 3), 2);
    }

    #[test]
    fn byte_to_char_inside_a_char_rounds_down() {
        // byte 2 is the middle of 'é'
        assert_eq!(byte_to_char_index("héllo", 2), 1);
    }

    #[test]
    fn byte_to_char_beyond_end() {
        assert_eq!(byte_to_char_index("abc", 100), 3);
    }

    // ==================== width tests ====================

    #[test]
    fn width_counts_wide_chars_twice() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn truncate_respects_wide_chars() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("ab", 10), "ab");
    }
}
