//! The text input a suggestion box is attached to.
//!
//! `TextInput` is the small surface the suggestion box needs from an input element:
//! read/write the value, read/write the caret, and know where the caret is on screen.
//! `TextArea` is the concrete input used by the editor for names and formulas.

use crate::types::Cell;
use crate::utils::{char_to_byte_index, display_width};
use std::cmp::min;

/// A text-input-like element.
///
/// Offsets are **char indices** into `value()`.
pub trait TextInput {
    fn value(&self) -> &str;
    fn set_value(&mut self, value: String);
    fn caret(&self) -> usize;
    fn set_caret(&mut self, caret: usize);
    /// Screen cell the caret is drawn at.
    fn caret_cell(&self) -> Cell;
}

/// A text buffer with a single caret.
///
/// Multi-line areas keep `\n` inside `text`; single-line areas refuse newlines.
#[derive(Debug, Clone, Default)]
pub struct TextArea {
    text: String,
    caret: usize,
    multiline: bool,
    /// Where the first char of the first line is drawn.
    pub origin: Cell,
}

impl TextArea {
    /// Create an empty multi-line area.
    pub fn new() -> Self {
        Self { multiline: true, ..Self::default() }
    }

    /// Create an empty single-line area.
    pub fn single_line() -> Self {
        Self::default()
    }

    /// Replace the contents and put the caret at the end.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = if self.multiline { text.to_string() } else { text.replace('\n', " ") };
        self.caret = self.len_chars();
        self
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// `(line, column)` of the caret, both in chars.
    pub fn line_col(&self) -> (usize, usize) {
        let before = &self.text[..char_to_byte_index(&self.text, self.caret)];
        let line = before.matches('\n').count();
        let col = before.rsplit('\n').next().unwrap_or("").chars().count();
        (line, col)
    }

    /// Char offset of the start of `line`.
    fn line_start(&self, line: usize) -> usize {
        self.lines().take(line).map(|l| l.chars().count() + 1).sum()
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines().nth(line).map_or(0, |l| l.chars().count())
    }

    /// Insert a single character at the caret.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' && !self.multiline {
            return;
        }
        let bi = char_to_byte_index(&self.text, self.caret);
        self.text.insert(bi, ch);
        self.caret += 1;
    }

    /// Insert a newline at the caret (no-op for single-line areas).
    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        let bi = char_to_byte_index(&self.text, self.caret - 1);
        self.text.remove(bi);
        self.caret -= 1;
        true
    }

    /// Delete the character under the caret.
    pub fn delete(&mut self) -> bool {
        if self.caret >= self.len_chars() {
            return false;
        }
        let bi = char_to_byte_index(&self.text, self.caret);
        self.text.remove(bi);
        true
    }

    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.caret = min(self.caret + 1, self.len_chars());
    }

    /// Move to the start of the current line.
    pub fn move_home(&mut self) {
        let (line, _) = self.line_col();
        self.caret = self.line_start(line);
    }

    /// Move to the end of the current line.
    pub fn move_end(&mut self) {
        let (line, _) = self.line_col();
        self.caret = self.line_start(line) + self.line_len(line);
    }

    /// Put the caret at `(line, col)`, clamped to the text.
    pub fn set_line_col(&mut self, line: usize, col: usize) {
        let line = min(line, self.line_count() - 1);
        self.caret = self.line_start(line) + min(col, self.line_len(line));
    }

    /// Move one line up. Returns `false` when already on the first line.
    pub fn move_up(&mut self) -> bool {
        let (line, col) = self.line_col();
        if line == 0 {
            return false;
        }
        self.caret = self.line_start(line - 1) + min(col, self.line_len(line - 1));
        true
    }

    /// Move one line down. Returns `false` when already on the last line.
    pub fn move_down(&mut self) -> bool {
        let (line, col) = self.line_col();
        if line + 1 >= self.line_count() {
            return false;
        }
        self.caret = self.line_start(line + 1) + min(col, self.line_len(line + 1));
        true
    }
}

impl TextInput for TextArea {
    fn value(&self) -> &str {
        &self.text
    }

    fn set_value(&mut self, value: String) {
        self.text = value;
        self.caret = min(self.caret, self.len_chars());
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn set_caret(&mut self, caret: usize) {
        self.caret = min(caret, self.len_chars());
    }

    fn caret_cell(&self) -> Cell {
        let (line, _) = self.line_col();
        let before = &self.text[..char_to_byte_index(&self.text, self.caret)];
        let col = display_width(before.rsplit('\n').next().unwrap_or(""));
        Cell { x: self.origin.x + col, y: self.origin.y + line }
    }
}
