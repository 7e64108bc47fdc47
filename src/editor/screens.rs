//! Full-screen overlays: help screen.

use super::Editor;
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::Write;

const HELP_TEXT: &[&str] = &[
    " FPAD HELP: Keybindings ",
    "========================",
    "",
    " FORM:",
    "  Tab / Shift+Tab  Next / previous field",
    "  Up / Down        Previous / next row (or line in a formula)",
    "  Left / Right     Change type or precision",
    "  Space            Toggle ignore errors",
    "  Ctrl + N         Add a row",
    "  Ctrl + D         Delete the current row",
    "",
    " SUGGESTIONS (in a formula):",
    "  .                Reference an input column",
    "  $                Reference a context variable",
    "  Up / Down        Move through suggestions",
    "  Enter / Tab      Insert the selected suggestion",
    "  Esc              Close suggestions",
    "",
    " SYSTEM:",
    "  Ctrl + S         Save",
    "  Ctrl + Q         Quit (asks if unsaved)",
    "  F1               Toggle this Help screen",
    "",
    " Press any key to close help...",
];

impl Editor {
    /// Render the help screen.
    pub fn render_help(&mut self, out: &mut impl Write) -> Result<()> {
        let width = self.viewport.width;
        let height = self.viewport.height;

        out.queue(cursor::Hide)?;
        out.queue(style::SetBackgroundColor(Color::DarkBlue))?;
        out.queue(style::SetForegroundColor(Color::White))?;
        out.queue(terminal::Clear(ClearType::All))?;

        let text_w = HELP_TEXT.iter().map(|l| l.len()).max().unwrap_or(0);
        let x = width.saturating_sub(text_w) / 2;
        let start_y = height.saturating_sub(HELP_TEXT.len()) / 2;
        for (i, line) in HELP_TEXT.iter().enumerate() {
            out.queue(cursor::MoveTo(x as u16, (start_y + i) as u16))?;
            out.queue(style::Print(line))?;
        }

        out.queue(style::ResetColor)?;
        out.flush()?;
        Ok(())
    }
}
