//! Terminal setup and teardown.

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, style,
    terminal::{self, ClearType},
};
use std::io::{self, Stdout, Write};

/// Puts the terminal into editor mode for as long as it is alive.
///
/// Mouse capture is on so pointer motion reaches the suggestion panel. Dropping the
/// guard (also while unwinding) gives the shell its screen back.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new(stdout: &mut Stdout) -> Result<Self> {
        terminal::enable_raw_mode().context("enable_raw_mode failed")?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )
        .context("Entering the alternate screen")?;
        Ok(Self)
    }
}

fn restore(out: &mut impl Write) -> io::Result<()> {
    execute!(out, style::ResetColor, cursor::Show, DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    out.flush()
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore(&mut io::stdout());
        let _ = terminal::disable_raw_mode();
    }
}
