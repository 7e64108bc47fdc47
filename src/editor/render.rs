//! Rendering: drawing the form to the terminal.

use super::{Editor, Field, Focus, FORMULA_X, NAME_WIDTH};
use crate::form::{FormulaRow, OutputType};
use crate::textarea::TextInput;
use crate::utils::{display_width, truncate_to_width};
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Attribute, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::Write;

/// Print `text` padded to `width` cells, highlighted when focused.
fn field(out: &mut impl Write, text: &str, width: usize, focused: bool) -> Result<()> {
    let text = truncate_to_width(text, width);
    let pad = width.saturating_sub(display_width(&text));
    if focused {
        out.queue(style::SetBackgroundColor(Color::DarkBlue))?;
        out.queue(style::SetForegroundColor(Color::White))?;
    } else {
        out.queue(style::SetAttribute(Attribute::Underlined))?;
    }
    out.queue(style::Print(text))?;
    out.queue(style::Print(" ".repeat(pad)))?;
    out.queue(style::SetAttribute(Attribute::Reset))?;
    out.queue(style::ResetColor)?;
    Ok(())
}

impl Editor {
    /// Render the entire UI.
    pub fn render(&mut self, out: &mut impl Write) -> Result<()> {
        if !self.needs_redraw { return Ok(()); }
        self.needs_redraw = false;

        if self.show_help { return self.render_help(out); }

        self.layout();
        let width = self.viewport.width;
        let height = self.viewport.height;

        out.queue(cursor::Hide)?;
        out.queue(style::ResetColor)?;
        out.queue(terminal::Clear(ClearType::All))?;

        self.render_title_bar(out, width)?;

        for i in 0..self.form.rows.len() {
            let top = self.rows_layout[i].top;
            if let Some(y) = self.screen_y(top) {
                self.render_row_header(out, i, y)?;
            }
            if let Some(y) = self.screen_y(top + 1) {
                out.queue(cursor::MoveTo(0, y as u16))?;
                out.queue(style::SetForegroundColor(Color::DarkGrey))?;
                out.queue(style::Print("    Formula:"))?;
                out.queue(style::ResetColor)?;
            }
            let avail = width.saturating_sub(FORMULA_X);
            let focused = self.focus == Focus { row: i, field: Field::Formula };
            for (l, line) in self.form.rows[i].formula.input().lines().enumerate() {
                if let Some(y) = self.screen_y(top + 2 + l) {
                    out.queue(cursor::MoveTo(FORMULA_X as u16, y as u16))?;
                    if focused {
                        out.queue(style::SetForegroundColor(Color::Yellow))?;
                    }
                    out.queue(style::Print(truncate_to_width(line, avail)))?;
                    out.queue(style::ResetColor)?;
                }
            }
        }

        self.render_status_bar(out, height.saturating_sub(1), width)?;

        // the panel overlays everything else
        let focused_box = (self.focus.field == Field::Formula).then(|| &self.form.rows[self.focus.row].formula);
        if let Some(b) = focused_box {
            b.render(out)?;
        }

        match self.cursor_position() {
            Some((x, y)) => {
                out.queue(cursor::MoveTo(x.min(width.saturating_sub(1)) as u16, y as u16))?;
                out.queue(cursor::Show)?;
            }
            None => {
                out.queue(cursor::Hide)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn render_title_bar(&self, out: &mut impl Write, width: usize) -> Result<()> {
        out.queue(cursor::MoveTo(0, 0))?;
        out.queue(style::SetForegroundColor(Color::Black))?;
        out.queue(style::SetBackgroundColor(Color::Cyan))?;
        let target = self.out_path.as_ref().map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
        let dirty = if self.dirty { "*" } else { " " };
        let mut bar = format!(" {dirty}fpad │ {} rows │ save to {target} ", self.form.rows.len());
        bar = truncate_to_width(&bar, width);
        let pad = width.saturating_sub(display_width(&bar));
        bar.push_str(&" ".repeat(pad));
        out.queue(style::Print(bar))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }

    /// Header line of a row. Keep the widths in sync with `header_spans`.
    fn render_row_header(&self, out: &mut impl Write, i: usize, y: usize) -> Result<()> {
        let row: &FormulaRow = &self.form.rows[i];
        let at = |field| self.focus == Focus { row: i, field };

        out.queue(cursor::MoveTo(0, y as u16))?;
        out.queue(style::SetAttribute(Attribute::Bold))?;
        out.queue(style::Print(format!("{:>3}", format!("#{}", i + 1))))?;
        out.queue(style::SetAttribute(Attribute::Reset))?;
        out.queue(style::Print(" Name: "))?;
        field(out, row.name.value(), NAME_WIDTH, at(Field::Name))?;

        out.queue(style::Print("  Type: "))?;
        field(out, &format!("<{:^8}>", row.kind.label()), 10, at(Field::Type))?;

        if row.kind == OutputType::Decimal {
            out.queue(style::Print(" Precision: "))?;
            field(out, &format!("<{:^10}>", row.precision.label()), 12, at(Field::Precision))?;
        }

        out.queue(style::Print(" "))?;
        let check = if row.ignore_errors { "[x]" } else { "[ ]" };
        field(out, &format!("{check} Ignore errors"), 17, at(Field::IgnoreErrors))?;

        out.queue(style::Print(" "))?;
        let color = if self.form.can_delete() { Color::Red } else { Color::DarkGrey };
        out.queue(style::SetForegroundColor(color))?;
        out.queue(style::Print("[Delete]"))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }

    fn render_status_bar(&self, out: &mut impl Write, status_y: usize, width: usize) -> Result<()> {
        out.queue(cursor::MoveTo(0, status_y as u16))?;
        out.queue(terminal::Clear(ClearType::CurrentLine))?;
        out.queue(style::SetForegroundColor(Color::Black))?;
        out.queue(style::SetBackgroundColor(Color::White))?;

        let field = match self.focus.field {
            Field::Name => "name",
            Field::Type => "type",
            Field::Precision => "precision",
            Field::Formula => "formula",
            Field::IgnoreErrors => "ignore errors",
        };
        let msg = self.status.as_ref().map(|s| s.text.clone()).unwrap_or_default();

        let mut bar = format!(" Row {}/{}  {} ", self.focus.row + 1, self.form.rows.len(), field);
        if !msg.is_empty() { bar.push_str(" | "); bar.push_str(&msg); }
        bar = truncate_to_width(&bar, width);
        let pad = width.saturating_sub(display_width(&bar));
        bar.push_str(&" ".repeat(pad));

        out.queue(style::Print(bar))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }

    /// Screen position of the text cursor, if the focused field has one and it is visible.
    fn cursor_position(&self) -> Option<(usize, usize)> {
        let row = self.form.rows.get(self.focus.row)?;
        let (cell, top) = match self.focus.field {
            Field::Name => {
                let c = row.name.caret_cell();
                let max_x = row.name.origin.x + NAME_WIDTH - 1;
                (crate::types::Cell { x: c.x.min(max_x), y: c.y }, self.rows_layout[self.focus.row].top)
            }
            Field::Formula => {
                let line = row.formula.input().line_col().0;
                (row.formula.input().caret_cell(), self.rows_layout[self.focus.row].top + 2 + line)
            }
            _ => return None,
        };
        self.screen_y(top).map(|_| (cell.x, cell.y))
    }
}
