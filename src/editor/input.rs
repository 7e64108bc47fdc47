//! Input handling: keyboard and mouse events.

use super::{Editor, Field, Focus, Target};
use crate::form::OutputType;
use crate::textarea::TextArea;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Result of feeding a key to a text field.
#[derive(Debug, PartialEq, Eq)]
enum TextEdit {
    Changed,
    Moved,
    Unhandled,
}

/// Plain editing keys shared by the name and formula fields.
fn edit_text(ta: &mut TextArea, key: KeyEvent) -> TextEdit {
    let ctrl = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key.code {
        KeyCode::Char(c) if !ctrl => {
            ta.insert_char(c);
            TextEdit::Changed
        }
        KeyCode::Enter if ta.is_multiline() => {
            ta.insert_newline();
            TextEdit::Changed
        }
        KeyCode::Backspace => if ta.backspace() { TextEdit::Changed } else { TextEdit::Moved },
        KeyCode::Delete => if ta.delete() { TextEdit::Changed } else { TextEdit::Moved },
        KeyCode::Left => { ta.move_left(); TextEdit::Moved }
        KeyCode::Right => { ta.move_right(); TextEdit::Moved }
        KeyCode::Home => { ta.move_home(); TextEdit::Moved }
        KeyCode::End => { ta.move_end(); TextEdit::Moved }
        _ => TextEdit::Unhandled,
    }
}

impl Editor {
    /// Top-level key handler. Returns `true` when the editor should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // If help is shown, any key closes it
        if self.show_help {
            self.show_help = false;
            self.mark_redraw();
            return Ok(false);
        }

        self.layout();

        // The open suggestion panel gets first pick
        if self.focus.field == Field::Formula && self.form.rows[self.focus.row].formula.on_key(key) {
            self.report_selection();
            self.layout();
            self.mark_redraw();
            return Ok(false);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, ctrl) {
            (KeyCode::Char('q'), true) => return Ok(self.try_quit()),
            (KeyCode::Char('s'), true) => { self.save()?; return Ok(false); }
            (KeyCode::Char('n'), true) => { self.add_row(); return Ok(false); }
            (KeyCode::Char('d'), true) => { self.delete_row(self.focus.row); return Ok(false); }
            _ => {}
        }

        match key.code {
            KeyCode::F(1) => {
                self.show_help = true;
                self.mark_redraw();
                return Ok(false);
            }
            KeyCode::Tab => { self.cycle_focus(true); return Ok(false); }
            KeyCode::BackTab => { self.cycle_focus(false); return Ok(false); }
            KeyCode::Up => { self.move_vertical(false); return Ok(false); }
            KeyCode::Down => { self.move_vertical(true); return Ok(false); }
            _ => {}
        }

        match self.focus.field {
            Field::Name => {
                if edit_text(&mut self.form.rows[self.focus.row].name, key) == TextEdit::Changed {
                    self.dirty = true;
                }
            }
            Field::Formula => self.formula_key(key),
            Field::Type => {
                let row = &mut self.form.rows[self.focus.row];
                match key.code {
                    KeyCode::Left => row.set_kind(row.kind.cycle(false)),
                    KeyCode::Right | KeyCode::Char(' ') | KeyCode::Enter => row.set_kind(row.kind.cycle(true)),
                    _ => return Ok(false),
                }
                self.dirty = true;
            }
            Field::Precision => {
                let row = &mut self.form.rows[self.focus.row];
                match key.code {
                    KeyCode::Left => row.precision = row.precision.cycle(false),
                    KeyCode::Right | KeyCode::Char(' ') | KeyCode::Enter => row.precision = row.precision.cycle(true),
                    _ => return Ok(false),
                }
                self.dirty = true;
            }
            Field::IgnoreErrors => {
                if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                    let row = &mut self.form.rows[self.focus.row];
                    row.ignore_errors = !row.ignore_errors;
                    self.dirty = true;
                } else {
                    return Ok(false);
                }
            }
        }

        self.layout();
        self.mark_redraw();
        Ok(false)
    }

    fn formula_key(&mut self, key: KeyEvent) {
        let row = self.focus.row;
        match edit_text(self.form.rows[row].formula.input_mut(), key) {
            TextEdit::Changed => {
                // rows grow as lines are added; origins must be current before the panel opens
                self.dirty = true;
                self.layout();
                self.form.rows[row].formula.on_input();
            }
            TextEdit::Moved => self.form.rows[row].formula.deactivate(),
            TextEdit::Unhandled => {}
        }
    }

    /// Up/Down: move within a multi-line formula, otherwise to the neighbouring row.
    fn move_vertical(&mut self, down: bool) {
        let Focus { row, field } = self.focus;
        if field == Field::Formula {
            let b = &mut self.form.rows[row].formula;
            let moved = if down { b.input_mut().move_down() } else { b.input_mut().move_up() };
            if moved {
                self.layout();
                self.mark_redraw();
                return;
            }
        }

        let target = if down { row + 1 } else { row.wrapping_sub(1) };
        if target >= self.form.rows.len() {
            return;
        }
        let field = if field == Field::Precision && self.form.rows[target].kind != OutputType::Decimal {
            Field::Type
        } else {
            field
        };
        self.set_focus(Focus { row: target, field });
    }

    /// Top-level mouse handler.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.show_help {
            return Ok(());
        }
        self.layout();

        if self.focus.field == Field::Formula && self.form.rows[self.focus.row].formula.on_mouse(mouse) {
            self.report_selection();
            self.layout();
            self.mark_redraw();
            return Ok(());
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.move_vertical(false),
            MouseEventKind::ScrollDown => self.move_vertical(true),
            MouseEventKind::Down(MouseButton::Left) => {
                let (x, y) = (mouse.column as usize, mouse.row as usize);
                let hit = self.regions.iter().find(|r| r.y == y && (r.x0..r.x1).contains(&x)).copied();
                if let Some(region) = hit {
                    self.click(region.target, x, y);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn click(&mut self, target: Target, x: usize, y: usize) {
        match target {
            Target::Delete(row) => self.delete_row(row),
            Target::Focus(focus) => {
                let again = self.focus == focus;
                self.set_focus(focus);
                let row = &mut self.form.rows[focus.row];
                match focus.field {
                    Field::Name => {
                        let o = row.name.origin;
                        row.name.set_line_col(0, x.saturating_sub(o.x));
                    }
                    Field::Formula => {
                        let o = row.formula.input().origin;
                        row.formula.input_mut().set_line_col(y.saturating_sub(o.y), x.saturating_sub(o.x));
                        row.formula.deactivate();
                    }
                    Field::Type if again => {
                        row.set_kind(row.kind.cycle(true));
                        self.dirty = true;
                    }
                    Field::Precision if again => {
                        row.precision = row.precision.cycle(true);
                        self.dirty = true;
                    }
                    Field::IgnoreErrors => {
                        row.ignore_errors = !row.ignore_errors;
                        self.dirty = true;
                    }
                    _ => {}
                }
                self.layout();
                self.mark_redraw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::HostConfig;
    use crate::suggest::SuggestOptions;
    use crate::textarea::TextInput;
    use crate::types::Viewport;
    use serde_json::json;

    fn editor() -> Editor {
        let cfg: HostConfig = serde_json::from_value(json!({
            "context": {
                "available_columns": [
                    { "id": "C-001", "name": "Price" },
                    { "id": "C-002", "name": "Quantity" }
                ],
                "stream": { "type": "usage", "context": { "account": "A-1" } }
            }
        }))
        .unwrap();
        Editor::new(&cfg, SuggestOptions::default(), None, Viewport::new(100, 30))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(ed: &mut Editor, s: &str) {
        for ch in s.chars() {
            ed.handle_key(key(KeyCode::Char(ch))).unwrap();
        }
    }

    fn click(ed: &mut Editor, column: u16, row: u16) {
        ed.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
        .unwrap();
    }

    // ==================== formula tests ====================

    #[test]
    fn typing_in_formula_opens_and_accepts_suggestions() {
        let mut ed = editor();
        type_str(&mut ed, ".qua");
        let b = &ed.form.rows[0].formula;
        assert!(b.is_active());
        assert_eq!(b.filtered()[0].title, "Quantity (C002)");

        ed.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(ed.form.rows[0].formula.input().value(), ".\"Quantity (C002)\" ");
        assert!(ed.dirty);
        assert!(ed.status.as_ref().unwrap().text.starts_with("Inserted"));
    }

    #[test]
    fn enter_without_panel_inserts_newline() {
        let mut ed = editor();
        type_str(&mut ed, "1 ");
        ed.handle_key(key(KeyCode::Enter)).unwrap();
        type_str(&mut ed, "+ 2");
        assert_eq!(ed.form.rows[0].formula.input().value(), "1 \n+ 2");
    }

    #[test]
    fn caret_moves_close_panel() {
        let mut ed = editor();
        type_str(&mut ed, "$acc");
        assert!(ed.form.rows[0].formula.is_active());
        ed.handle_key(key(KeyCode::Left)).unwrap();
        assert!(!ed.form.rows[0].formula.is_active());
    }

    #[test]
    fn escape_keeps_text() {
        let mut ed = editor();
        type_str(&mut ed, ".pr");
        ed.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(!ed.form.rows[0].formula.is_active());
        assert_eq!(ed.form.rows[0].formula.input().value(), ".pr");
    }

    // ==================== field tests ====================

    #[test]
    fn type_and_precision_cycle_with_arrows() {
        let mut ed = editor();
        ed.set_focus(Focus { row: 0, field: Field::Type });
        ed.handle_key(key(KeyCode::Right)).unwrap();
        ed.handle_key(key(KeyCode::Right)).unwrap();
        assert_eq!(ed.form.rows[0].kind, OutputType::Decimal);

        ed.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(ed.focus.field, Field::Precision);
        ed.handle_key(key(KeyCode::Right)).unwrap();
        assert_eq!(ed.form.rows[0].precision.label(), "1 decimal");
    }

    #[test]
    fn space_toggles_ignore_errors() {
        let mut ed = editor();
        ed.set_focus(Focus { row: 0, field: Field::IgnoreErrors });
        ed.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert!(ed.form.rows[0].ignore_errors);
    }

    #[test]
    fn name_field_is_single_line() {
        let mut ed = editor();
        ed.set_focus(Focus { row: 0, field: Field::Name });
        type_str(&mut ed, "total");
        ed.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(ed.form.rows[0].name.value(), "total");
    }

    // ==================== command tests ====================

    #[test]
    fn ctrl_n_and_ctrl_d_manage_rows() {
        let mut ed = editor();
        ed.handle_key(ctrl('n')).unwrap();
        assert_eq!(ed.form.rows.len(), 2);
        assert_eq!(ed.focus, Focus { row: 1, field: Field::Name });
        ed.handle_key(ctrl('d')).unwrap();
        assert_eq!(ed.form.rows.len(), 1);
        ed.handle_key(ctrl('d')).unwrap();
        assert_eq!(ed.form.rows.len(), 1);
    }

    #[test]
    fn quit_asks_twice_when_dirty() {
        let mut ed = editor();
        assert!(ed.handle_key(ctrl('q')).unwrap());
        type_str(&mut ed, "1");
        assert!(!ed.handle_key(ctrl('q')).unwrap());
        assert!(ed.handle_key(ctrl('q')).unwrap());
    }

    #[test]
    fn up_down_move_between_rows() {
        let mut ed = editor();
        ed.handle_key(ctrl('n')).unwrap();
        ed.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(ed.focus, Focus { row: 0, field: Field::Name });
        ed.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(ed.focus.row, 0);
    }

    // ==================== mouse tests ====================

    #[test]
    fn clicking_name_focuses_and_places_caret() {
        let mut ed = editor();
        ed.form.rows[0].name = TextArea::single_line().with_text("total");
        ed.layout();
        let o = ed.form.rows[0].name.origin;
        click(&mut ed, (o.x + 2) as u16, o.y as u16);
        assert_eq!(ed.focus, Focus { row: 0, field: Field::Name });
        assert_eq!(ed.form.rows[0].name.caret(), 2);
    }

    #[test]
    fn clicking_ignore_toggles() {
        let mut ed = editor();
        let r = *ed
            .regions
            .iter()
            .find(|r| r.target == Target::Focus(Focus { row: 0, field: Field::IgnoreErrors }))
            .unwrap();
        click(&mut ed, r.x0 as u16, r.y as u16);
        assert!(ed.form.rows[0].ignore_errors);
    }

    #[test]
    fn clicking_suggestion_accepts_it() {
        let mut ed = editor();
        type_str(&mut ed, ".pri");
        let panel = *ed.form.rows[0].formula.panel().unwrap();
        click(&mut ed, panel.x as u16 + 1, panel.y as u16);
        assert_eq!(ed.form.rows[0].formula.input().value(), ".\"Price (C001)\" ");
    }
}
