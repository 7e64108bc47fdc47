//! Editor: the application state around a `FormulaForm`.

mod input;
mod render;
mod screens;

use crate::form::{FormulaForm, OutputType};
use crate::formula::HostConfig;
use crate::suggest::SuggestOptions;
use crate::types::{Cell, StatusMsg, Viewport};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Rows above the first form row (title bar + blank line).
const BODY_TOP: usize = 2;
/// Column where the name field starts: `"#NN Name: "`.
const NAME_X: usize = 10;
pub(crate) const NAME_WIDTH: usize = 24;
/// Indentation of formula lines.
const FORMULA_X: usize = 4;

/// Focusable parts of a row, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Type,
    Precision,
    Formula,
    IgnoreErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub row: usize,
    pub field: Field,
}

/// What a click on a screen region does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Focus(Focus),
    Delete(usize),
}

/// A clickable span on one screen row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Region {
    pub y: usize,
    pub x0: usize,
    pub x1: usize,
    pub target: Target,
}

/// Vertical position of one row block, in document lines.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowLayout {
    pub top: usize,
}

/// The top-level application state.
pub struct Editor {
    pub form: FormulaForm,
    pub focus: Focus,
    /// Where Ctrl+S writes; `None` means print on exit.
    pub out_path: Option<PathBuf>,
    /// Last saved payload, kept for printing on exit when there is no `out_path`.
    pub saved_json: Option<String>,
    /// "Dirty" means there are unsaved changes.
    pub dirty: bool,
    pub show_help: bool,
    pub(crate) status: Option<StatusMsg>,
    pub(crate) last_quit_hint: Option<Instant>,
    pub(crate) needs_redraw: bool,
    pub(crate) viewport: Viewport,
    /// First visible document line.
    pub(crate) scroll_y: usize,
    pub(crate) rows_layout: Vec<RowLayout>,
    pub(crate) regions: Vec<Region>,
}

impl Editor {
    pub fn new(config: &HostConfig, options: SuggestOptions, out_path: Option<PathBuf>, viewport: Viewport) -> Self {
        let mut ed = Self {
            form: FormulaForm::from_config(config, options),
            focus: Focus { row: 0, field: Field::Formula },
            out_path,
            saved_json: None,
            dirty: false,
            show_help: false,
            status: None,
            last_quit_hint: None,
            needs_redraw: true,
            viewport,
            scroll_y: 0,
            rows_layout: Vec::new(),
            regions: Vec::new(),
        };
        ed.layout();
        ed.set_status("F1 help • Ctrl+S save • Ctrl+Q quit", Duration::from_secs(4));
        ed
    }

    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Show a message in the status bar.
    pub fn set_status(&mut self, msg: impl Into<String>, ttl: Duration) {
        self.status = Some(StatusMsg { text: msg.into(), until: Instant::now() + ttl });
        self.mark_redraw();
    }

    /// Periodic updates: pick up provider answers and expire status messages.
    pub fn tick(&mut self) {
        for row in &mut self.form.rows {
            if row.formula.poll() {
                self.needs_redraw = true;
            }
        }
        if let Some(st) = &self.status {
            if Instant::now() >= st.until {
                self.status = None;
                self.mark_redraw();
            }
        }
    }

    /// Called when the terminal is resized.
    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.viewport = Viewport::new(width as usize, height as usize);
        self.layout();
        self.mark_redraw();
    }

    /// Screen rows available for the form (between title bar and status bar).
    pub(crate) fn body_height(&self) -> usize {
        self.viewport.height.saturating_sub(BODY_TOP + 1)
    }

    /// Document line → screen row, if visible.
    pub(crate) fn screen_y(&self, doc_y: usize) -> Option<usize> {
        let rel = doc_y.checked_sub(self.scroll_y)?;
        (rel < self.body_height()).then_some(BODY_TOP + rel)
    }

    /// Recompute row positions, input origins, and click regions.
    pub fn layout(&mut self) {
        self.rows_layout.clear();
        let mut top = 0;
        for row in &self.form.rows {
            let height = 2 + row.formula.input().line_count() + 1;
            self.rows_layout.push(RowLayout { top });
            top += height;
        }

        self.ensure_focus_visible();

        let viewport = self.viewport;
        let mut regions = Vec::new();
        for i in 0..self.form.rows.len() {
            let top = self.rows_layout[i].top;
            let head_y = BODY_TOP + top;
            let formula_y = head_y + 2;
            let head = head_y as isize - self.scroll_y as isize;

            let row = &mut self.form.rows[i];
            row.name.origin = Cell { x: NAME_X, y: head.max(0) as usize };
            row.formula.input_mut().origin = Cell {
                x: FORMULA_X,
                y: (formula_y as isize - self.scroll_y as isize).max(0) as usize,
            };
            row.formula.set_viewport(viewport);

            for (x0, x1, target) in header_spans(i, row.kind) {
                regions.push((top, x0, x1, target));
            }
            let lines = row.formula.input().line_count();
            for l in 0..lines {
                regions.push((top + 2 + l, FORMULA_X, usize::MAX, Target::Focus(Focus { row: i, field: Field::Formula })));
            }
        }

        self.regions = regions
            .into_iter()
            .filter_map(|(doc_y, x0, x1, target)| {
                self.screen_y(doc_y).map(|y| Region { y, x0, x1, target })
            })
            .collect();
    }

    /// Adjust `scroll_y` so the focused line is on screen.
    fn ensure_focus_visible(&mut self) {
        let Some(rl) = self.rows_layout.get(self.focus.row).copied() else { return; };
        let line = match self.focus.field {
            Field::Formula => rl.top + 2 + self.form.rows[self.focus.row].formula.input().line_col().0,
            _ => rl.top,
        };
        let h = self.body_height().max(1);
        if line < self.scroll_y {
            self.scroll_y = line;
        } else if line >= self.scroll_y + h {
            self.scroll_y = line + 1 - h;
        }
    }

    /// Move focus, closing the suggestion panel of the formula being left.
    pub fn set_focus(&mut self, focus: Focus) {
        let focus = Focus { row: focus.row.min(self.form.rows.len().saturating_sub(1)), ..focus };
        if self.focus != focus && self.focus.field == Field::Formula {
            if let Some(row) = self.form.rows.get_mut(self.focus.row) {
                row.formula.on_blur();
            }
        }
        self.focus = focus;
        self.layout();
        self.mark_redraw();
    }

    /// Fields of `row` in Tab order; precision only exists for decimal columns.
    pub(crate) fn fields(&self, row: usize) -> Vec<Field> {
        let decimal = self.form.rows.get(row).is_some_and(|r| r.kind == OutputType::Decimal);
        let mut v = vec![Field::Name, Field::Type];
        if decimal {
            v.push(Field::Precision);
        }
        v.push(Field::Formula);
        v.push(Field::IgnoreErrors);
        v
    }

    /// Tab / Shift+Tab.
    pub fn cycle_focus(&mut self, forward: bool) {
        let fields = self.fields(self.focus.row);
        let pos = fields.iter().position(|f| *f == self.focus.field).unwrap_or(0);
        let rows = self.form.rows.len();
        let next = if forward {
            if pos + 1 < fields.len() {
                Focus { row: self.focus.row, field: fields[pos + 1] }
            } else {
                Focus { row: (self.focus.row + 1) % rows, field: Field::Name }
            }
        } else if pos > 0 {
            Focus { row: self.focus.row, field: fields[pos - 1] }
        } else {
            Focus { row: (self.focus.row + rows - 1) % rows, field: Field::IgnoreErrors }
        };
        self.set_focus(next);
    }

    pub fn add_row(&mut self) {
        let i = self.form.add_row();
        self.dirty = true;
        self.set_focus(Focus { row: i, field: Field::Name });
        self.set_status(format!("Added row {}", i + 1), Duration::from_secs(2));
    }

    pub fn delete_row(&mut self, index: usize) {
        if self.form.can_delete() && self.focus.field == Field::Formula {
            if let Some(row) = self.form.rows.get_mut(self.focus.row) {
                row.formula.on_blur();
            }
        }
        match self.form.delete_row(index) {
            Ok(()) => {
                self.dirty = true;
                let row = self.focus.row.min(self.form.rows.len() - 1);
                self.focus = Focus { row, field: Field::Name };
                self.layout();
                self.set_status(format!("Deleted row {}", index + 1), Duration::from_secs(2));
            }
            Err(e) => self.set_status(e.to_string(), Duration::from_secs(3)),
        }
    }

    /// Serialize the save payload and write it to `out_path` (or keep it for stdout).
    pub fn save(&mut self) -> Result<()> {
        let payload = match self.form.save_payload() {
            Ok(p) => p,
            Err(e) => {
                self.set_status(e.to_string(), Duration::from_secs(3));
                return Ok(());
            }
        };
        let json = serde_json::to_string_pretty(&payload).context("Serializing save payload")?;

        if let Some(p) = &self.out_path {
            fs::write(p, &json).with_context(|| format!("Failed to write: {}", p.display()))?;
            log::info!("saved {} expressions to {}", payload.settings.expressions.len(), p.display());
            let msg = format!("Saved to {}", p.display());
            self.set_status(msg, Duration::from_secs(2));
        } else {
            log::info!("saved {} expressions (stdout on exit)", payload.settings.expressions.len());
            self.set_status("Saved (printed on exit)", Duration::from_secs(2));
        }
        self.saved_json = Some(json);
        self.dirty = false;
        Ok(())
    }

    /// Quit handling with a safety confirmation if there are unsaved changes.
    pub fn try_quit(&mut self) -> bool {
        if !self.dirty {
            return true;
        }
        let now = Instant::now();
        if let Some(t) = self.last_quit_hint {
            if now.duration_since(t) <= Duration::from_secs(2) {
                return true;
            }
        }
        self.last_quit_hint = Some(now);
        self.set_status("Unsaved changes! Press Ctrl+Q again to quit.", Duration::from_secs(2));
        false
    }

    /// Turn an accepted suggestion into a status message.
    pub(crate) fn report_selection(&mut self) {
        if let Some(c) = self.form.take_selected() {
            self.dirty = true;
            self.set_status(format!("Inserted {}", c.value), Duration::from_secs(2));
        }
    }
}

/// Clickable spans of a row's header line: `(x0, x1, target)`.
///
/// Keep in sync with `render_row_header`.
pub(crate) fn header_spans(row: usize, kind: OutputType) -> Vec<(usize, usize, Target)> {
    let focus = |field| Target::Focus(Focus { row, field });
    let mut x = NAME_X;
    let mut v = vec![(x, x + NAME_WIDTH, focus(Field::Name))];
    x += NAME_WIDTH + 1;
    // " Type: " + "<Datetime>"
    let type_x = x + 7;
    v.push((type_x, type_x + 10, focus(Field::Type)));
    x = type_x + 10;
    if kind == OutputType::Decimal {
        // " Precision: " + "<8 decimals>"
        let px = x + 12;
        v.push((px, px + 12, focus(Field::Precision)));
        x = px + 12;
    }
    // " [x] Ignore errors"
    v.push((x + 1, x + 18, focus(Field::IgnoreErrors)));
    x += 18;
    // " [Delete]"
    v.push((x + 1, x + 9, Target::Delete(row)));
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor() -> Editor {
        let cfg: HostConfig = serde_json::from_value(json!({
            "context": {
                "available_columns": [ { "id": "C-001", "name": "Price" } ],
                "stream": { "type": "usage", "context": {} }
            }
        }))
        .unwrap();
        Editor::new(&cfg, SuggestOptions::default(), None, Viewport::new(100, 30))
    }

    // ==================== focus tests ====================

    #[test]
    fn tab_order_skips_precision_unless_decimal() {
        let mut ed = editor();
        ed.set_focus(Focus { row: 0, field: Field::Name });
        ed.cycle_focus(true);
        assert_eq!(ed.focus.field, Field::Type);
        ed.cycle_focus(true);
        assert_eq!(ed.focus.field, Field::Formula);

        ed.form.rows[0].set_kind(OutputType::Decimal);
        ed.cycle_focus(false);
        assert_eq!(ed.focus.field, Field::Precision);
    }

    #[test]
    fn tab_wraps_to_next_row() {
        let mut ed = editor();
        ed.add_row();
        ed.set_focus(Focus { row: 0, field: Field::IgnoreErrors });
        ed.cycle_focus(true);
        assert_eq!(ed.focus, Focus { row: 1, field: Field::Name });
        ed.cycle_focus(false);
        assert_eq!(ed.focus, Focus { row: 0, field: Field::IgnoreErrors });
    }

    #[test]
    fn leaving_formula_closes_panel() {
        let mut ed = editor();
        let b = &mut ed.form.rows[0].formula;
        b.input_mut().insert_char('.');
        b.on_input();
        assert!(b.is_active());
        ed.cycle_focus(true);
        assert!(!ed.form.rows[0].formula.is_active());
    }

    // ==================== layout tests ====================

    #[test]
    fn formula_origin_follows_rows() {
        let mut ed = editor();
        ed.add_row();
        assert_eq!(ed.form.rows[0].formula.input().origin, Cell { x: FORMULA_X, y: BODY_TOP + 2 });
        // row 0 block: header, label, 1 formula line, blank
        assert_eq!(ed.form.rows[1].formula.input().origin, Cell { x: FORMULA_X, y: BODY_TOP + 4 + 2 });
        assert_eq!(ed.form.rows[1].name.origin.y, BODY_TOP + 4);
    }

    #[test]
    fn regions_include_delete_buttons() {
        let mut ed = editor();
        ed.add_row();
        let deletes = ed.regions.iter().filter(|r| matches!(r.target, Target::Delete(_))).count();
        assert_eq!(deletes, 2);
    }

    #[test]
    fn focus_scrolls_into_view() {
        let mut ed = editor();
        ed.on_resize(100, 10);
        for _ in 0..5 {
            ed.add_row();
        }
        assert_eq!(ed.focus.row, 5);
        assert!(ed.scroll_y > 0);
        assert!(ed.form.rows[5].name.origin.y < 10);
    }

    // ==================== row / save tests ====================

    #[test]
    fn deleting_last_row_shows_error() {
        let mut ed = editor();
        ed.delete_row(0);
        assert_eq!(ed.form.rows.len(), 1);
        assert_eq!(ed.status.as_ref().unwrap().text, "You need to have at least one row");
    }

    #[test]
    fn deleting_another_row_closes_focused_panel() {
        let mut ed = editor();
        ed.add_row();
        ed.set_focus(Focus { row: 0, field: Field::Formula });
        let b = &mut ed.form.rows[0].formula;
        b.input_mut().insert_char('.');
        b.on_input();
        assert!(b.is_active());

        ed.delete_row(1);
        assert_eq!(ed.focus, Focus { row: 0, field: Field::Name });
        assert!(!ed.form.rows[0].formula.is_active());

        ed.set_focus(Focus { row: 0, field: Field::Formula });
        assert!(!ed.form.rows[0].formula.is_active());
    }

    #[test]
    fn save_without_out_path_keeps_json() {
        let mut ed = editor();
        ed.form.rows[0].name = crate::textarea::TextArea::single_line().with_text("total");
        ed.dirty = true;
        ed.save().unwrap();
        assert!(!ed.dirty);
        let v: serde_json::Value = serde_json::from_str(ed.saved_json.as_ref().unwrap()).unwrap();
        assert_eq!(v["settings"]["expressions"][0]["to"], json!("total"));
    }

    #[test]
    fn save_writes_out_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("save.json");
        let mut ed = editor();
        ed.out_path = Some(out.clone());
        ed.form.rows[0].name = crate::textarea::TextArea::single_line().with_text("x");
        ed.save().unwrap();
        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(v["columns"]["output"][0]["name"], json!("x"));
    }

    #[test]
    fn invalid_form_is_not_saved() {
        let mut ed = editor();
        ed.save().unwrap();
        assert!(ed.saved_json.is_none());
        assert!(ed.status.as_ref().unwrap().text.contains("required"));
    }
}
