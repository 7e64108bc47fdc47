//! The floating option list: placement near the caret, hit-testing, and drawing.

use super::rank::Candidate;
use crate::types::{Cell, Viewport};
use crate::utils::{display_width, truncate_to_width};
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Attribute, Color},
    QueueableCommand,
};
use std::io::Write;

/// Which side of the caret the panel hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Below,
    Above,
}

/// Geometry of a visible panel, in screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    /// Column of the left edge, after clamping into the viewport.
    pub x: usize,
    /// Row of the first visible option.
    pub y: usize,
    pub width: usize,
    /// Number of option rows that fit on screen.
    pub height: usize,
    pub anchor: Anchor,
}

/// Text of one option row, without padding.
fn label(c: &Candidate) -> String {
    match &c.subtitle {
        Some(sub) if !sub.is_empty() => format!("{}  {}", c.title, sub),
        _ => c.title.clone(),
    }
}

impl Panel {
    /// Place a panel for `items` next to `caret`.
    ///
    /// The panel goes below the caret when the caret is in the upper half of the
    /// viewport and above it otherwise, then moves left as far as needed to fit.
    pub fn layout(caret: Cell, viewport: Viewport, items: &[Candidate]) -> Self {
        let content = items.iter().map(|c| display_width(&label(c))).max().unwrap_or(0);
        let width = (content + 2).min(viewport.width.max(1));

        let (anchor, y, room) = if caret.y < viewport.height / 2 {
            let top = caret.y + 1;
            (Anchor::Below, top, viewport.height.saturating_sub(top))
        } else {
            (Anchor::Above, 0, caret.y)
        };
        let height = items.len().min(room).max(1);
        let y = match anchor {
            Anchor::Below => y,
            Anchor::Above => caret.y.saturating_sub(height),
        };

        let overflow = (caret.x + width).saturating_sub(viewport.width);
        let x = caret.x - caret.x.min(overflow);

        Self { x, y, width, height, anchor }
    }

    /// Index of the first option shown, keeping `selection` in view.
    pub fn first_visible(&self, selection: usize) -> usize {
        selection.saturating_sub(self.height.saturating_sub(1))
    }

    /// Option under a screen cell, if any.
    pub fn item_at(&self, cell: Cell, selection: usize, len: usize) -> Option<usize> {
        if cell.x < self.x || cell.x >= self.x + self.width {
            return None;
        }
        if cell.y < self.y || cell.y >= self.y + self.height {
            return None;
        }
        let i = self.first_visible(selection) + (cell.y - self.y);
        (i < len).then_some(i)
    }

    /// Draw the visible options; the selected one is highlighted.
    pub fn render(&self, out: &mut impl Write, items: &[Candidate], selection: usize) -> Result<()> {
        let first = self.first_visible(selection);
        let inner = self.width.saturating_sub(2);

        for (row, (i, c)) in items.iter().enumerate().skip(first).take(self.height).enumerate() {
            out.queue(cursor::MoveTo(self.x as u16, (self.y + row) as u16))?;
            if i == selection {
                out.queue(style::SetBackgroundColor(Color::DarkCyan))?;
                out.queue(style::SetForegroundColor(Color::Black))?;
            } else {
                out.queue(style::SetBackgroundColor(Color::AnsiValue(235)))?;
                out.queue(style::SetForegroundColor(Color::White))?;
            }

            let title = truncate_to_width(&c.title, inner);
            let mut used = display_width(&title);
            out.queue(style::Print(" "))?;
            out.queue(style::SetAttribute(Attribute::Bold))?;
            out.queue(style::Print(&title))?;
            out.queue(style::SetAttribute(Attribute::NormalIntensity))?;

            if let Some(sub) = c.subtitle.as_deref().filter(|s| !s.is_empty()) {
                if used + 2 < inner {
                    let sub = truncate_to_width(sub, inner - used - 2);
                    out.queue(style::SetForegroundColor(Color::Grey))?;
                    out.queue(style::Print(format!("  {sub}")))?;
                    used += 2 + display_width(&sub);
                }
            }

            out.queue(style::Print(" ".repeat(inner.saturating_sub(used) + 1)))?;
            out.queue(style::ResetColor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<Candidate> {
        (0..n).map(|i| Candidate::new(format!("item{i}"), "v")).collect()
    }

    // ==================== placement tests ====================

    #[test]
    fn hangs_below_caret_in_upper_half() {
        let p = Panel::layout(Cell { x: 5, y: 3 }, Viewport::new(80, 24), &items(3));
        assert_eq!(p.anchor, Anchor::Below);
        assert_eq!((p.x, p.y, p.height), (5, 4, 3));
        assert_eq!(p.width, "item0".len() + 2);
    }

    #[test]
    fn sits_above_caret_in_lower_half() {
        let p = Panel::layout(Cell { x: 5, y: 20 }, Viewport::new(80, 24), &items(3));
        assert_eq!(p.anchor, Anchor::Above);
        assert_eq!((p.y, p.height), (17, 3));
    }

    #[test]
    fn height_limited_by_room() {
        let p = Panel::layout(Cell { x: 0, y: 9 }, Viewport::new(80, 20), &items(30));
        assert_eq!(p.anchor, Anchor::Below);
        assert_eq!(p.height, 10);
        let p = Panel::layout(Cell { x: 0, y: 12 }, Viewport::new(80, 20), &items(30));
        assert_eq!((p.y, p.height), (0, 12));
    }

    #[test]
    fn clamped_horizontally_into_viewport() {
        let p = Panel::layout(Cell { x: 76, y: 0 }, Viewport::new(80, 24), &items(1));
        assert_eq!(p.x + p.width, 80);
        // wider than the screen: pinned to the left edge
        let wide = vec![Candidate::new("x".repeat(200), "v")];
        let p = Panel::layout(Cell { x: 30, y: 0 }, Viewport::new(80, 24), &wide);
        assert_eq!((p.x, p.width), (0, 80));
    }

    // ==================== hit-testing tests ====================

    #[test]
    fn item_at_maps_rows_to_options() {
        let p = Panel::layout(Cell { x: 2, y: 0 }, Viewport::new(80, 24), &items(3));
        assert_eq!(p.item_at(Cell { x: 3, y: 1 }, 0, 3), Some(0));
        assert_eq!(p.item_at(Cell { x: 3, y: 3 }, 0, 3), Some(2));
        assert_eq!(p.item_at(Cell { x: 3, y: 4 }, 0, 3), None);
        assert_eq!(p.item_at(Cell { x: 0, y: 1 }, 0, 3), None);
    }

    #[test]
    fn scrolled_window_follows_selection() {
        let p = Panel::layout(Cell { x: 0, y: 9 }, Viewport::new(80, 20), &items(30));
        assert_eq!(p.first_visible(4), 0);
        assert_eq!(p.first_visible(15), 6);
        assert_eq!(p.item_at(Cell { x: 1, y: 10 }, 15, 30), Some(6));
    }

    #[test]
    fn render_writes_titles() {
        let list = vec![Candidate::new("Price", "v").with_subtitle("decimal")];
        let p = Panel::layout(Cell { x: 0, y: 0 }, Viewport::new(80, 24), &list);
        let mut out = Vec::new();
        p.render(&mut out, &list, 0).unwrap();
        let s = String::from_utf8_lossy(&out);
        assert!(s.contains("Price"));
        assert!(s.contains("decimal"));
    }
}
