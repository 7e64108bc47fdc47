//! Suggestion box: autocomplete for a single text input.
//!
//! ## Reading guide
//! - **`bounds`**: finds the word under the caret and splices replacements.
//! - **`rank`**: candidates, choice sources, and the substring ranker.
//! - **`panel`**: where the option list goes on screen and how it is drawn.
//! - **`SuggestBox`** (this file): the inactive/active state machine that ties them to an input.
//!
//! The box owns its input. The host forwards events to it: `on_input()` after every edit,
//! `on_key()`/`on_mouse()` before its own handling, `on_blur()` when focus moves away, and
//! `poll()` on every tick so answers from asynchronous providers are picked up.

pub mod bounds;
pub mod panel;
pub mod rank;

pub use panel::{Anchor, Panel};
pub use rank::{Candidate, ChoiceSource, Provider, Responder, Response, DEFAULT_LIMIT};

use crate::textarea::TextInput;
use crate::types::{Cell, Viewport};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};

/// Construction-time settings for a [`SuggestBox`].
#[derive(Debug, Clone, Copy)]
pub struct SuggestOptions {
    /// Maximum number of ranked candidates.
    pub limit: usize,
    /// Whether hovering the mouse over an option selects it.
    pub hover: bool,
    /// Which chars belong to a word.
    pub is_word_char: fn(char) -> bool,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, hover: true, is_word_char: bounds::is_word_char }
    }
}

type SelectListener = Box<dyn FnMut(&Candidate)>;

/// Autocomplete state attached to one text input.
pub struct SuggestBox<I: TextInput> {
    input: I,
    source: ChoiceSource,
    options: SuggestOptions,
    listeners: Vec<SelectListener>,
    viewport: Viewport,
    /// `Some` while active.
    panel: Option<Panel>,
    /// Caret cell the panel was opened at; updates keep it.
    origin: Cell,
    filtered: Vec<Candidate>,
    selection: usize,
    /// Number of the latest request; answers for anything else are stale.
    request: u64,
    tx: Sender<Response>,
    rx: Receiver<Response>,
    /// Set once the pointer has moved over the panel; hover selection needs it.
    mouse_active: bool,
}

impl<I: TextInput> SuggestBox<I> {
    pub fn new(input: I, source: ChoiceSource, options: SuggestOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            input,
            source,
            options,
            listeners: Vec::new(),
            viewport: Viewport::default(),
            panel: None,
            origin: Cell::default(),
            filtered: Vec::new(),
            selection: 0,
            request: 0,
            tx,
            rx,
            mouse_active: false,
        }
    }

    /// Register a listener called with every accepted candidate.
    #[must_use]
    pub fn on_select(mut self, f: impl FnMut(&Candidate) + 'static) -> Self {
        self.listeners.push(Box::new(f));
        self
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Mutable access to the input. Call `on_input()` after changing its text.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn is_active(&self) -> bool {
        self.panel.is_some()
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn filtered(&self) -> &[Candidate] {
        &self.filtered
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.panel.is_some() {
            self.layout();
        }
    }

    /// The word just before the caret.
    pub fn current_word(&self) -> String {
        match self.input.caret().checked_sub(1) {
            Some(i) => bounds::word(self.input.value(), i, self.options.is_word_char),
            None => String::new(),
        }
    }

    /// Re-run suggestions after the input text changed.
    pub fn on_input(&mut self) {
        let word = self.current_word();
        if word.is_empty() {
            self.deactivate();
            return;
        }

        self.selection = 0;
        self.request += 1;
        let responder = Responder::new(self.request, self.tx.clone());
        self.source.suggest(&word, self.options.limit, responder);
        self.poll();
    }

    /// Apply pending answers. Returns `true` if the visible state may have changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(resp) = self.rx.try_recv() {
            if resp.request != self.request {
                log::debug!("dropping stale suggestions for request {} (latest {})", resp.request, self.request);
                continue;
            }
            match resp.result {
                Ok(choices) => self.show(choices),
                Err(e) => {
                    log::error!("suggestion provider failed: {e:#}");
                    self.show(Vec::new());
                }
            }
            changed = true;
        }
        changed
    }

    fn show(&mut self, choices: Vec<Candidate>) {
        self.filtered = choices;
        self.selection = 0;
        if self.filtered.is_empty() {
            self.deactivate();
            return;
        }
        if self.panel.is_none() {
            self.origin = self.input.caret_cell();
        }
        self.layout();
    }

    fn layout(&mut self) {
        self.panel = Some(Panel::layout(self.origin, self.viewport, &self.filtered));
    }

    /// Close the panel. Answers still in flight become stale.
    pub fn deactivate(&mut self) {
        self.request += 1;
        self.panel = None;
        self.filtered.clear();
        self.selection = 0;
        self.mouse_active = false;
    }

    pub fn select(&mut self, n: usize) {
        self.selection = n.min(self.filtered.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        self.select(self.selection + 1);
    }

    pub fn select_prev(&mut self) {
        self.select(self.selection.saturating_sub(1));
    }

    /// Accept the selected candidate: insert its value and notify listeners.
    pub fn complete(&mut self) {
        if let Some(choice) = self.filtered.get(self.selection).cloned() {
            if !choice.value.is_empty() && self.set_word(&choice.value) {
                for listener in &mut self.listeners {
                    listener(&choice);
                }
            }
        }
        self.deactivate();
    }

    /// Replace the word before the caret with `value` followed by one space.
    fn set_word(&mut self, value: &str) -> bool {
        let Some(i) = self.input.caret().checked_sub(1) else { return false; };
        let padded = format!("{} ", self.input.value());
        let r = bounds::replace(value, &padded, i, self.options.is_word_char);
        let Some(span) = r.span else { return false; };
        self.input.set_value(r.text);
        self.input.set_caret(span.end + 1);
        true
    }

    /// Handle a key while active. Returns `true` if the key was consumed.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        match key.code {
            KeyCode::Esc => self.deactivate(),
            KeyCode::Enter | KeyCode::Tab => self.complete(),
            KeyCode::Down => self.select_next(),
            KeyCode::Up => self.select_prev(),
            _ => return false,
        }
        self.mouse_active = false;
        true
    }

    /// Handle a mouse event. Returns `true` if it landed on the panel.
    pub fn on_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some(panel) = self.panel else { return false; };
        let cell = Cell { x: mouse.column as usize, y: mouse.row as usize };
        let hit = panel.item_at(cell, self.selection, self.filtered.len());

        match mouse.kind {
            MouseEventKind::Moved => {
                // the first move only arms hover; the list may have been redrawn under a still pointer
                if self.options.hover && self.mouse_active {
                    if let Some(i) = hit.filter(|&i| i != self.selection) {
                        self.select(i);
                    }
                }
                if hit.is_some() {
                    self.mouse_active = true;
                }
                hit.is_some()
            }
            MouseEventKind::Down(MouseButton::Left) => match hit {
                Some(i) => {
                    self.select(i);
                    self.complete();
                    true
                }
                None => false,
            },
            _ => hit.is_some(),
        }
    }

    pub fn on_blur(&mut self) {
        self.deactivate();
    }

    /// Draw the panel if active.
    pub fn render(&self, out: &mut impl Write) -> Result<()> {
        if let Some(panel) = &self.panel {
            panel.render(out, &self.filtered, self.selection)?;
        }
        Ok(())
    }
}
