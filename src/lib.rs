//! `fpad`: a terminal editor for output-column formulas, with caret-anchored autocomplete.
//!
//! ## Reading guide (high level architecture)
//! - **`suggest::SuggestBox`**: the autocomplete component. It finds the word before the caret,
//!   asks a `ChoiceSource` for ranked candidates, and shows them in a panel next to the caret.
//! - **`textarea::TextArea`**: the text input a suggestion box is attached to.
//! - **`formula`**: the host config payload and the `.`/`$` choice lists built from it.
//! - **`form::FormulaForm`**: rows of output column + formula, and the save payload.
//! - **`editor::Editor`**: application state + key/mouse handling + rendering.
//! - **`settings`** / **`logger`**: `fpad.toml` and file logging.
//! - **`terminal::TerminalGuard`**: raw mode + alternate screen, restored on drop.

pub mod editor;
pub mod form;
pub mod formula;
pub mod logger;
pub mod settings;
pub mod suggest;
pub mod terminal;
pub mod textarea;
pub mod types;
pub mod utils;
