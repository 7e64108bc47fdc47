//! The formula form: one row per output column, each with its own suggestion box.

use crate::formula::{context_variables, formula_choices, Column, HostConfig};
use crate::suggest::{Candidate, SuggestBox, SuggestOptions};
use crate::textarea::{TextArea, TextInput};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Type of an output column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    String,
    Integer,
    Decimal,
    Boolean,
    Datetime,
}

impl OutputType {
    pub const ALL: [OutputType; 5] = [Self::String, Self::Integer, Self::Decimal, Self::Boolean, Self::Datetime];

    pub fn label(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Datetime => "Datetime",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Next type in the selector, wrapping around.
    #[must_use]
    pub fn cycle(self, forward: bool) -> Self {
        let n = Self::ALL.len();
        let i = if forward { (self.index() + 1) % n } else { (self.index() + n - 1) % n };
        Self::ALL[i]
    }
}

/// Decimal places of a decimal column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precision {
    #[default]
    Auto,
    /// 1 to 8 decimals.
    Digits(u8),
}

impl Precision {
    pub const MAX_DIGITS: u8 = 8;

    pub fn label(self) -> String {
        match self {
            Self::Auto => "Auto".to_string(),
            Self::Digits(1) => "1 decimal".to_string(),
            Self::Digits(n) => format!("{n} decimals"),
        }
    }

    #[must_use]
    pub fn cycle(self, forward: bool) -> Self {
        match (self, forward) {
            (Self::Auto, true) => Self::Digits(1),
            (Self::Auto, false) => Self::Digits(Self::MAX_DIGITS),
            (Self::Digits(n), true) if n >= Self::MAX_DIGITS => Self::Auto,
            (Self::Digits(n), true) => Self::Digits(n + 1),
            (Self::Digits(n), false) if n <= 1 => Self::Auto,
            (Self::Digits(n), false) => Self::Digits(n - 1),
        }
    }

    /// Read a stored precision; hosts send it as a string or a number.
    pub fn from_value(v: &Value) -> Self {
        let n = match v {
            Value::String(s) => s.parse::<u8>().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
            _ => None,
        };
        match n {
            Some(n) if (1..=Self::MAX_DIGITS).contains(&n) => Self::Digits(n),
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub precision: Value,
}

/// An output column as stored in the host's `columns.output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: OutputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

/// One formula in `settings.expressions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub to: String,
    #[serde(default)]
    pub formula: String,
    #[serde(rename = "type", default)]
    pub kind: OutputType,
    #[serde(default)]
    pub ignore_errors: bool,
}

/// One row of the form.
pub struct FormulaRow {
    pub name: TextArea,
    pub kind: OutputType,
    /// Only meaningful when `kind` is decimal.
    pub precision: Precision,
    pub formula: SuggestBox<TextArea>,
    pub ignore_errors: bool,
}

impl FormulaRow {
    /// Change the type; the precision goes back to auto.
    pub fn set_kind(&mut self, kind: OutputType) {
        self.kind = kind;
        self.precision = Precision::Auto;
    }

    pub fn output_column(&self) -> OutputColumn {
        let constraints = match (self.kind, self.precision) {
            (OutputType::Decimal, Precision::Digits(n)) => Some(Constraints { precision: Value::String(n.to_string()) }),
            _ => None,
        };
        OutputColumn { name: self.name.value().to_string(), kind: self.kind, constraints }
    }

    pub fn expression(&self) -> Expression {
        Expression {
            to: self.name.value().to_string(),
            formula: self.formula.input().value().to_string(),
            kind: self.kind,
            ignore_errors: self.ignore_errors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveSettings {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Serialize)]
pub struct SaveColumns {
    pub input: Vec<Column>,
    pub output: Vec<OutputColumn>,
}

/// The `save` event payload.
#[derive(Debug, Serialize)]
pub struct SavePayload {
    pub settings: SaveSettings,
    pub stream: Value,
    pub columns: SaveColumns,
}

/// All rows plus what new rows need to build their suggestion boxes.
pub struct FormulaForm {
    pub rows: Vec<FormulaRow>,
    input_columns: Vec<Column>,
    variables: Vec<String>,
    stream: Value,
    options: SuggestOptions,
    /// Last candidate accepted in any row.
    selected: Rc<RefCell<Option<Candidate>>>,
}

impl FormulaForm {
    /// Build the form from a config payload: one row per stored expression, or one empty row.
    pub fn from_config(cfg: &HostConfig, options: SuggestOptions) -> Self {
        let mut form = Self {
            rows: Vec::new(),
            input_columns: cfg.context.available_columns.clone(),
            variables: context_variables(&cfg.context.stream),
            stream: cfg.context.stream.clone(),
            options,
            selected: Rc::new(RefCell::new(None)),
        };

        for expr in cfg.expressions() {
            let column = cfg.output_columns().iter().find(|c| c.name == expr.to);
            let kind = column.map_or(expr.kind, |c| c.kind);
            let precision = match (kind, column.and_then(|c| c.constraints.as_ref())) {
                (OutputType::Decimal, Some(c)) => Precision::from_value(&c.precision),
                _ => Precision::Auto,
            };
            let row = form.new_row(&expr.to, kind, precision, &expr.formula, expr.ignore_errors);
            form.rows.push(row);
        }

        if form.rows.is_empty() {
            form.add_row();
        }
        form
    }

    fn new_row(&self, name: &str, kind: OutputType, precision: Precision, formula: &str, ignore_errors: bool) -> FormulaRow {
        let sink = Rc::clone(&self.selected);
        let formula = SuggestBox::new(
            TextArea::new().with_text(formula),
            formula_choices(&self.input_columns, &self.variables),
            self.options,
        )
        .on_select(move |c| {
            log::info!("inserted {} -> {}", c.title, c.value);
            *sink.borrow_mut() = Some(c.clone());
        });

        FormulaRow {
            name: TextArea::single_line().with_text(name),
            kind,
            precision,
            formula,
            ignore_errors,
        }
    }

    /// Append an empty row and return its index.
    pub fn add_row(&mut self) -> usize {
        let row = self.new_row("", OutputType::default(), Precision::Auto, "", false);
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// Whether the delete control is enabled.
    pub fn can_delete(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        if !self.can_delete() {
            bail!("You need to have at least one row");
        }
        if index >= self.rows.len() {
            bail!("No row {}", index + 1);
        }
        self.rows.remove(index);
        Ok(())
    }

    /// Candidate accepted since the last call, if any.
    pub fn take_selected(&self) -> Option<Candidate> {
        self.selected.borrow_mut().take()
    }

    /// Check output column names: present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, row) in self.rows.iter().enumerate() {
            let name = row.name.value().trim();
            if name.is_empty() {
                bail!("Row {}: output column name is required", i + 1);
            }
            if !seen.insert(name) {
                bail!("Output column names must be unique: '{}'", name);
            }
        }
        Ok(())
    }

    /// Build the save payload after validating.
    pub fn save_payload(&self) -> Result<SavePayload> {
        self.validate()?;
        Ok(SavePayload {
            settings: SaveSettings { expressions: self.rows.iter().map(FormulaRow::expression).collect() },
            stream: self.stream.clone(),
            columns: SaveColumns {
                input: self.input_columns.clone(),
                output: self.rows.iter().map(FormulaRow::output_column).collect(),
            },
        })
    }
}
