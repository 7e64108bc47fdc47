//! The host's `config` payload and the suggestion choices derived from it.
//!
//! Formulas reference input columns as `."<label>"` and stream context values as
//! `$context.<path>`, so the formula input gets a keyed choice source: `.` lists the
//! columns and `$` lists the context variables.

use crate::form::{Expression, OutputColumn};
use crate::suggest::{Candidate, ChoiceSource};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// An input column offered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    /// Everything else the host sent (type, description, ...), passed back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), extra: Map::new() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostContext {
    #[serde(default)]
    pub available_columns: Vec<Column>,
    #[serde(default)]
    pub stream: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormulaSettings {
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostColumns {
    #[serde(default)]
    pub output: Vec<OutputColumn>,
}

/// The `config` event payload: available columns, the stream, and prior settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub context: HostContext,
    #[serde(default)]
    pub settings: Option<FormulaSettings>,
    #[serde(default)]
    pub columns: Option<HostColumns>,
}

impl HostConfig {
    /// Read a config payload from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&s)
            .with_context(|| format!("Parsing {}", path.display()))?;
        log::info!(
            "loaded {} ({} columns, {} expressions)",
            path.display(),
            cfg.context.available_columns.len(),
            cfg.expressions().len()
        );
        Ok(cfg)
    }

    pub fn expressions(&self) -> &[Expression] {
        self.settings.as_ref().map_or(&[][..], |s| s.expressions.as_slice())
    }

    pub fn output_columns(&self) -> &[OutputColumn] {
        self.columns.as_ref().map_or(&[][..], |c| c.output.as_slice())
    }
}

/// Display label of a column: `"<name> (C<last id part>)"`.
pub fn column_label(column: &Column) -> String {
    let suffix = column.id.rsplit('-').next().unwrap_or_default();
    format!("{} (C{})", column.name, suffix)
}

/// Keys of `ob` with nested objects turned into dotted paths.
///
/// `prefix` is only put in front of paths that came from nested objects; top-level leaves
/// keep their bare key.
fn flatten_keys(ob: &Map<String, Value>, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for (k, v) in ob {
        match v {
            Value::Object(inner) => {
                keys.extend(flatten_keys(inner, "").into_iter().map(|j| format!("{prefix}{k}.{j}")));
            }
            _ => keys.push(k.clone()),
        }
    }
    keys
}

/// Variables a formula can reference from the stream context.
pub fn context_variables(stream: &Value) -> Vec<String> {
    let context = stream.get("context").and_then(Value::as_object);
    let mut vars = context.map(|c| flatten_keys(c, "context.")).unwrap_or_default();

    if context.and_then(|c| c.get("pricelist")).is_some_and(|p| !p.is_null()) {
        vars.push("context.pricelist_version.id".to_string());
        vars.push("context.pricelist_version.start_at".to_string());
    }

    if stream.get("type").and_then(Value::as_str) == Some("billing") {
        vars.push("context.period.start".to_string());
        vars.push("context.period.end".to_string());
    }

    vars
}

/// `.` triggers column references, `$` triggers context variables.
pub fn formula_choices(columns: &[Column], variables: &[String]) -> ChoiceSource {
    let cols = columns
        .iter()
        .map(|col| {
            let label = column_label(col);
            let value = format!(".\"{label}\"");
            Candidate::new(label, value)
        })
        .collect();
    let vars = variables.iter().map(|v| Candidate::new(v.clone(), format!("${v}"))).collect();

    let mut map = HashMap::new();
    map.insert('.', cols);
    map.insert('$', vars);
    ChoiceSource::Keyed(map)
}
