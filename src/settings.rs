//! `fpad.toml`: editor settings.
//!
//! ```toml
//! [suggest]
//! limit = 20
//! hover = true
//!
//! [log]
//! level = "warn"
//! file = "fpad.log"
//! ```

use crate::suggest::{SuggestOptions, DEFAULT_LIMIT};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "fpad.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SuggestSettings {
    pub limit: usize,
    pub hover: bool,
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, hover: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// One of off, error, warn, info, debug, trace.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "warn".to_string(), file: PathBuf::from("fpad.log") }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub suggest: SuggestSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("Parsing {}", path.display()))
    }

    /// Load the first `fpad.toml` found in `search_dirs`, or defaults if there is none.
    pub fn load(search_dirs: &[PathBuf]) -> Result<Self> {
        for dir in search_dirs {
            let path = dir.join(FILE_NAME);
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn suggest_options(&self) -> SuggestOptions {
        SuggestOptions {
            limit: self.suggest.limit,
            hover: self.suggest.hover,
            ..SuggestOptions::default()
        }
    }
}
