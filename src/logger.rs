//! File logging. The terminal is in raw mode while the editor runs, so logs go to a file.

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::Path;

/// Parse a level name, falling back to `Warn` for anything unknown.
pub fn parse_level(s: &str) -> LevelFilter {
    s.parse().unwrap_or(LevelFilter::Warn)
}

pub fn init_logger(level: LevelFilter, path: &Path) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    let mut builder = ConfigBuilder::new();
    builder.set_thread_level(LevelFilter::Off);
    let file = File::create(path)
        .with_context(|| format!("Creating log file {}", path.display()))?;
    WriteLogger::init(level, builder.build(), file).context("Logger already initialized")?;
    Ok(())
}
