//! `fpad`: edit the output-column formulas of a stream from the terminal.
//!
//! The program reads a host config payload (JSON), lets the user edit one formula per
//! output column with `.`/`$` autocomplete, and writes the save payload on Ctrl+S.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use fpad::editor::Editor;
use fpad::formula::HostConfig;
use fpad::logger::{init_logger, parse_level};
use fpad::settings::Settings;
use fpad::terminal::TerminalGuard;
use fpad::types::Viewport;
use fpad::utils::default_config_dirs;
use simplelog::LevelFilter;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("fpad: formula editor for output columns");
    println!();
    println!("USAGE:");
    println!("    fpad [OPTIONS] [CONFIG]");
    println!();
    println!("ARGS:");
    println!("    CONFIG               Host config payload (JSON). Starts empty if omitted.");
    println!();
    println!("OPTIONS:");
    println!("    -o, --out FILE       Write the save payload to FILE (default: stdout on exit)");
    println!("        --verbose        Log at debug level");
    println!("    -h, --help           Show this help message");
    println!("    -v, --version        Show version information");
    println!();
    println!("KEYBINDINGS:");
    println!("    .  /  $              Suggest input columns / context variables");
    println!("    Ctrl+N / Ctrl+D      Add / delete a row");
    println!("    Ctrl+S               Save");
    println!("    Ctrl+Q               Quit");
    println!("    F1                   Help");
}

/// Runs the editor:
/// - parses command line arguments and loads `fpad.toml`
/// - starts file logging
/// - loads the config payload and builds the form
/// - loops: render → read input events → update state
/// - prints the last save payload if there was no `--out`
fn run() -> Result<()> {
    let mut config_path = None;
    let mut out_path = None;
    let mut verbose = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                println!("fpad v{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "-o" | "--out" => {
                let p = args.next().context("--out needs a file name")?;
                out_path = Some(PathBuf::from(p));
            }
            "--verbose" => verbose = true,
            flag if flag.starts_with('-') => {
                eprintln!("Error: Unknown flag '{}'", flag);
                eprintln!("Try 'fpad --help' for more information.");
                std::process::exit(1);
            }
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    let settings = Settings::load(&default_config_dirs())?;
    let level = if verbose { LevelFilter::Debug } else { parse_level(&settings.log.level) };
    init_logger(level, &settings.log.file)?;

    let config = match &config_path {
        Some(p) => HostConfig::load(p)?,
        None => HostConfig::default(),
    };

    let (w, h) = terminal::size().context("Reading terminal size")?;
    let mut editor = Editor::new(
        &config,
        settings.suggest_options(),
        out_path.clone(),
        Viewport::new(w as usize, h as usize),
    );

    {
        let mut stdout = io::stdout();
        let _term = TerminalGuard::new(&mut stdout)?;

        // Main UI loop:
        // - render when something changed
        // - poll for input so we can also pick up provider answers and expire status messages
        loop {
            editor.render(&mut stdout)?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if editor.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => editor.handle_mouse(mouse)?,
                    Event::Resize(w, h) => editor.on_resize(w, h),
                    _ => {}
                }
            } else {
                editor.tick();
            }
        }
    }

    // the terminal is restored by now
    if out_path.is_none() {
        if let Some(json) = &editor.saved_json {
            println!("{json}");
        }
    }
    log::info!("exit");
    Ok(())
}
