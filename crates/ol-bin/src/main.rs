//! Overline demo prompt: reads lines with the keymap engine and echoes them.
use anyhow::Result;
use clap::Parser;
use core_actions::{Engine, Step};
use core_keymap::MainKeymap;
use core_state::{Outcome, Session};
use crossterm::event::{self, Event};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod completer;
mod keys;
mod terminal;

use completer::DemoCompleter;
use terminal::Terminal;

const LOG_FILE: &str = "overline.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "overline", version, about = "Overline line editor")]
struct Args {
    /// Optional configuration file path (overrides discovery of `overline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Start in vi insert mode regardless of configuration.
    #[arg(long)]
    pub vi: bool,
    /// Newline-separated words offered when completing the first word.
    #[arg(long = "words")]
    pub words: Option<PathBuf>,
    /// Prompt printed before the line.
    #[arg(long, default_value = "> ")]
    pub prompt: String,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn build_engine(args: &Args) -> Result<Engine> {
    let config = core_config::load_from(args.config.clone())?;
    let mut options = config.session_options();
    if args.vi {
        options.main = MainKeymap::ViInsert;
    }
    let (keymaps, rejected) = config.keymaps();
    for error in &rejected {
        warn!(target: "runtime.startup", %error, "keymap_binding_rejected");
    }

    let completer = match &args.words {
        Some(path) => DemoCompleter::from_file(path)?,
        None => DemoCompleter::new(Vec::new()),
    };
    let engine = Engine::new(Session::new(options), keymaps).with_completer(completer);
    for error in engine.keymap_errors() {
        warn!(target: "runtime.startup", %error, "keymap_binding_unresolved");
    }
    info!(
        target: "runtime.startup",
        main = ?engine.session().main,
        config = config.path.as_ref().map(|p| p.display().to_string()),
        "bootstrap_complete"
    );
    Ok(engine)
}

/// Feed terminal keys until the engine finishes the line.
fn read_line(engine: &mut Engine, term: &mut Terminal, prompt: &str) -> Result<Outcome> {
    let snapshot = engine.render(term.width());
    term.draw(prompt, &snapshot)?;
    loop {
        let key = match event::read()? {
            Event::Key(key) => key,
            Event::Resize(..) => {
                let snapshot = engine.render(term.width());
                term.draw(prompt, &snapshot)?;
                continue;
            }
            _ => continue,
        };
        let Some(seq) = keys::key_sequence(&key) else {
            continue;
        };
        let step = engine.feed(&seq);
        let snapshot = engine.render(term.width());
        match step {
            Step::Done(outcome) => {
                term.finish(prompt, &snapshot)?;
                return Ok(outcome);
            }
            Step::Pending | Step::Handled => term.draw(prompt, &snapshot)?,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let mut engine = build_engine(&args)?;
    let mut term = Terminal::enter()?;
    loop {
        match read_line(&mut engine, &mut term, &args.prompt)? {
            Outcome::Accepted(line) => {
                debug!(target: "runtime", len = line.len(), "line_accepted");
                term.print_line(&line)?;
            }
            Outcome::Interrupted => term.print_line("^C")?,
            Outcome::Eof => break,
        }
        engine.next_line();
    }
    term.leave()?;
    info!(target: "runtime", "shutdown");
    Ok(())
}
