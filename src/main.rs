//! Entry point for the narrator.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Build the asset catalog and the rodio output.
//! - Hand the selected sentences (or a single clip) to the narrator.

mod audio;
mod cache;
mod catalog;
mod config;
mod content;
mod narrator;

use crate::audio::RodioOutput;
use crate::catalog::AssetCatalog;
use crate::config::{load_config, save_config};
use crate::content::{Selection, load_comic};
use crate::narrator::{Narrator, NarratorOptions, Outcome};
use anyhow::{Context, Result, anyhow, bail};
use bocadillo_core::PlaybackController;
use bocadillo_core::reference::AudioReference;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

const CONFIG_PATH: &str = "conf/config.toml";

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: bocadillo <comic.json> [--page N] [--panel N] [--rate R]\n       \
                     bocadillo --word <text> [--rate R]\n       \
                     bocadillo --dict <base-form> [--rate R]";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Comic { path: PathBuf, selection: Selection },
    Word(String),
    Dictionary(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    command: Command,
    rate: Option<f32>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let cli = parse_args(env::args().skip(1))?;
    let config_path = Path::new(CONFIG_PATH);
    let config = load_config(config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    if !config_path.exists() {
        // Leave an editable copy of the defaults behind.
        if let Err(err) = save_config(config_path, &config) {
            warn!("Could not write default config: {err:?}");
        }
    }
    info!(level = %config.log_level, "Starting narrator");

    let catalog = AssetCatalog::from_config(&config);
    let reference = match &cli.command {
        Command::Comic { .. } => None,
        Command::Word(text) => Some(
            catalog
                .word_audio_reference(text)
                .ok_or_else(|| anyhow!("No word clip registered for {text:?}"))?,
        ),
        Command::Dictionary(base) => {
            if !catalog.has_dictionary_audio(base) {
                bail!("No dictionary clip registered for {base:?}");
            }
            Some(AudioReference::Dictionary(base.clone()).to_string())
        }
    };

    let stop_requested = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&stop_requested);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("Installing Ctrl-C handler")?;
    }

    let output = RodioOutput::new(PathBuf::from(&config.cache_dir), config.volume);
    let controller = PlaybackController::new(output, catalog, config.controller_settings());
    let options = NarratorOptions {
        tick_interval: config.tick_interval(),
        pause_between_sentences: config.pause_between_sentences(),
    };
    let mut narrator = Narrator::new(controller, options, stop_requested);
    let rate = cli.rate.unwrap_or(config.playback_rate);
    let applied = narrator.controller_mut().set_playback_rate(rate)?;
    info!(rate = applied, "Active playback rate");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match (cli.command, reference) {
        (Command::Comic { path, selection }, _) => {
            let comic = load_comic(&path)?;
            info!(
                title = %comic.title,
                level = ?comic.level,
                description = %comic.description,
                "Narrating comic"
            );
            let lines = comic.lines(selection);
            if lines.is_empty() {
                warn!(?selection, "Selection contains no sentences");
                return Ok(());
            }
            let summary = narrator.narrate(&lines, &mut out)?;
            if summary.failed > 0 {
                warn!(failed = summary.failed, "Some sentences could not be played");
            }
        }
        (_, Some(reference)) => match narrator.play_clip(&reference, &[], &mut out)? {
            Outcome::Failed(reason) => bail!("Playing {reference} failed: {reason}"),
            outcome => info!(%reference, ?outcome, "Clip done"),
        },
        (_, None) => {}
    }
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli> {
    let mut args = args.into_iter();
    let mut path = None;
    let mut word = None;
    let mut dict = None;
    let mut selection = Selection::default();
    let mut rate = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--page" => selection.page = Some(parse_number(&value("--page")?, "--page")?),
            "--panel" => selection.panel = Some(parse_number(&value("--panel")?, "--panel")?),
            "--rate" => {
                let raw = value("--rate")?;
                rate = Some(
                    raw.parse::<f32>()
                        .with_context(|| format!("Invalid --rate {raw:?}"))?,
                );
            }
            "--word" => word = Some(value("--word")?),
            "--dict" => dict = Some(value("--dict")?),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            _ if path.is_none() => path = Some(PathBuf::from(&arg)),
            _ => bail!("Unexpected argument {arg:?}\n{USAGE}"),
        }
    }

    let command = match (path, word, dict) {
        (Some(path), None, None) => {
            if !path.exists() {
                return Err(anyhow!("File not found: {}", path.display()));
            }
            Command::Comic { path, selection }
        }
        (None, Some(text), None) => Command::Word(text),
        (None, None, Some(base)) => Command::Dictionary(base),
        _ => bail!("{USAGE}"),
    };
    Ok(Cli { command, rate })
}

fn parse_number(raw: &str, flag: &str) -> Result<u32> {
    raw.parse()
        .with_context(|| format!("Invalid {flag} {raw:?}"))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_comic_with_selection_and_rate() {
        let path = std::env::temp_dir().join("bocadillo-cli-comic.json");
        std::fs::write(&path, "{}").expect("temp file should be writable");
        let raw = path.to_string_lossy().to_string();

        let cli = parse_args(args(&[&raw, "--page", "2", "--panel", "1", "--rate", "0.75"]))
            .expect("arguments should parse");
        assert_eq!(cli.rate, Some(0.75));
        assert_eq!(
            cli.command,
            Command::Comic {
                path,
                selection: Selection {
                    page: Some(2),
                    panel: Some(1),
                },
            }
        );
    }

    #[test]
    fn parses_single_clip_modes() {
        let cli = parse_args(args(&["--word", "¿Dónde"])).expect("word mode");
        assert_eq!(cli.command, Command::Word("¿Dónde".to_string()));
        let cli = parse_args(args(&["--dict", "llegar"])).expect("dict mode");
        assert_eq!(cli.command, Command::Dictionary("llegar".to_string()));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--word"])).is_err());
        assert!(parse_args(args(&["--word", "hola", "--dict", "ser"])).is_err());
        assert!(parse_args(args(&["--page", "two"])).is_err());
        assert!(parse_args(args(&["--loud"])).is_err());
        assert!(parse_args(args(&["/nonexistent/bocadillo/comic.json"])).is_err());
    }
}
