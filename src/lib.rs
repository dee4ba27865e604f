//! Public library surface for the TOON condensation engine (spec.md §6).
//!
//! Three operations are exposed to callers (a transport, a CLI, or tests):
//! [`condense_text`] runs the full response-shaper policy over raw tool-
//! response bytes, [`condense_value`] condenses an already-parsed [`Value`]
//! tree, and [`encode_toon`] renders a tree as TOON with no semantic
//! preprocessing at all. `condense_json` and `toon_encode_json` remain as
//! deprecated aliases for the first two, each logging a one-time
//! deprecation warning the first time it's called.

pub mod cli;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod identity;
pub mod parsers;
pub mod preprocess;
pub mod shaper;
pub mod table;
pub mod tokens;
pub mod toon;
pub mod value;

use std::{env, fs, io::Read, sync::OnceLock, time::Instant};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use crate::cli::{Cli, Commands};
use crate::heuristics::{Heuristics, Profile};
use crate::shaper::ShaperConfig;
use crate::value::Value;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("toon_condense", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Runs the full response shaper over `raw` for `tool` under `cfg`
/// (spec §4.6/§6). Never fails: unparseable or gated input is returned
/// unchanged rather than propagating an error.
pub fn condense_text(raw: &[u8], tool: &str, cfg: &ShaperConfig) -> String {
    shaper::condense_text(raw, tool, cfg)
}

/// Condenses an already-parsed tree under `heuristics`, bypassing the
/// shaper's tool-matching and gating policy entirely (spec §6).
pub fn condense_value(tree: &Value, heuristics: &Heuristics) -> String {
    toon::condense_value(tree, heuristics)
}

/// Renders `tree` as TOON with no semantic preprocessing (spec §6).
pub fn encode_toon(tree: &Value) -> String {
    toon::encode_toon(tree)
}

static CONDENSE_JSON_DEPRECATION: OnceLock<()> = OnceLock::new();

/// Deprecated alias for [`condense_text`]. Emits a one-time deprecation
/// warning, then forwards.
#[deprecated(since = "0.2.0", note = "use condense_text instead")]
pub fn condense_json(raw: &[u8], tool: &str, cfg: &ShaperConfig) -> String {
    CONDENSE_JSON_DEPRECATION.get_or_init(|| {
        warn!("condense_json is deprecated; use condense_text instead");
    });
    condense_text(raw, tool, cfg)
}

static TOON_ENCODE_JSON_DEPRECATION: OnceLock<()> = OnceLock::new();

/// Deprecated alias for [`encode_toon`]. Emits a one-time deprecation
/// warning, then forwards.
#[deprecated(since = "0.2.0", note = "use encode_toon instead")]
pub fn toon_encode_json(tree: &Value) -> String {
    TOON_ENCODE_JSON_DEPRECATION.get_or_init(|| {
        warn!("toon_encode_json is deprecated; use encode_toon instead");
    });
    encode_toon(tree)
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse_from(env::args_os());
    match cli.command {
        Commands::Condense(args) => run_operation("condense", || handle_condense(&args)),
        Commands::Encode(args) => run_operation("encode", || handle_encode(&args)),
        Commands::Profile(args) => run_operation("profile", || handle_profile(&args)),
    }
}

fn run_operation<F>(name: &str, op: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let start_clock = Utc::now();
    let start_instant = Instant::now();
    let result = op();
    let end_clock = Utc::now();
    let duration_secs = start_instant.elapsed().as_secs_f64();
    let start_str = start_clock.to_rfc3339_opts(SecondsFormat::Millis, true);
    let end_str = end_clock.to_rfc3339_opts(SecondsFormat::Millis, true);

    match &result {
        Ok(_) => info!(
            "Operation '{name}' completed (status=ok)\nstart: {start_str}\nend: {end_str}\nduration_secs: {duration_secs:.3}"
        ),
        Err(err) => error!(
            "Operation '{name}' failed (status=error)\nstart: {start_str}\nend: {end_str}\nduration_secs: {duration_secs:.3}\nerror: {err:?}"
        ),
    }

    result
}

fn read_input(path: &std::path::Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Reading stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Reading input file {path:?}"))
    }
}

fn resolve_shaper_config(
    config_path: Option<&std::path::Path>,
    format_hint: Option<&str>,
) -> Result<ShaperConfig> {
    let base = match config_path {
        Some(path) => {
            config::load_config_file(path).with_context(|| format!("Loading config from {path:?}"))?
        }
        None => ShaperConfig::default(),
    };
    let mut resolved = config::apply_env_overrides(base).context("Applying environment overrides")?;
    if let Some(hint) = format_hint {
        resolved.format_hint = Some(hint.to_string());
    }
    Ok(resolved)
}

fn handle_condense(args: &cli::CondenseArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let cfg = resolve_shaper_config(args.config.as_deref(), args.format_hint.as_deref())?;
    debug!(
        "condensing {} bytes for tool '{}' (profile={:?})",
        raw.len(),
        args.tool,
        cfg.profile
    );
    let text = condense_text(&raw, &args.tool, &cfg);
    println!("{text}");
    Ok(())
}

fn handle_encode(args: &cli::EncodeArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let text = String::from_utf8(raw).context("Input is not valid UTF-8")?;
    let tree = parsers::parse(&text, args.format_hint.as_deref())
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Parsing input")?;
    println!("{}", encode_toon(&tree));
    Ok(())
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let profile = Profile::from_name(&args.name).map_err(|e| anyhow::anyhow!("{e}"))?;
    let heuristics = profile.defaults();
    println!("{heuristics:#?}");
    Ok(())
}
