//! `clap`-derive CLI surface for manual inspection and scripting around the
//! condensation engine (spec.md §6 "CLI surface", SPEC_FULL.md §6).
//!
//! Subcommand handlers do no business logic of their own: they resolve I/O
//! (stdin/file, optional config file) and call straight into the library.
//! All decision logic lives in `shaper`/`preprocess`/`toon`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Condense MCP tool responses into compact TOON text", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full response shaper (parse, condense, gate, cap) over a tool response
    Condense(CondenseArgs),
    /// Parse input and emit raw TOON with no semantic preprocessing
    Encode(EncodeArgs),
    /// Print the resolved heuristics record for a named profile
    Profile(ProfileArgs),
}

#[derive(Debug, Args)]
pub struct CondenseArgs {
    /// Input file to read, or `-` for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,
    /// Tool name used to resolve per-tool heuristics/limits/format hints
    #[arg(short = 't', long = "tool", default_value = "cli")]
    pub tool: String,
    /// Optional YAML config file (condense_tools, heuristics, token limits, ...)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Parser format hint (json|yaml|csv|tsv|xml); overrides auto-detection
    #[arg(long = "format-hint")]
    pub format_hint: Option<String>,
}

#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Input file to read, or `-` for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,
    /// Parser format hint (json|yaml|csv|tsv|xml); overrides auto-detection
    #[arg(long = "format-hint")]
    pub format_hint: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Profile name: balanced, compact, or precise
    pub name: String,
}
