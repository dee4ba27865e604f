//! Typed errors for the condensation engine library surface.
//!
//! The CLI boundary (`cli.rs`/`main.rs`) wraps these in `anyhow::Context` the
//! same way the teacher wraps `schema`/`io_utils` errors; the library surface
//! itself stays typed so callers embedding this crate can match on error kind
//! (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CondenseError {
    #[error("failed to parse input as {format}: {message}")]
    Parse { format: &'static str, message: String },

    #[error("unknown heuristic key '{key}' (valid keys: {})", valid.join(", "))]
    UnknownHeuristic { key: String, valid: Vec<&'static str> },

    #[error("unknown profile '{name}' (valid profiles: {})", valid.join(", "))]
    UnknownProfile { name: String, valid: Vec<&'static str> },

    #[error("nested-table extraction depth exceeded at depth {depth}")]
    ExtractionDepthExceeded { depth: usize },

    #[error("token counter initialization failed: {message}")]
    TokenizerInit { message: String },
}

pub type Result<T> = std::result::Result<T, CondenseError>;
