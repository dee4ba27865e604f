//! Parser registry: dispatches raw bytes/text to a format-specific parser.
//!
//! Parsers are tried in a fixed priority order (JSON → YAML → CSV/TSV → XML,
//! spec §4.1); the first one that accepts the input wins. A format hint
//! (`json|yaml|csv|tsv|xml`) skips straight to the named parser; an unknown
//! hint falls back to auto-detect.

pub mod csv;
pub mod json;
pub mod xml;
pub mod yaml;

use crate::error::{CondenseError, Result};
use crate::value::Value;

/// One entry of the auto-detect priority chain (spec §4.1). Ordered by
/// priority: lowest index tried first.
struct ParserEntry {
    name: &'static str,
    try_parse: fn(&str) -> Result<Value>,
}

static AUTO_DETECT_CHAIN: &[ParserEntry] = &[
    ParserEntry {
        name: "json",
        try_parse: json::parse,
    },
    ParserEntry {
        name: "yaml",
        try_parse: yaml::parse,
    },
    ParserEntry {
        name: "csv",
        try_parse: csv::parse_sniffed,
    },
    ParserEntry {
        name: "xml",
        try_parse: xml::parse,
    },
];

/// Recognized format-hint names, each mapped to a fixed (non-sniffing) parse
/// function where that matters (CSV vs. TSV pick a fixed delimiter; the rest
/// are identical to their auto-detect entry).
fn hinted_parse(hint: &str) -> Option<fn(&str) -> Result<Value>> {
    match hint.to_ascii_lowercase().as_str() {
        "json" => Some(json::parse),
        "yaml" => Some(yaml::parse),
        "csv" => Some(|text| csv::parse(text, b',')),
        "tsv" => Some(|text| csv::parse(text, b'\t')),
        "xml" => Some(xml::parse),
        _ => None,
    }
}

/// Parses `text` using the named hint, or auto-detects via
/// [`AUTO_DETECT_CHAIN`] when `hint` is `None` or not a recognized format
/// name (spec §4.1: "Unknown hints fall back to auto-detect").
pub fn parse(text: &str, hint: Option<&str>) -> Result<Value> {
    if let Some(hint) = hint
        && let Some(parser) = hinted_parse(hint)
    {
        log::debug!("parsing with hinted format '{hint}'");
        return parser(text);
    }

    let mut last_err: Option<CondenseError> = None;
    for entry in AUTO_DETECT_CHAIN {
        match (entry.try_parse)(text) {
            Ok(value) => {
                log::debug!("auto-detected format '{}'", entry.name);
                return Ok(value);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| CondenseError::Parse {
        format: "auto",
        message: "no registered parser accepted the input".to_string(),
    }))
}
