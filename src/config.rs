//! Configuration resolution: environment variables and an optional YAML file
//! (spec §6's "environment and config-file surface"). This is transport/
//! collaborator territory — specified only so the core's inputs are
//! testable — grounded on `schema.rs`'s YAML-file loading style.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::heuristics::{HeuristicsOverride, Profile, VALID_KEYS};
use crate::shaper::{ShaperConfig, ToolMatch};

const ENV_HEURISTICS: &str = "CONDENSER_HEURISTICS";
const ENV_TOOL_TOKEN_LIMITS: &str = "TOOL_TOKEN_LIMITS";
const ENV_PROFILE: &str = "CONDENSER_PROFILE";

/// Builds a [`ShaperConfig`] from `CONDENSER_HEURISTICS`, `TOOL_TOKEN_LIMITS`,
/// and `CONDENSER_PROFILE`, layered on top of `base` (typically a file-loaded
/// config, or [`ShaperConfig::default`]).
pub fn apply_env_overrides(mut base: ShaperConfig) -> Result<ShaperConfig> {
    if let Ok(raw) = env::var(ENV_PROFILE) {
        base.profile = Profile::from_name(raw.trim())?;
    }

    if let Ok(raw) = env::var(ENV_HEURISTICS) {
        let pairs = parse_key_val_list(&raw);
        let override_ = HeuristicsOverride::from_pairs(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        base.heuristics_override = merge_override(base.heuristics_override, override_);
    }

    if let Ok(raw) = env::var(ENV_TOOL_TOKEN_LIMITS) {
        for (tool, limit) in parse_key_val_list(&raw) {
            if let Ok(limit) = limit.parse::<u32>() {
                base.tool_token_limits.insert(tool, limit);
            }
        }
    }

    Ok(base)
}

/// Splits a comma-list of `key:val` pairs, trimming whitespace around each
/// side (spec §6).
fn parse_key_val_list(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (key, val) = entry.split_once(':')?;
            Some((key.trim().to_string(), val.trim().to_string()))
        })
        .collect()
}

/// A later override's explicitly-set fields win; anything it leaves `None`
/// falls through to the earlier override.
fn merge_override(base: HeuristicsOverride, later: HeuristicsOverride) -> HeuristicsOverride {
    HeuristicsOverride {
        elide_all_zero: later.elide_all_zero.or(base.elide_all_zero),
        elide_all_null: later.elide_all_null.or(base.elide_all_null),
        elide_timestamps: later.elide_timestamps.or(base.elide_timestamps),
        elide_constants: later.elide_constants.or(base.elide_constants),
        group_tuples: later.group_tuples.or(base.group_tuples),
        max_tuple_size: later.max_tuple_size.or(base.max_tuple_size),
        elide_mostly_zero_pct: later.elide_mostly_zero_pct.or(base.elide_mostly_zero_pct),
        max_table_columns: later.max_table_columns.or(base.max_table_columns),
        wide_table_threshold: later.wide_table_threshold.or(base.wide_table_threshold),
        wide_table_format: later.wide_table_format.or(base.wide_table_format),
        pivot_key_value_arrays: later.pivot_key_value_arrays.or(base.pivot_key_value_arrays),
    }
}

/// The on-disk shape of a YAML config file: loose/stringly-typed where the
/// heuristics maps are concerned, so a bad key fails with the same
/// `UnknownHeuristic` message as the env-var path rather than a generic
/// serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    condense_tools: Option<ToolListRaw>,
    toon_only_tools: Vec<String>,
    toon_fallback: bool,
    min_token_threshold: u32,
    revert_if_larger: Option<bool>,
    max_token_limit: u32,
    tool_token_limits: HashMap<String, u32>,
    profile: Option<String>,
    heuristics: HashMap<String, serde_yaml::Value>,
    tool_heuristics: HashMap<String, HashMap<String, serde_yaml::Value>>,
    format_hint: Option<String>,
    tool_format_hints: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolListRaw {
    All(String),
    List(Vec<String>),
}

/// Loads a YAML config file into a [`ShaperConfig`], starting from
/// [`ShaperConfig::default`] for any field the file omits.
pub fn load_config_file(path: &Path) -> Result<ShaperConfig> {
    let raw_text = std::fs::read_to_string(path).map_err(|e| crate::error::CondenseError::Parse {
        format: "config",
        message: e.to_string(),
    })?;
    parse_config_str(&raw_text)
}

fn parse_config_str(raw_text: &str) -> Result<ShaperConfig> {
    let raw: RawConfig = serde_yaml::from_str(raw_text).map_err(|e| crate::error::CondenseError::Parse {
        format: "config",
        message: e.to_string(),
    })?;

    let mut cfg = ShaperConfig::default();

    if let Some(list) = raw.condense_tools {
        cfg.condense_tools = match list {
            ToolListRaw::All(s) if s == "*" => ToolMatch::All,
            ToolListRaw::All(s) => ToolMatch::Named(vec![s]),
            ToolListRaw::List(names) => ToolMatch::Named(names),
        };
    }
    cfg.toon_only_tools = raw.toon_only_tools;
    cfg.toon_fallback = raw.toon_fallback;
    cfg.min_token_threshold = raw.min_token_threshold;
    if let Some(revert) = raw.revert_if_larger {
        cfg.revert_if_larger = revert;
    }
    cfg.max_token_limit = raw.max_token_limit;
    cfg.tool_token_limits = raw.tool_token_limits;
    if let Some(profile) = raw.profile {
        cfg.profile = Profile::from_name(&profile)?;
    }
    cfg.format_hint = raw.format_hint;
    cfg.tool_format_hints = raw.tool_format_hints;

    cfg.heuristics_override = heuristics_override_from_yaml_map(&raw.heuristics)?;
    for (tool, map) in raw.tool_heuristics {
        cfg.tool_heuristics
            .insert(tool, heuristics_override_from_yaml_map(&map)?);
    }

    Ok(cfg)
}

fn heuristics_override_from_yaml_map(
    map: &HashMap<String, serde_yaml::Value>,
) -> Result<HeuristicsOverride> {
    let mut out = HeuristicsOverride::default();
    for (key, value) in map {
        if !VALID_KEYS.contains(&key.as_str()) {
            return Err(crate::error::CondenseError::UnknownHeuristic {
                key: key.clone(),
                valid: VALID_KEYS.to_vec(),
            });
        }
        out.set(key, &yaml_scalar_to_string(value))?;
    }
    Ok(out)
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}
