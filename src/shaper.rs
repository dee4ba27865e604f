//! Response shaper (spec §4.6): wraps the condensation pipeline with policy
//! — which tools get the full pipeline vs. raw TOON vs. passthrough, the
//! threshold/revert gates, and hard token-cap truncation.

use std::collections::HashMap;

use crate::heuristics::{self, Heuristics, HeuristicsOverride, Profile};
use crate::parsers;
use crate::tokens::{self, TokenCounter};
use crate::toon;

/// Which tools enter the full preprocessing pipeline.
#[derive(Debug, Clone)]
pub enum ToolMatch {
    All,
    Named(Vec<String>),
}

impl ToolMatch {
    pub fn matches(&self, tool: &str) -> bool {
        match self {
            ToolMatch::All => true,
            ToolMatch::Named(names) => names.iter().any(|n| n == tool),
        }
    }
}

impl Default for ToolMatch {
    fn default() -> Self {
        ToolMatch::All
    }
}

/// The full policy record consumed by [`condense_text`] (spec §6).
#[derive(Debug, Clone)]
pub struct ShaperConfig {
    pub condense_tools: ToolMatch,
    pub toon_only_tools: Vec<String>,
    pub toon_fallback: bool,
    pub min_token_threshold: u32,
    pub revert_if_larger: bool,
    pub max_token_limit: u32,
    pub tool_token_limits: HashMap<String, u32>,
    pub profile: Profile,
    pub heuristics_override: HeuristicsOverride,
    pub tool_heuristics: HashMap<String, HeuristicsOverride>,
    pub format_hint: Option<String>,
    pub tool_format_hints: HashMap<String, String>,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            condense_tools: ToolMatch::All,
            toon_only_tools: Vec::new(),
            toon_fallback: false,
            min_token_threshold: 0,
            revert_if_larger: true,
            max_token_limit: 0,
            tool_token_limits: HashMap::new(),
            profile: Profile::Balanced,
            heuristics_override: HeuristicsOverride::default(),
            tool_heuristics: HashMap::new(),
            format_hint: None,
            tool_format_hints: HashMap::new(),
        }
    }
}

impl ShaperConfig {
    fn effective_heuristics(&self, tool: &str) -> Heuristics {
        heuristics::resolve(
            self.profile,
            &self.heuristics_override,
            self.tool_heuristics.get(tool),
        )
    }

    fn format_hint_for(&self, tool: &str) -> Option<&str> {
        self.tool_format_hints
            .get(tool)
            .map(String::as_str)
            .or(self.format_hint.as_deref())
    }

    fn token_limit_for(&self, tool: &str) -> u32 {
        self.tool_token_limits
            .get(tool)
            .copied()
            .unwrap_or(self.max_token_limit)
    }
}

enum Mode {
    Full,
    Raw,
    Passthrough,
}

fn mode_for(cfg: &ShaperConfig, tool: &str) -> Mode {
    if cfg.toon_only_tools.iter().any(|n| n == tool) {
        Mode::Raw
    } else if cfg.condense_tools.matches(tool) {
        Mode::Full
    } else if cfg.toon_fallback {
        Mode::Raw
    } else {
        Mode::Passthrough
    }
}

/// Runs the shaper over a raw tool response (spec §4.6/§6).
pub fn condense_text(raw: &[u8], tool: &str, cfg: &ShaperConfig) -> String {
    let raw_text = String::from_utf8_lossy(raw).to_string();

    let mode = mode_for(cfg, tool);
    if matches!(mode, Mode::Passthrough) {
        metrics::counter!("toon_condense_passthrough").increment(1);
        return raw_text;
    }

    let hint = cfg.format_hint_for(tool);
    let tree = match parsers::parse(&raw_text, hint) {
        Ok(tree) => tree,
        Err(err) => {
            log::debug!("condense_text: parse failed for tool '{tool}': {err}");
            metrics::counter!("toon_condense_parse_fail").increment(1);
            return raw_text;
        }
    };

    let candidate = match mode {
        Mode::Raw => toon::encode_toon(&tree),
        Mode::Full => {
            let effective = cfg.effective_heuristics(tool);
            toon::condense_value(&tree, &effective)
        }
        Mode::Passthrough => unreachable!("handled above"),
    };

    let counter = tokens::default_counter();

    // Step 4: threshold gate.
    if counter.count(&raw_text) < cfg.min_token_threshold {
        metrics::counter!("toon_condense_passthrough").increment(1);
        return raw_text;
    }

    // Step 5: revert-if-larger.
    if cfg.revert_if_larger && counter.count(&candidate) >= counter.count(&raw_text) {
        metrics::counter!("toon_condense_reverted").increment(1);
        return raw_text;
    }

    // Step 6: hard cap via binary-search truncation.
    let limit = cfg.token_limit_for(tool);
    if limit > 0 && counter.count(&candidate) > limit {
        metrics::counter!("toon_condense_truncated").increment(1);
        return truncate_to_limit(&candidate, limit, counter);
    }

    metrics::counter!("toon_condense_condensed").increment(1);
    candidate
}

/// Truncates `text` to the longest prefix (on a character boundary) whose
/// token count plus the truncation notice's fits within `limit`, then
/// appends the notice (spec §4.6.6, invariant I5).
fn truncate_to_limit(text: &str, limit: u32, counter: &dyn TokenCounter) -> String {
    let overage = counter.count(text).saturating_sub(limit);
    let notice = format!("\n…[truncated: {overage} tokens over limit]");
    let notice_tokens = counter.count(&notice);
    let budget = limit.saturating_sub(notice_tokens);

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let split = boundaries.partition_point(|&cut| counter.count(&text[..cut]) <= budget);
    let cut = if split == 0 { 0 } else { boundaries[split - 1] };

    format!("{}{notice}", &text[..cut])
}
