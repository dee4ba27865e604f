//! Heuristics configuration record and named profiles (spec §3).
//!
//! The option set is closed: [`HeuristicsOverride::from_pairs`] rejects any
//! key outside [`VALID_KEYS`] with [`CondenseError::UnknownHeuristic`],
//! mirroring the teacher's schema validation in `schema.rs` (reject unknown
//! column directives instead of silently ignoring them).

use crate::error::{CondenseError, Result};

/// Timestamp-clustering window in seconds (spec §3/§9): columns whose values
/// all fall within this span of each other collapse into one annotation.
pub const TIMESTAMP_CLUSTER_WINDOW_SECS: i64 = 60;

/// Default cap on fields fused into one tuple column (spec §3/§9).
pub const DEFAULT_MAX_TUPLE_SIZE: usize = 4;

/// Outlier listing cap for mostly-zero elision annotations (spec §4.3 step 6).
pub const MOSTLY_ZERO_OUTLIER_CAP: usize = 5;

pub const VALID_KEYS: &[&str] = &[
    "elide_all_zero",
    "elide_all_null",
    "elide_timestamps",
    "elide_constants",
    "group_tuples",
    "max_tuple_size",
    "elide_mostly_zero_pct",
    "max_table_columns",
    "wide_table_threshold",
    "wide_table_format",
    "pivot_key_value_arrays",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideTableFormat {
    Vertical,
    Split,
}

impl WideTableFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "vertical" => Some(Self::Vertical),
            "split" => Some(Self::Split),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heuristics {
    pub elide_all_zero: bool,
    pub elide_all_null: bool,
    pub elide_timestamps: bool,
    pub elide_constants: bool,
    pub group_tuples: bool,
    pub max_tuple_size: usize,
    pub elide_mostly_zero_pct: f64,
    pub max_table_columns: usize,
    pub wide_table_threshold: usize,
    pub wide_table_format: WideTableFormat,
    pub pivot_key_value_arrays: bool,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            elide_all_zero: true,
            elide_all_null: true,
            elide_timestamps: true,
            elide_constants: true,
            group_tuples: true,
            max_tuple_size: DEFAULT_MAX_TUPLE_SIZE,
            elide_mostly_zero_pct: 1.0,
            max_table_columns: 0,
            wide_table_threshold: 0,
            wide_table_format: WideTableFormat::Vertical,
            pivot_key_value_arrays: true,
        }
    }
}

/// A named heuristic preset (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Balanced,
    Compact,
    Precise,
}

pub const VALID_PROFILES: &[&str] = &["balanced", "compact", "precise"];

impl Profile {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "balanced" => Ok(Self::Balanced),
            "compact" => Ok(Self::Compact),
            "precise" => Ok(Self::Precise),
            other => Err(CondenseError::UnknownProfile {
                name: other.to_string(),
                valid: VALID_PROFILES.to_vec(),
            }),
        }
    }

    pub fn defaults(self) -> Heuristics {
        match self {
            Profile::Balanced => Heuristics::default(),
            Profile::Compact => Heuristics {
                elide_mostly_zero_pct: 0.8,
                max_table_columns: 12,
                wide_table_threshold: 10,
                wide_table_format: WideTableFormat::Split,
                ..Heuristics::default()
            },
            Profile::Precise => Heuristics {
                elide_all_zero: false,
                elide_all_null: false,
                elide_timestamps: false,
                elide_constants: false,
                group_tuples: false,
                pivot_key_value_arrays: false,
                ..Heuristics::default()
            },
        }
    }
}

/// A partial heuristics record used for deep-merge overrides (server-level
/// `heuristics` config and per-tool `tool_heuristics`, spec §6/§9). Every
/// field absent in the override leaves the base value untouched.
#[derive(Debug, Clone, Default)]
pub struct HeuristicsOverride {
    pub elide_all_zero: Option<bool>,
    pub elide_all_null: Option<bool>,
    pub elide_timestamps: Option<bool>,
    pub elide_constants: Option<bool>,
    pub group_tuples: Option<bool>,
    pub max_tuple_size: Option<usize>,
    pub elide_mostly_zero_pct: Option<f64>,
    pub max_table_columns: Option<usize>,
    pub wide_table_threshold: Option<usize>,
    pub wide_table_format: Option<WideTableFormat>,
    pub pivot_key_value_arrays: Option<bool>,
}

impl HeuristicsOverride {
    /// Parses `key:val` pairs (e.g. from `CONDENSER_HEURISTICS`) into an
    /// override record. Values are coerced bool → int → float → string by
    /// successive try (spec §6); unknown keys are a hard configuration error.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut out = Self::default();
        for (key, raw) in pairs {
            out.set(key, raw)?;
        }
        Ok(out)
    }

    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        match key {
            "elide_all_zero" => self.elide_all_zero = Some(parse_bool(raw)),
            "elide_all_null" => self.elide_all_null = Some(parse_bool(raw)),
            "elide_timestamps" => self.elide_timestamps = Some(parse_bool(raw)),
            "elide_constants" => self.elide_constants = Some(parse_bool(raw)),
            "group_tuples" => self.group_tuples = Some(parse_bool(raw)),
            "max_tuple_size" => self.max_tuple_size = raw.parse::<usize>().ok(),
            "elide_mostly_zero_pct" => self.elide_mostly_zero_pct = raw.parse::<f64>().ok(),
            "max_table_columns" => self.max_table_columns = raw.parse::<usize>().ok(),
            "wide_table_threshold" => self.wide_table_threshold = raw.parse::<usize>().ok(),
            "wide_table_format" => self.wide_table_format = WideTableFormat::parse(raw),
            "pivot_key_value_arrays" => self.pivot_key_value_arrays = Some(parse_bool(raw)),
            other => {
                return Err(CondenseError::UnknownHeuristic {
                    key: other.to_string(),
                    valid: VALID_KEYS.to_vec(),
                });
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, base: Heuristics) -> Heuristics {
        Heuristics {
            elide_all_zero: self.elide_all_zero.unwrap_or(base.elide_all_zero),
            elide_all_null: self.elide_all_null.unwrap_or(base.elide_all_null),
            elide_timestamps: self.elide_timestamps.unwrap_or(base.elide_timestamps),
            elide_constants: self.elide_constants.unwrap_or(base.elide_constants),
            group_tuples: self.group_tuples.unwrap_or(base.group_tuples),
            max_tuple_size: self.max_tuple_size.unwrap_or(base.max_tuple_size),
            elide_mostly_zero_pct: self
                .elide_mostly_zero_pct
                .unwrap_or(base.elide_mostly_zero_pct),
            max_table_columns: self.max_table_columns.unwrap_or(base.max_table_columns),
            wide_table_threshold: self
                .wide_table_threshold
                .unwrap_or(base.wide_table_threshold),
            wide_table_format: self.wide_table_format.unwrap_or(base.wide_table_format),
            pivot_key_value_arrays: self
                .pivot_key_value_arrays
                .unwrap_or(base.pivot_key_value_arrays),
        }
    }
}

/// `false/0/no` (case-insensitive) parse as false; everything else is true
/// (spec §6's env-var boolean coercion rule).
fn parse_bool(raw: &str) -> bool {
    !matches!(raw.to_ascii_lowercase().as_str(), "false" | "0" | "no")
}

/// Resolves the effective heuristics from `profile → server heuristics →
/// tool_heuristics`, each step a deep-merge on top of the previous (spec §9).
pub fn resolve(
    profile: Profile,
    server_override: &HeuristicsOverride,
    tool_override: Option<&HeuristicsOverride>,
) -> Heuristics {
    let base = profile.defaults();
    let merged = server_override.apply_to(base);
    match tool_override {
        Some(tool) => tool.apply_to(merged),
        None => merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_is_rejected() {
        let err = HeuristicsOverride::from_pairs([("not_a_real_key", "true")]).unwrap_err();
        assert!(matches!(err, CondenseError::UnknownHeuristic { .. }));
    }

    #[test]
    fn bool_coercion_follows_false_list() {
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("no"));
        assert!(parse_bool("true"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("1"));
    }

    #[test]
    fn profile_tool_precedence_matches_deep_merge() {
        let server = HeuristicsOverride::from_pairs([("max_tuple_size", "6")]).unwrap();
        let tool = HeuristicsOverride::from_pairs([("max_tuple_size", "2")]).unwrap();
        let resolved = resolve(Profile::Balanced, &server, Some(&tool));
        assert_eq!(resolved.max_tuple_size, 2);
        assert!(resolved.elide_all_zero); // untouched default carries through
    }

    #[test]
    fn unknown_profile_name_is_rejected() {
        assert!(Profile::from_name("turbo").is_err());
    }

    #[test]
    fn compact_profile_enables_split_wide_tables() {
        let heuristics = Profile::Compact.defaults();
        assert_eq!(heuristics.wide_table_format, WideTableFormat::Split);
        assert!(heuristics.wide_table_threshold > 0);
    }

    #[test]
    fn precise_profile_disables_all_elisions() {
        let heuristics = Profile::Precise.defaults();
        assert!(!heuristics.elide_all_zero);
        assert!(!heuristics.elide_constants);
        assert!(!heuristics.group_tuples);
    }
}
