//! Identity-column picker (spec §4.2): decides which column, if any, names
//! each row well enough to caption elided/outlier annotations with it.

use std::sync::OnceLock;

use regex::Regex;

use crate::table::Table;
use crate::value::Value;

/// Ordered keyword list (spec §4.2): `name` outranks `id` outranks `key`, and
/// so on. The first keyword with any matching column wins, even if a
/// lower-priority keyword's column has higher cardinality.
const IDENTITY_KEYWORDS: &[&str] = &["name", "id", "key", "host", "pod", "node", "instance"];

/// One keyword's exact-match and suffix-match patterns (`pod.name`,
/// `host_id`), checked in that order so an exact column name wins over a
/// dotted/underscored suffix match for the same keyword.
struct KeywordPattern {
    exact: Regex,
    suffix: Regex,
}

fn keyword_patterns() -> &'static [KeywordPattern] {
    static PATTERNS: OnceLock<Vec<KeywordPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        IDENTITY_KEYWORDS
            .iter()
            .map(|keyword| KeywordPattern {
                exact: Regex::new(&format!(r"(?i)^{keyword}$")).expect("static pattern is valid"),
                suffix: Regex::new(&format!(r"(?i)[._]{keyword}$"))
                    .expect("static pattern is valid"),
            })
            .collect()
    })
}

/// Picks the identity column for `table`: walks the keyword list in priority
/// order and, for the first keyword that matches any column (exact matches
/// before suffix matches), returns the matching column with the highest
/// cardinality (ties broken by first-seen column order). Failing that, the
/// first column whose cardinality equals the row count (i.e. every value is
/// unique), or `None`.
pub fn pick(table: &Table) -> Option<String> {
    if table.rows.is_empty() {
        return None;
    }

    for pattern in keyword_patterns() {
        let exact_matches = matching_columns(table, |name| pattern.exact.is_match(name));
        if let Some(idx) = best_by_cardinality(table, &exact_matches) {
            return Some(table.columns[idx].clone());
        }

        let suffix_matches = matching_columns(table, |name| pattern.suffix.is_match(name));
        if let Some(idx) = best_by_cardinality(table, &suffix_matches) {
            return Some(table.columns[idx].clone());
        }
    }

    let row_count = table.rows.len();
    for (idx, _) in table.columns.iter().enumerate() {
        if cardinality(table, idx) == row_count {
            return Some(table.columns[idx].clone());
        }
    }

    None
}

fn matching_columns(table: &Table, matches: impl Fn(&str) -> bool) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| matches(name))
        .map(|(idx, _)| idx)
        .collect()
}

/// Highest-cardinality column among `candidates`, ties broken by first-seen
/// order. `candidates` is already in first-seen order, so a strict `>` keeps
/// the earliest index on a tie instead of `Iterator::max_by_key`'s
/// last-wins behavior.
fn best_by_cardinality(table: &Table, candidates: &[usize]) -> Option<usize> {
    candidates.iter().copied().fold(None, |best, idx| match best {
        None => Some(idx),
        Some(current) if cardinality(table, idx) > cardinality(table, current) => Some(idx),
        Some(current) => Some(current),
    })
}

fn cardinality(table: &Table, idx: usize) -> usize {
    let mut seen: Vec<&Value> = Vec::new();
    for row in &table.rows {
        let value = &row[idx];
        if value.is_null() {
            continue;
        }
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen.len()
}
