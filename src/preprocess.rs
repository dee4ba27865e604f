//! The preprocessor: steps 4–10 of the fixed per-table pipeline (spec §4.3).
//! Steps 1–3 (flatten, KV-pivot, column union) happen in [`crate::table`]
//! while the table is built; identity-column selection ([`crate::identity`])
//! runs between step 3 and step 4 so later steps can protect it.
//!
//! Order is fixed and deliberate: each step observes the column/row state
//! left behind by the previous one.

use chrono::DateTime;

use crate::heuristics::{Heuristics, WideTableFormat};
use crate::table::{Reshape, Table};
use crate::value::Value;

/// Runs preprocessor steps 4–10 against `table` in place, using whatever
/// identity column was already assigned to it.
pub fn run(table: &mut Table, heuristics: &Heuristics) {
    promote_identity(table);
    let identity_labels = capture_identity_labels(table);

    elide_constants(table, heuristics);
    elide_all_zero_and_all_null(table, heuristics);
    elide_mostly_zero(table, heuristics, &identity_labels);
    cluster_timestamps(table, heuristics);
    group_tuples(table, heuristics);
    cap_columns(table, heuristics);
    wide_reshape(table, heuristics);
}

/// Moves the identity column to position 0 unconditionally, not just when
/// `max_table_columns` forces a cap (invariant I2, spec §3/§4.5: "identity
/// column first ... then remaining columns in first-seen order").
fn promote_identity(table: &mut Table) {
    if let Some(name) = table.identity_column.clone() {
        table.promote_to_front(&name);
    }
}

/// Snapshots one display label per row from the identity column (or the row
/// index if there is none) before any column gets dropped out from under it.
fn capture_identity_labels(table: &Table) -> Vec<String> {
    let idx = table
        .identity_column
        .as_deref()
        .and_then(|name| table.column_index(name));
    (0..table.rows.len())
        .map(|row| match idx {
            Some(idx) => table.rows[row][idx].render_plain(),
            None => row.to_string(),
        })
        .collect()
}

fn is_protected(table: &Table, column: &str) -> bool {
    table.identity_column.as_deref() == Some(column)
}

/// Step 4: drop columns whose non-null values are all equal, recording
/// `col=<value>` (spec §4.3.4).
fn elide_constants(table: &mut Table, heuristics: &Heuristics) {
    if !heuristics.elide_constants {
        return;
    }
    let mut idx = 0;
    while idx < table.columns.len() {
        let column = table.columns[idx].clone();
        if is_protected(table, &column) {
            idx += 1;
            continue;
        }
        let mut constant: Option<Value> = None;
        let mut is_constant = true;
        for value in table.column_values(idx) {
            if value.is_null() {
                continue;
            }
            match &constant {
                None => constant = Some(value.clone()),
                Some(existing) if existing == value => {}
                Some(_) => {
                    is_constant = false;
                    break;
                }
            }
        }
        // A column that is constantly zero is left for step 5 so it gets
        // grouped into the "all-zero" annotation list instead of being
        // reported as an ordinary constant (spec §4.3.4/§4.3.5 scenario 2).
        if is_constant && let Some(value) = constant
            && !(heuristics.elide_all_zero && value.is_zero())
        {
            table
                .annotations
                .push(format!("{column}={}", value.render_plain()));
            table.remove_column(idx);
        } else {
            idx += 1;
        }
    }
}

/// Step 5: drop whole-column all-zero or all-null columns, recording grouped
/// `all-zero: [..]` / `all-null: [..]` annotations (spec §4.3.5).
fn elide_all_zero_and_all_null(table: &mut Table, heuristics: &Heuristics) {
    let mut all_null: Vec<String> = Vec::new();
    let mut all_zero: Vec<String> = Vec::new();

    let mut idx = 0;
    while idx < table.columns.len() {
        let column = table.columns[idx].clone();
        if is_protected(table, &column) || table.rows.is_empty() {
            idx += 1;
            continue;
        }
        let mut values = table.column_values(idx);
        if heuristics.elide_all_null && values.all(|v| v.is_empty_ish()) {
            all_null.push(column);
            table.remove_column(idx);
            continue;
        }
        let mut values = table.column_values(idx);
        if heuristics.elide_all_zero && values.all(|v| v.is_zero() || v.is_empty_ish()) {
            all_zero.push(column);
            table.remove_column(idx);
            continue;
        }
        idx += 1;
    }

    if !all_zero.is_empty() {
        table
            .annotations
            .push(format!("all-zero: [{}]", all_zero.join(",")));
    }
    if !all_null.is_empty() {
        table
            .annotations
            .push(format!("all-null: [{}]", all_null.join(",")));
    }
}

/// Step 6: drop columns that are zero in at least `elide_mostly_zero_pct` of
/// rows, recording up to [`crate::heuristics::MOSTLY_ZERO_OUTLIER_CAP`]
/// non-zero outliers by identity (spec §4.3.6).
fn elide_mostly_zero(table: &mut Table, heuristics: &Heuristics, identity_labels: &[String]) {
    if table.rows.is_empty() {
        return;
    }
    let mut idx = 0;
    while idx < table.columns.len() {
        let column = table.columns[idx].clone();
        if is_protected(table, &column) {
            idx += 1;
            continue;
        }
        let zero_count = table.column_values(idx).filter(|v| v.is_zero()).count();
        let fraction = zero_count as f64 / table.rows.len() as f64;
        if fraction < heuristics.elide_mostly_zero_pct {
            idx += 1;
            continue;
        }

        let cap = crate::heuristics::MOSTLY_ZERO_OUTLIER_CAP;
        let mut outliers: Vec<String> = Vec::new();
        for (row_idx, value) in table.column_values(idx).enumerate() {
            if value.is_zero() || value.is_null() {
                continue;
            }
            if outliers.len() < cap {
                outliers.push(format!("{}={}", identity_labels[row_idx], value.render_plain()));
            } else {
                outliers.push("…".to_string());
                break;
            }
        }
        let label = if outliers.is_empty() {
            format!("{column}: mostly-zero")
        } else {
            format!("{column}: mostly-zero [{}]", outliers.join(","))
        };
        table.annotations.push(label);
        table.remove_column(idx);
    }
}

/// Step 7: a column is a timestamp column if every non-null value parses to
/// an absolute instant. If the span is within the clustering window, drop it
/// and annotate with the earliest value (spec §4.3.7).
fn cluster_timestamps(table: &mut Table, heuristics: &Heuristics) {
    if !heuristics.elide_timestamps {
        return;
    }
    let mut idx = 0;
    while idx < table.columns.len() {
        let column = table.columns[idx].clone();
        if is_protected(table, &column) {
            idx += 1;
            continue;
        }
        let parsed: Vec<(i64, String)> = table
            .column_values(idx)
            .filter(|v| !v.is_null())
            .filter_map(|v| v.as_str().and_then(parse_timestamp).map(|ts| (ts, v.render_plain())))
            .collect();
        let non_null_count = table.column_values(idx).filter(|v| !v.is_null()).count();
        if parsed.len() != non_null_count || parsed.is_empty() {
            idx += 1;
            continue;
        }
        let min = parsed.iter().min_by_key(|(ts, _)| *ts).unwrap();
        let max_ts = parsed.iter().map(|(ts, _)| *ts).max().unwrap();
        let span = max_ts - min.0;
        if span.abs() > crate::heuristics::TIMESTAMP_CLUSTER_WINDOW_SECS {
            idx += 1;
            continue;
        }
        table.annotations.push(format!("{column}={}", min.1));
        table.remove_column(idx);
    }
}

fn parse_timestamp(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc().timestamp());
        }
    }
    None
}

/// Step 8: fuse sibling columns sharing the longest common dotted prefix
/// into one positional tuple column (spec §4.3.8). The identity column is
/// never a grouping candidate.
fn group_tuples(table: &mut Table, heuristics: &Heuristics) {
    if !heuristics.group_tuples {
        return;
    }
    let groups = sibling_groups(table, heuristics.max_tuple_size);
    // Apply from the last group to the first so earlier indices stay valid
    // as we splice columns out.
    for group in groups.into_iter().rev() {
        if group.indices.len() < 2 {
            continue;
        }
        let tuple_name = format!(
            "{}.({})",
            group.prefix,
            group.suffixes.join(",")
        );
        let first = group.indices[0];
        let mut new_rows: Vec<Value> = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let cell = group
                .indices
                .iter()
                .map(|&i| row[i].render_plain())
                .collect::<Vec<_>>()
                .join(",");
            new_rows.push(Value::Str(format!("({cell})")));
        }
        // Remove member columns from highest index to lowest, then insert
        // the fused tuple column at the first member's original position.
        for &idx in group.indices.iter().rev() {
            table.remove_column(idx);
        }
        table.columns.insert(first, tuple_name);
        for (row, cell) in table.rows.iter_mut().zip(new_rows) {
            row.insert(first, cell);
        }
    }
}

struct SiblingGroup {
    prefix: String,
    suffixes: Vec<String>,
    indices: Vec<usize>,
}

/// Groups columns (other than the identity column) that share everything up
/// to their last dot segment, in first-seen order, capped at `max_size`.
fn sibling_groups(table: &Table, max_size: usize) -> Vec<SiblingGroup> {
    let mut groups: Vec<SiblingGroup> = Vec::new();
    for (idx, column) in table.columns.iter().enumerate() {
        if is_protected(table, column) {
            continue;
        }
        let Some(split) = column.rfind('.') else {
            continue;
        };
        let (prefix, suffix) = (column[..split].to_string(), column[split + 1..].to_string());
        if !all_short_or_numeric(table, idx) {
            continue;
        }
        match groups.iter_mut().find(|g| g.prefix == prefix) {
            Some(g) if g.indices.len() < max_size => {
                g.suffixes.push(suffix);
                g.indices.push(idx);
            }
            Some(_) => {}
            None => groups.push(SiblingGroup {
                prefix,
                suffixes: vec![suffix],
                indices: vec![idx],
            }),
        }
    }
    groups.retain(|g| g.indices.len() >= 2 && g.indices.len() <= max_size);
    groups
}

const TUPLE_CANDIDATE_MAX_LEN: usize = 32;

fn all_short_or_numeric(table: &Table, idx: usize) -> bool {
    table.column_values(idx).all(|v| match v {
        Value::Int(_) | Value::Float(_) | Value::Null => true,
        Value::Str(s) => s.len() <= TUPLE_CANDIDATE_MAX_LEN,
        _ => false,
    })
}

/// Step 9: if `max_table_columns > 0`, drop rightmost columns beyond the cap
/// after moving the identity column to position 0 (spec §4.3.9).
fn cap_columns(table: &mut Table, heuristics: &Heuristics) {
    if heuristics.max_table_columns == 0 {
        return;
    }
    if let Some(identity) = table.identity_column.clone() {
        table.promote_to_front(&identity);
    }
    while table.columns.len() > heuristics.max_table_columns {
        let last = table.columns.len() - 1;
        table.remove_column(last);
    }
}

/// Step 10: if the remaining column count is at or above the wide-table
/// threshold, replace the table's flat rendering with a vertical or split
/// layout (spec §4.3.10).
fn wide_reshape(table: &mut Table, heuristics: &Heuristics) {
    if heuristics.wide_table_threshold == 0 || table.columns.len() < heuristics.wide_table_threshold
    {
        return;
    }
    match heuristics.wide_table_format {
        WideTableFormat::Vertical => table.reshape = Some(Reshape::Vertical),
        WideTableFormat::Split => {
            let parts = split_by_first_segment(table);
            table.reshape = Some(Reshape::Split(parts));
        }
    }
}

/// Partitions `table`'s columns by their first dot segment (each becoming
/// its own sub-table), repeating the identity column in every partition
/// (spec §4.3.10 "split").
fn split_by_first_segment(table: &Table) -> Vec<Table> {
    let identity_idx = table
        .identity_column
        .as_deref()
        .and_then(|name| table.column_index(name));

    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, column) in table.columns.iter().enumerate() {
        if Some(idx) == identity_idx {
            continue;
        }
        let key = column.split('.').next().unwrap_or(column).to_string();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some(g) => g.1.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }

    groups
        .into_iter()
        .map(|(key, indices)| {
            let mut columns = Vec::new();
            if let Some(identity_idx) = identity_idx {
                columns.push(table.columns[identity_idx].clone());
            }
            columns.extend(indices.iter().map(|&i| table.columns[i].clone()));

            let rows = table
                .rows
                .iter()
                .map(|row| {
                    let mut out = Vec::new();
                    if let Some(identity_idx) = identity_idx {
                        out.push(row[identity_idx].clone());
                    }
                    out.extend(indices.iter().map(|&i| row[i].clone()));
                    out
                })
                .collect();

            Table {
                name: format!("{}.{key}", table.name),
                columns,
                rows,
                annotations: Vec::new(),
                identity_column: table.identity_column.clone(),
                nested: Vec::new(),
                reshape: None,
            }
        })
        .collect()
}
