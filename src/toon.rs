//! TOON serializer (spec §4.5): renders a [`Value`] tree, optionally after
//! table preprocessing, as compact tabular text.
//!
//! No repo in the retrieval pack emits TOON; this is grounded on the general
//! shape of `other_examples/`'s TOON encoders plus the wire format spelled
//! out in the specification itself.

use crate::heuristics::Heuristics;
use crate::identity;
use crate::preprocess;
use crate::table::{self, NestedTable, Reshape, Table};
use crate::value::{OrderedMap, Value};

/// Encodes `tree` with no semantic preprocessing: arrays of objects still
/// become table blocks (that much is structural, not a heuristic), but none
/// of the elision/grouping/reshape steps run.
pub fn encode_toon(tree: &Value) -> String {
    render_tree(tree, None)
}

/// Runs the full preprocessing pipeline per table, then renders.
pub fn condense_value(tree: &Value, heuristics: &Heuristics) -> String {
    render_tree(tree, Some(heuristics))
}

fn raw_heuristics() -> Heuristics {
    Heuristics {
        elide_all_zero: false,
        elide_all_null: false,
        elide_timestamps: false,
        elide_constants: false,
        group_tuples: false,
        elide_mostly_zero_pct: 1.0,
        max_table_columns: 0,
        wide_table_threshold: 0,
        pivot_key_value_arrays: false,
        ..Heuristics::default()
    }
}

enum Block {
    Scalar(String),
    Table(Table),
}

fn render_tree(tree: &Value, heuristics: Option<&Heuristics>) -> String {
    let blocks = match tree {
        Value::Obj(map) => collect_blocks(map, heuristics),
        Value::Arr(items) if table::is_table(items) => {
            vec![Block::Table(build_and_prepare("table", items, heuristics))]
        }
        other => vec![Block::Scalar(other.render_plain())],
    };

    let mut sections = Vec::new();
    for block in &blocks {
        match block {
            Block::Scalar(text) => sections.push(text.clone()),
            Block::Table(table) => sections.push(render_table(table)),
        }
    }
    sections.join("\n\n")
}

fn collect_blocks(map: &OrderedMap, heuristics: Option<&Heuristics>) -> Vec<Block> {
    let mut scalar_lines: Vec<String> = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();

    for (key, value) in map.iter() {
        match value {
            Value::Arr(items) if table::is_table(items) => {
                flush_scalars(&mut scalar_lines, &mut blocks);
                blocks.push(Block::Table(build_and_prepare(key, items, heuristics)));
            }
            Value::Obj(nested) => {
                for (path, leaf) in flatten_prefixed(key, nested) {
                    scalar_lines.push(format!("{path}: {}", render_scalar_cell(&leaf)));
                }
            }
            scalar => {
                scalar_lines.push(format!("{key}: {}", render_scalar_cell(scalar)));
            }
        }
    }
    flush_scalars(&mut scalar_lines, &mut blocks);
    blocks
}

fn flush_scalars(scalar_lines: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if !scalar_lines.is_empty() {
        blocks.push(Block::Scalar(scalar_lines.join("\n")));
        scalar_lines.clear();
    }
}

fn flatten_prefixed(prefix: &str, obj: &OrderedMap) -> Vec<(String, Value)> {
    let row = crate::value::flatten_row(&Value::Obj(obj.clone())).unwrap_or_default();
    row.fields
        .into_iter()
        .map(|(path, v)| (format!("{prefix}.{path}"), v))
        .collect()
}

fn build_and_prepare(name: &str, items: &[Value], heuristics: Option<&Heuristics>) -> Table {
    match heuristics {
        Some(h) => {
            let mut table = table::build_table(name, items, h);
            table.identity_column = identity::pick(&table);
            preprocess::run(&mut table, h);
            for nested in &mut table.nested {
                prepare_nested(&mut nested.table, h);
            }
            table
        }
        None => {
            let neutral = raw_heuristics();
            let mut table = table::build_table(name, items, &neutral);
            table.identity_column = identity::pick(&table);
            if let Some(name) = table.identity_column.clone() {
                table.promote_to_front(&name);
            }
            table
        }
    }
}

/// Runs identity-picking and preprocessing on a single-level nested
/// sub-table (spec §4.4) the same way the top-level table gets prepared, so
/// nested tables condense just as aggressively (constants/zeros/timestamps
/// elided, tuples grouped) rather than rendering every raw row.
fn prepare_nested(table: &mut Table, heuristics: &Heuristics) {
    table.identity_column = identity::pick(table);
    preprocess::run(table, heuristics);
}

fn render_table(table: &Table) -> String {
    let mut out = match &table.reshape {
        Some(Reshape::Vertical) => render_vertical(table),
        Some(Reshape::Split(parts)) => parts
            .iter()
            .map(render_table)
            .collect::<Vec<_>>()
            .join("\n\n"),
        None => render_flat(table),
    };

    for nested in &table.nested {
        out.push_str("\n\n");
        out.push_str(&render_nested(table, nested));
    }
    out
}

fn render_nested(parent: &Table, nested: &NestedTable) -> String {
    let mut renamed = nested.table.clone();
    renamed.name = format!("{}.{}", parent.name, nested.field);
    render_table(&renamed)
}

fn header_line(table: &Table) -> String {
    if table.annotations.is_empty() {
        format!("# {}", table.name)
    } else {
        format!("# {} [{}]", table.name, table.annotations.join(", "))
    }
}

fn render_flat(table: &Table) -> String {
    let mut lines = vec![header_line(table), table.columns.join("|")];
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(render_cell).collect();
        lines.push(cells.join("|"));
    }
    lines.join("\n")
}

fn render_vertical(table: &Table) -> String {
    let mut lines = vec![header_line(table)];
    for (row_idx, row) in table.rows.iter().enumerate() {
        let label = table
            .identity_column
            .as_deref()
            .and_then(|name| table.column_index(name))
            .map(|idx| row[idx].render_plain())
            .unwrap_or_else(|| row_idx.to_string());
        lines.push(format!("{label}:"));
        for (col, value) in table.columns.iter().zip(row.iter()) {
            if Some(col.as_str()) == table.identity_column.as_deref() {
                continue;
            }
            lines.push(format!("  {col}: {}", render_cell(value)));
        }
    }
    lines.join("\n")
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Str(s) => render_string_cell(s),
        other => other.render_plain(),
    }
}

fn render_scalar_cell(value: &Value) -> String {
    match value {
        Value::Str(s) => render_string_cell(s),
        other => other.render_plain(),
    }
}

/// JSON-quotes a string if it contains a pipe, a newline, or leading/trailing
/// whitespace (spec §4.5); otherwise renders it bare.
fn render_string_cell(s: &str) -> String {
    let needs_quoting = s.contains('|') || s.contains('\n') || s.trim() != s;
    if needs_quoting {
        serde_json::to_string(s).unwrap_or_else(|_| s.to_string())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OrderedMap;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        let mut m = OrderedMap::new();
        for (k, v) in pairs {
            m.insert(*k, v.clone());
        }
        Value::Obj(m)
    }

    #[test]
    fn scalar_block_renders_key_value_lines() {
        let mut root = OrderedMap::new();
        root.insert("status", Value::Str("ok".into()));
        root.insert("count", Value::Int(3));
        let text = encode_toon(&Value::Obj(root));
        assert_eq!(text, "status: ok\ncount: 3");
    }

    #[test]
    fn table_block_has_hash_header_and_pipe_rows() {
        let mut root = OrderedMap::new();
        let rows = vec![
            obj(&[("name", Value::Str("a".into())), ("id", Value::Int(1))]),
            obj(&[("name", Value::Str("b".into())), ("id", Value::Int(2))]),
        ];
        root.insert("pods", Value::Arr(rows));
        let text = encode_toon(&Value::Obj(root));
        assert!(text.starts_with("# pods"));
        assert!(text.contains("name|id") || text.contains("id|name"));
    }

    #[test]
    fn strings_with_pipe_are_json_quoted() {
        assert_eq!(render_cell(&Value::Str("a|b".into())), "\"a|b\"");
        assert_eq!(render_cell(&Value::Str("plain".into())), "plain");
    }

    #[test]
    fn condense_value_annotates_constant_column() {
        let rows = vec![
            obj(&[("name", Value::Str("a".into())), ("ns", Value::Str("default".into()))]),
            obj(&[("name", Value::Str("b".into())), ("ns", Value::Str("default".into()))]),
        ];
        let mut root = OrderedMap::new();
        root.insert("pods", Value::Arr(rows));
        let text = condense_value(&Value::Obj(root), &Heuristics::default());
        assert!(text.contains("ns=default"));
        let columns_line = text.lines().nth(1).expect("columns line");
        assert_eq!(columns_line, "name");
    }

    #[test]
    fn determinism_same_input_same_output() {
        let rows = vec![
            obj(&[("name", Value::Str("a".into())), ("v", Value::Int(1))]),
            obj(&[("name", Value::Str("b".into())), ("v", Value::Int(2))]),
        ];
        let mut root = OrderedMap::new();
        root.insert("items", Value::Arr(rows));
        let tree = Value::Obj(root);
        let first = condense_value(&tree, &Heuristics::default());
        let second = condense_value(&tree, &Heuristics::default());
        assert_eq!(first, second);
    }
}
