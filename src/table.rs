//! Table detection and construction: turns an `Arr` of `Obj`s into a [`Table`]
//! (spec §3/§4.2), applying preprocessor steps 1–3 (flatten, KV-pivot, column
//! union) since those are what "being a table" means in the first place.

use itertools::Itertools;

use crate::heuristics::Heuristics;
use crate::value::{collect_object_arrays, flatten_row, Value};

/// A table derived from an `Arr` of homogeneous-ish `Obj`s.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rendered annotation fragments, in application order (invariant I3:
    /// every elided column is recorded here).
    pub annotations: Vec<String>,
    pub identity_column: Option<String>,
    pub nested: Vec<NestedTable>,
    pub reshape: Option<Reshape>,
}

/// A single-level nested sub-table extracted from an object-array field
/// (spec §4.4), referenced back to its parent by the parent's identity value.
#[derive(Debug, Clone)]
pub struct NestedTable {
    pub field: String,
    pub table: Table,
}

#[derive(Debug, Clone)]
pub enum Reshape {
    Vertical,
    Split(Vec<Table>),
}

impl Table {
    /// True iff `col` has the same value in every row of `table.rows` after
    /// excluding nulls, i.e. it is a constant column (spec §4.3 step 4).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Removes a column by index, keeping every row's remaining cells aligned
    /// (invariant I4).
    pub fn remove_column(&mut self, idx: usize) {
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }

    /// Moves the named column to position 0, a no-op if already first or
    /// absent (used before column capping, spec §4.3 step 9).
    pub fn promote_to_front(&mut self, name: &str) {
        let Some(idx) = self.column_index(name) else {
            return;
        };
        if idx == 0 {
            return;
        }
        let col = self.columns.remove(idx);
        self.columns.insert(0, col);
        for row in &mut self.rows {
            let cell = row.remove(idx);
            row.insert(0, cell);
        }
    }
}

/// Checks whether `items` qualifies as a table (spec §4.2): every element is
/// an `Obj`, and the union of flattened keys yields at least 2 columns with
/// at least 1 data row.
pub fn is_table(items: &[Value]) -> bool {
    if items.is_empty() || !items.iter().all(|v| v.as_obj().is_some()) {
        return false;
    }
    let mut columns: Vec<String> = Vec::new();
    for item in items {
        let Some(row) = flatten_row(item) else {
            continue;
        };
        for (path, _) in &row.fields {
            if !columns.contains(path) {
                columns.push(path.clone());
            }
        }
    }
    columns.len() >= 2
}

/// Builds a [`Table`] from `items` (preprocessor steps 1–3: flatten rows to
/// dot-paths, pivot `{Key,Value}` arrays, union columns with `Null` fill).
/// Extracts single-level nested sub-tables from any leftover object-array
/// fields (spec §4.4).
pub fn build_table(name: &str, items: &[Value], heuristics: &Heuristics) -> Table {
    build_table_inner(name, items, heuristics, true)
}

fn build_table_inner(
    name: &str,
    items: &[Value],
    heuristics: &Heuristics,
    extract_nested: bool,
) -> Table {
    let mut row_maps: Vec<Vec<(String, Value)>> = Vec::new();
    let mut nested_candidates: Vec<(String, Vec<Value>)> = Vec::new();

    for item in items {
        let mut fields = flatten_row(item).map(|r| r.fields).unwrap_or_default();

        for (field_name, elements) in collect_object_arrays(item) {
            if heuristics.pivot_key_value_arrays && is_kv_pivot_shape(&elements) {
                for element in &elements {
                    let obj = element.as_obj().expect("kv shape checked");
                    let key = obj.get("Key").and_then(Value::as_str).unwrap_or_default();
                    let value = obj.get("Value").cloned().unwrap_or(Value::Null);
                    fields.push((format!("{field_name}.{key}"), value));
                }
            } else if !elements.is_empty() {
                nested_candidates.push((field_name, elements));
            }
        }

        row_maps.push(fields);
    }

    // Union columns across all rows, keeping first-seen order (spec §4.3.3).
    let columns: Vec<String> = row_maps
        .iter()
        .flat_map(|fields| fields.iter().map(|(path, _)| path.clone()))
        .unique()
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(row_maps.len());
    for fields in &row_maps {
        let mut row = Vec::with_capacity(columns.len());
        for col in &columns {
            let value = fields
                .iter()
                .find(|(p, _)| p == col)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null);
            row.push(value);
        }
        rows.push(row);
    }

    // Single-level extraction only (spec §9 open question): a sub-table's own
    // leftover object-array fields are dropped rather than extracted again.
    let nested = if extract_nested {
        build_nested_tables(nested_candidates)
    } else {
        Vec::new()
    };

    Table {
        name: name.to_string(),
        columns,
        rows,
        annotations: Vec::new(),
        identity_column: None,
        nested,
        reshape: None,
    }
}

fn is_kv_pivot_shape(elements: &[Value]) -> bool {
    !elements.is_empty()
        && elements.iter().all(|el| {
            el.as_obj().is_some_and(|obj| {
                obj.len() == 2 && obj.contains_key("Key") && obj.contains_key("Value")
            })
        })
}

/// Groups un-pivoted object-array fields by name and builds one sub-table per
/// field, single-level only (spec §4.4/§9 — no recursive extraction of a
/// sub-table's own nested arrays).
fn build_nested_tables(candidates: Vec<(String, Vec<Value>)>) -> Vec<NestedTable> {
    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for (name, elements) in candidates {
        if let Some(slot) = grouped.iter_mut().find(|(n, _)| *n == name) {
            slot.1.extend(elements);
        } else {
            grouped.push((name, elements));
        }
    }

    let mut out = Vec::new();
    for (name, elements) in grouped {
        if !is_table(&elements) {
            continue;
        }
        let heuristics = Heuristics {
            pivot_key_value_arrays: false,
            ..Heuristics::default()
        };
        let table = build_table_inner(&name, &elements, &heuristics, false);
        out.push(NestedTable { field: name, table });
    }
    out
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
    fn single_column_array_is_not_a_table() {
        let items = vec![
            obj(&[("name", Value::Str("a".into()))]),
            obj(&[("name", Value::Str("b".into()))]),
        ];
        assert!(!is_table(&items));
    }

    #[test]
    fn two_column_array_is_a_table() {
        let items = vec![
            obj(&[("name", Value::Str("a".into())), ("id", Value::Int(1))]),
            obj(&[("name", Value::Str("b".into())), ("id", Value::Int(2))]),
        ];
        assert!(is_table(&items));
    }

    #[test]
    fn missing_keys_fill_with_null() {
        let items = vec![
            obj(&[("a", Value::Int(1)), ("b", Value::Int(2))]),
            obj(&[("a", Value::Int(3))]),
        ];
        let table = build_table("t", &items, &Heuristics::default());
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows[1][1], Value::Null);
    }

    #[test]
    fn kv_pivot_arrays_become_scalar_columns() {
        let mut tags = OrderedMap::new();
        tags.insert("Key", Value::Str("Environment".into()));
        tags.insert("Value", Value::Str("prod".into()));
        let mut tags2 = OrderedMap::new();
        tags2.insert("Key", Value::Str("Team".into()));
        tags2.insert("Value", Value::Str("data".into()));
        let items = vec![obj(&[
            ("id", Value::Int(1)),
            ("Tags", Value::Arr(vec![Value::Obj(tags), Value::Obj(tags2)])),
        ])];
        let table = build_table("t", &items, &Heuristics::default());
        assert!(table.columns.contains(&"Tags.Environment".to_string()));
        assert!(table.columns.contains(&"Tags.Team".to_string()));
        assert!(!table.columns.contains(&"Tags".to_string()));
    }

    #[test]
    fn non_kv_object_arrays_become_nested_tables() {
        let mut container = OrderedMap::new();
        container.insert("name", Value::Str("nginx".into()));
        container.insert("image", Value::Str("nginx:1.25".into()));
        let items = vec![obj(&[
            ("id", Value::Int(1)),
            ("containers", Value::Arr(vec![Value::Obj(container)])),
        ])];
        let table = build_table("t", &items, &Heuristics::default());
        assert!(!table.columns.iter().any(|c| c.starts_with("containers")));
        assert_eq!(table.nested.len(), 1);
        assert_eq!(table.nested[0].field, "containers");
    }
}
