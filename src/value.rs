//! The generic value tree every parser produces and every later stage consumes.
//!
//! [`Value`] mirrors the handful of shapes JSON/YAML/CSV/XML all reduce to: a
//! tagged union of scalars plus ordered arrays and objects. Object key order is
//! insertion order and is significant for deterministic TOON output (I1/I2 in
//! the data model).

use std::fmt;

/// Recursion/extraction depth limit (spec §5). Beyond this, sub-trees are
/// rendered as raw JSON text instead of being walked further.
pub const MAX_DEPTH: usize = 64;

/// An ordered string-keyed map. A `Vec` of pairs is used instead of a hash map
/// so insertion order is preserved without pulling in an extra dependency the
/// teacher's stack doesn't already carry (determinism invariant I1/§9).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap {
    entries: Vec<(String, Value)>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for OrderedMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The tagged value tree shared by every parser and preprocessing stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Arr(Vec<Value>),
    Obj(OrderedMap),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&OrderedMap> {
        match self {
            Value::Obj(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&[Value]> {
        match self {
            Value::Arr(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// True when this value is "empty" for the purposes of all-null/zero
    /// elision: a null, an empty string, or an empty array/object.
    pub fn is_empty_ish(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::Arr(items) => items.is_empty(),
            Value::Obj(map) => map.is_empty(),
            _ => false,
        }
    }

    /// True when this value is numerically zero (for all-zero/mostly-zero
    /// elision). Non-numeric values are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(0) => true,
            Value::Float(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Renders a value the way a cell or scalar wants to see it as text,
    /// without any TOON-specific quoting rules (those live in `toon.rs`).
    pub fn render_plain(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            Value::Arr(_) | Value::Obj(_) => {
                // Callers should have already extracted/flattened these; this
                // is a defensive fallback, not a normal code path.
                serde_json::to_string(&value_to_json(self)).unwrap_or_default()
            }
        }
    }
}

/// Shortest round-trip float rendering without scientific notation, per the
/// TOON serializer contract (spec §4.5).
pub fn format_float(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let mut s = format!("{value}");
    if s.contains('e') || s.contains('E') {
        s = format!("{value:.17}");
        while s.contains('.') && (s.ends_with('0') || s.ends_with('.')) {
            s.pop();
        }
    }
    s
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_plain())
    }
}

/// Converts our tree to `serde_json::Value`, used only as a last-resort
/// fallback renderer for depth-exceeded sub-trees (spec §5/§7).
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Arr(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Obj(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.iter() {
                out.insert(k.to_string(), value_to_json(v));
            }
            serde_json::Value::Object(out)
        }
    }
}

/// A dot-path flattening of scalar leaves, used by the table preprocessor
/// (spec §4.3 step 1). List-valued fields are skipped (they're handled
/// separately as KV-pivot candidates or sub-tables).
///
/// Returns `None` if the depth limit is hit; callers fall back to rendering
/// the offending sub-tree as raw JSON (spec §5/§7 `ExtractionDepthExceeded`).
pub fn flatten_row(value: &Value) -> Option<FlattenedRow> {
    let mut row = FlattenedRow::default();
    flatten_into(value, String::new(), 0, &mut row)?;
    Some(row)
}

/// Insertion-ordered flattened row: `(dot.path, scalar value)`.
#[derive(Debug, Clone, Default)]
pub struct FlattenedRow {
    pub fields: Vec<(String, Value)>,
}

impl FlattenedRow {
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }
}

fn flatten_into(
    value: &Value,
    prefix: String,
    depth: usize,
    out: &mut FlattenedRow,
) -> Option<()> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Obj(map) => {
            for (key, v) in map.iter() {
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(v, path, depth + 1, out)?;
            }
        }
        Value::Arr(items) => {
            // List-valued fields are skipped during row flattening (spec §4.2);
            // nested-table extraction and KV-pivot handle arrays separately.
            // An array of scalars encountered as a sibling of other scalars is
            // flattened positionally so the data isn't silently dropped.
            if items.iter().all(is_scalar) {
                for (idx, item) in items.iter().enumerate() {
                    let path = format!("{prefix}.{idx}");
                    out.fields.push((path, item.clone()));
                }
            }
            // Arrays of objects are left for the caller (table/sub-table logic).
        }
        scalar => {
            if !prefix.is_empty() {
                out.fields.push((prefix, scalar.clone()));
            }
        }
    }
    Some(())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Arr(_) | Value::Obj(_))
}

/// Walks `value` the same way [`flatten_row`] does, but collects the
/// object-array fields that flattening skips: `(dot.path, elements)` for
/// every array whose members are all `Obj`s (empty arrays excluded). These
/// are the KV-pivot and nested-table candidates (spec §4.3 step 2, §4.4).
pub fn collect_object_arrays(value: &Value) -> Vec<(String, Vec<Value>)> {
    let mut out = Vec::new();
    collect_object_arrays_into(value, String::new(), 0, &mut out);
    out
}

fn collect_object_arrays_into(
    value: &Value,
    prefix: String,
    depth: usize,
    out: &mut Vec<(String, Vec<Value>)>,
) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Obj(map) => {
            for (key, v) in map.iter() {
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_object_arrays_into(v, path, depth + 1, out);
            }
        }
        Value::Arr(items) => {
            if !items.is_empty() && items.iter().all(|i| i.as_obj().is_some()) {
                out.push((prefix, items.clone()));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_nested_object_uses_dot_paths() {
        let mut inner = OrderedMap::new();
        inner.insert("cpu", Value::Str("100m".into()));
        inner.insert("memory", Value::Str("256Mi".into()));
        let mut outer = OrderedMap::new();
        outer.insert("name", Value::Str("pod-a".into()));
        outer.insert("requests", Value::Obj(inner));
        let row = flatten_row(&Value::Obj(outer)).expect("flatten");
        assert_eq!(row.get("name").unwrap().as_str(), Some("pod-a"));
        assert_eq!(
            row.get("requests.cpu").unwrap().as_str(),
            Some("100m")
        );
    }

    #[test]
    fn flatten_skips_object_arrays() {
        let mut item = OrderedMap::new();
        item.insert("x", Value::Int(1));
        let mut outer = OrderedMap::new();
        outer.insert("name", Value::Str("a".into()));
        outer.insert("children", Value::Arr(vec![Value::Obj(item)]));
        let row = flatten_row(&Value::Obj(outer)).expect("flatten");
        assert!(row.get("children").is_none());
        assert!(row.get("children.0.x").is_none());
    }

    #[test]
    fn flatten_depth_exceeded_returns_none() {
        let mut value = Value::Int(0);
        for _ in 0..MAX_DEPTH + 5 {
            let mut map = OrderedMap::new();
            map.insert("child", value);
            value = Value::Obj(map);
        }
        assert!(flatten_row(&value).is_none());
    }

    #[test]
    fn float_formatting_has_no_scientific_notation() {
        assert_eq!(format_float(1_000_000.0), "1000000");
        assert_eq!(format_float(19.99), "19.99");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(-0.0), "0");
    }
}
