//! Strict JSON parser. Bare scalars (a lone number or a lone quoted string)
//! are rejected so they fall through to the YAML parser, per spec §4.1 —
//! JSON technically accepts `42` and `"x"` as valid documents, but the engine
//! wants those treated as YAML scalars instead.

use serde_json::Value as Json;

use crate::error::{CondenseError, Result};
use crate::value::{OrderedMap, Value};

pub fn parse(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CondenseError::Parse {
            format: "json",
            message: "empty input".to_string(),
        });
    }

    let json: Json = serde_json::from_str(text).map_err(|e| CondenseError::Parse {
        format: "json",
        message: e.to_string(),
    })?;

    if matches!(json, Json::Number(_) | Json::String(_) | Json::Bool(_) | Json::Null) {
        return Err(CondenseError::Parse {
            format: "json",
            message: "bare scalar document rejected; falling through to YAML".to_string(),
        });
    }

    Ok(from_json(&json))
}

fn from_json(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::Arr(items.iter().map(from_json).collect()),
        Json::Object(map) => {
            let mut out = OrderedMap::new();
            for (k, v) in map {
                out.insert(k.clone(), from_json(v));
            }
            Value::Obj(out)
        }
    }
}
