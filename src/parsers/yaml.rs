//! YAML parser. Rejects bare scalars and empty documents (spec §4.1), the
//! same way `yaml_provider.rs` centralizes YAML access behind one entry
//! point rather than scattering `serde_yaml::from_str` calls.

use serde_yaml::Value as Yaml;

use crate::error::{CondenseError, Result};
use crate::value::{OrderedMap, Value};

pub fn parse(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CondenseError::Parse {
            format: "yaml",
            message: "empty document".to_string(),
        });
    }

    let yaml: Yaml = serde_yaml::from_str(text).map_err(|e| CondenseError::Parse {
        format: "yaml",
        message: e.to_string(),
    })?;

    if matches!(
        yaml,
        Yaml::Number(_) | Yaml::String(_) | Yaml::Bool(_) | Yaml::Null
    ) {
        return Err(CondenseError::Parse {
            format: "yaml",
            message: "bare scalar document rejected".to_string(),
        });
    }

    Ok(from_yaml(&yaml))
}

fn from_yaml(value: &Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Yaml::String(s) => Value::Str(s.clone()),
        Yaml::Sequence(items) => Value::Arr(items.iter().map(from_yaml).collect()),
        Yaml::Mapping(map) => {
            let mut out = OrderedMap::new();
            for (k, v) in map {
                let key = k.as_str().map(str::to_string).unwrap_or_else(|| {
                    serde_yaml::to_string(k).unwrap_or_default().trim().to_string()
                });
                out.insert(key, from_yaml(v));
            }
            Value::Obj(out)
        }
        Yaml::Tagged(tagged) => from_yaml(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_of_mappings() {
        let text = "- name: a\n  id: 1\n- name: b\n  id: 2\n";
        let value = parse(text).expect("parse");
        let arr = value.as_arr().expect("arr");
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn rejects_bare_scalar() {
        assert!(parse("42").is_err());
        assert!(parse("just text").is_err());
    }

    #[test]
    fn rejects_empty_document() {
        assert!(parse("").is_err());
        assert!(parse("   \n").is_err());
    }

    #[test]
    fn parses_nested_requests_block() {
        let text = "requests:\n  cpu: 100m\n  memory: 256Mi\n";
        let value = parse(text).expect("parse");
        let obj = value.as_obj().expect("obj");
        let requests = obj.get("requests").unwrap().as_obj().unwrap();
        assert_eq!(requests.get("cpu").unwrap().as_str(), Some("100m"));
    }
}
