//! XML parser: converts an XML element tree into the generic [`Value`] tree
//! (spec §4.1). Attributes become `@name` keys; leaf text becomes the
//! element's value; mixed attribute+text nodes expose the text under
//! `#text`; repeated child element names collapse into an array.
//!
//! No repo in the retrieval pack parses XML, so this is grounded on
//! `quick-xml`'s standard pull-parser usage rather than a teacher file.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{CondenseError, Result};
use crate::value::{OrderedMap, Value};

pub fn parse(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.starts_with('<') {
        return Err(CondenseError::Parse {
            format: "xml",
            message: "input does not look like XML".to_string(),
        });
    }

    let mut reader = Reader::from_str(trimmed);
    reader.config_mut().trim_text(true);

    let root = parse_element(&mut reader, None).map_err(|e| CondenseError::Parse {
        format: "xml",
        message: e,
    })?;

    root.ok_or_else(|| CondenseError::Parse {
        format: "xml",
        message: "no root element found".to_string(),
    })
}

/// Parses one element (the one just opened, or the document root if
/// `opening` is `None`) until its matching end tag, returning its value.
fn parse_element(
    reader: &mut Reader<&[u8]>,
    opening: Option<&quick_xml::events::BytesStart>,
) -> std::result::Result<Option<Value>, String> {
    let mut attrs = OrderedMap::new();
    if let Some(start) = opening {
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            attrs.insert(format!("@{key}"), coerce_text(&value));
        }
    }

    let mut children: Vec<(String, Value)> = Vec::new();
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                let owned_start = start.to_owned();
                let child = parse_element(reader, Some(&owned_start))?.unwrap_or(Value::Null);
                children.push((name, child));
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                let mut child_attrs = OrderedMap::new();
                for attr in start.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    child_attrs.insert(format!("@{key}"), coerce_text(&value));
                }
                let child = if child_attrs.is_empty() {
                    Value::Null
                } else {
                    Value::Obj(child_attrs)
                };
                children.push((name, child));
            }
            Event::Text(bytes_text) => {
                text.push_str(&bytes_text.unescape().map_err(|e| e.to_string())?);
            }
            Event::CData(cdata) => {
                text.push_str(&String::from_utf8_lossy(cdata.as_ref()));
            }
            Event::End(_) => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Some(assemble(attrs, children, text)))
}

fn assemble(attrs: OrderedMap, children: Vec<(String, Value)>, text: String) -> Value {
    let text = text.trim().to_string();

    if attrs.is_empty() && children.is_empty() {
        return if text.is_empty() {
            Value::Null
        } else {
            coerce_text(&text)
        };
    }

    let mut obj = attrs;
    if !text.is_empty() {
        obj.insert("#text", coerce_text(&text));
    }

    // Collapse repeated child element names into an array, preserving the
    // first-seen order of distinct names (spec §4.1).
    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for (name, value) in children {
        if let Some(slot) = grouped.iter_mut().find(|(n, _)| *n == name) {
            slot.1.push(value);
        } else {
            grouped.push((name, vec![value]));
        }
    }
    for (name, mut values) in grouped {
        if values.len() == 1 {
            obj.insert(name, values.pop().expect("len==1"));
        } else {
            obj.insert(name, Value::Arr(values));
        }
    }

    Value::Obj(obj)
}

/// Numeric/boolean coercion for XML leaf text (spec §3): `true`/`false`
/// become booleans, fully-numeric text is promoted to Int/Float.
fn coerce_text(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    if text.contains('.')
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        && let Ok(f) = text.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::Str(text.to_string())
}
