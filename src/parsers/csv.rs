//! CSV/TSV parser with dialect sniffing.
//!
//! Grounded on `io_utils.rs`'s delimiter handling and `csv::ReaderBuilder`
//! usage, but the engine sniffs the delimiter from the data itself (the
//! condensation engine receives bytes, not a file path with an extension to
//! key off of).

use ::csv::ReaderBuilder;

use crate::error::{CondenseError, Result};
use crate::value::{OrderedMap, Value};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Picks the delimiter whose count is both highest and consistent across the
/// first handful of lines of `text`. Falls back to comma when nothing beats
/// a single occurrence.
fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text.lines().take(5).filter(|l| !l.trim().is_empty()).collect();
    if sample.is_empty() {
        return b',';
    }
    let mut best = b',';
    let mut best_score = 0usize;
    for &delim in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| line.bytes().filter(|b| *b == delim).count())
            .collect();
        let first = counts[0];
        if first == 0 {
            continue;
        }
        let consistent = counts.iter().all(|c| *c == first);
        let score = if consistent { first * 10 } else { first };
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }
    best
}

pub fn parse_sniffed(text: &str) -> Result<Value> {
    parse(text, sniff_delimiter(text))
}

pub fn parse(text: &str, delimiter: u8) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CondenseError::Parse {
            format: "csv",
            message: "empty input".to_string(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(::csv::Trim::All)
        .from_reader(trimmed.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CondenseError::Parse {
            format: "csv",
            message: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.len() < 2 {
        return Err(CondenseError::Parse {
            format: "csv",
            message: format!("expected at least 2 columns, found {}", headers.len()),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CondenseError::Parse {
            format: "csv",
            message: e.to_string(),
        })?;
        let mut obj = OrderedMap::new();
        for (key, raw) in headers.iter().zip(record.iter()) {
            obj.insert(key.clone(), coerce_cell(raw));
        }
        rows.push(Value::Obj(obj));
    }

    if rows.is_empty() {
        return Err(CondenseError::Parse {
            format: "csv",
            message: "no data rows".to_string(),
        });
    }

    Ok(Value::Arr(rows))
}

/// Numeric/empty coercion for CSV/TSV cells (spec §3): empty strings become
/// null, fully-numeric strings are promoted to Int/Float.
fn coerce_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if looks_like_float(raw)
        && let Ok(f) = raw.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::Str(raw.to_string())
}

fn looks_like_float(raw: &str) -> bool {
    let mut chars = raw.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !(first.is_ascii_digit() || first == '-' || first == '+') {
        return false;
    }
    raw.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && raw.contains('.')
}
