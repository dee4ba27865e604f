//! The six concrete scenarios from spec.md §8, each built from an inline
//! fixture string rather than an external file.

use toon_condense::heuristics::{Heuristics, WideTableFormat};
use toon_condense::tokens;
use toon_condense::value::{OrderedMap, Value};

fn pods_payload(n: usize) -> String {
    let mut rows = Vec::new();
    for i in 0..n {
        rows.push(format!(
            r#"{{"metadata":{{"name":"pod-{i}","namespace":"default"}},"spec":{{"containers":[{{"name":"nginx","image":"nginx:1.25"}}]}}}}"#
        ));
    }
    format!(r#"{{"pods":[{}]}}"#, rows.join(","))
}

#[test]
fn scenario_1_constant_columns_annotated_and_reduce_tokens() {
    let raw = pods_payload(16);
    let tree = toon_condense::parsers::parse(&raw, Some("json")).expect("parse");
    let text = toon_condense::condense_value(&tree, &Heuristics::default());
    assert!(text.contains("namespace=default"));
    // The single-container-per-pod shape is extracted as a single-level
    // nested sub-table (spec §4.4); its constant image column is annotated
    // the same way the top-level table's constant columns are.
    assert!(text.contains("image=nginx:1.25"));
    assert_eq!(text.matches("pod-").count(), 16);

    let counter = tokens::default_counter();
    let reduction = 1.0 - (counter.count(&text) as f64 / counter.count(&raw) as f64);
    assert!(reduction >= 0.55, "expected >=55% reduction, got {reduction}");
}

#[test]
fn scenario_2_all_zero_and_all_null_columns_are_elided_and_annotated() {
    let mut rows = Vec::new();
    for i in 0..25 {
        rows.push(format!(
            "{i},host-{i},10.{i},0,,up,web,1,2,3"
        ));
    }
    let csv = format!(
        "id,host,cpu_pct,cpu_idle,notes,status,role,a,b,c\n{}\n",
        rows.join("\n")
    );
    let tree = toon_condense::parsers::parse(&csv, Some("csv")).expect("parse csv");
    let text = toon_condense::condense_value(&tree, &Heuristics::default());
    assert!(text.contains("all-zero") && text.contains("cpu_idle"));
    assert!(text.contains("all-null") && text.contains("notes"));
    let header = text.lines().nth(1).expect("column header line");
    assert!(!header.split('|').any(|c| c == "cpu_idle" || c == "notes"));
}

#[test]
fn scenario_3_aws_tag_shaped_key_value_arrays_pivot_onto_parent_row() {
    let mut rows = Vec::new();
    for i in 0..20 {
        rows.push(format!(
            r#"{{"InstanceId":"i-{i}","Tags":[{{"Key":"Environment","Value":"prod"}},{{"Key":"Team","Value":"data"}}]}}"#
        ));
    }
    let raw = format!(r#"{{"instances":[{}]}}"#, rows.join(","));
    let tree = toon_condense::parsers::parse(&raw, Some("json")).expect("parse");
    let text = toon_condense::condense_value(&tree, &Heuristics::default());
    assert!(text.contains("Tags.Environment") || text.contains("Tags.Team"));
    assert!(!text.lines().nth(1).unwrap().split('|').any(|c| c == "Tags"));
}

#[test]
fn scenario_4_sibling_numeric_columns_group_into_a_tuple() {
    let yaml = "containers:\n  - name: app\n    requests:\n      cpu: 100m\n      memory: 256Mi\n      ephemeral_storage: 1Gi\n  - name: sidecar\n    requests:\n      cpu: 50m\n      memory: 128Mi\n      ephemeral_storage: 512Mi\n";
    let tree = toon_condense::parsers::parse(yaml, Some("yaml")).expect("parse yaml");
    let heuristics = Heuristics {
        max_tuple_size: 4,
        ..Heuristics::default()
    };
    let text = toon_condense::condense_value(&tree, &heuristics);
    assert!(text.contains("requests.(cpu,memory,ephemeral_storage)"));
    assert!(text.contains("(100m,256Mi,1Gi)"));
}

#[test]
fn scenario_5_wide_tables_split_into_multiple_sub_tables() {
    let mut fields = vec![("name".to_string(), Value::Str("row-0".into()))];
    for i in 0..30 {
        fields.push((format!("metric_{i}.value"), Value::Int(i as i64)));
    }
    let mut row_map = OrderedMap::new();
    for (k, v) in &fields {
        row_map.insert(k.clone(), v.clone());
    }
    let mut row_map2 = OrderedMap::new();
    for (k, v) in &fields {
        row_map2.insert(k.clone(), v.clone());
    }
    row_map2.insert("name", Value::Str("row-1".into()));

    let mut root = OrderedMap::new();
    root.insert(
        "rows",
        Value::Arr(vec![Value::Obj(row_map), Value::Obj(row_map2)]),
    );
    let tree = Value::Obj(root);

    let heuristics = Heuristics {
        wide_table_threshold: 20,
        wide_table_format: WideTableFormat::Split,
        elide_constants: false,
        ..Heuristics::default()
    };
    let text = toon_condense::condense_value(&tree, &heuristics);
    let sub_table_headers = text.lines().filter(|l| l.starts_with("# rows.")).count();
    assert!(sub_table_headers >= 2, "expected at least two sub-tables, got: {text}");
}

#[test]
fn scenario_6_below_threshold_response_is_returned_byte_identical() {
    use toon_condense::shaper::ShaperConfig;
    let raw = br#"{"ok":true}"#;
    let cfg = ShaperConfig {
        min_token_threshold: 1000,
        ..ShaperConfig::default()
    };
    let output = toon_condense::condense_text(raw, "t", &cfg);
    assert_eq!(output.as_bytes(), raw);
}
