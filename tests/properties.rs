//! Quantified-invariant tests (spec.md §8): P1 determinism, P5 identity
//! preservation under elision, P6 column-set agreement, run with `proptest`
//! over randomly generated row sets the way the teacher's `lib.rs` uses
//! `proptest!` for its own CLI-argument invariants.

use proptest::prelude::*;
use toon_condense::heuristics::Heuristics;
use toon_condense::identity;
use toon_condense::preprocess;
use toon_condense::table::{build_table, Table};
use toon_condense::value::{OrderedMap, Value};

/// 1-3 extra fields per row, each either a short string or a small integer.
fn row_fields_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    proptest::collection::vec(
        (
            "[a-c]",
            prop_oneof![
                "[a-z]{1,6}".prop_map(Value::Str),
                (0i64..5).prop_map(Value::Int),
            ],
        ),
        1..4,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .map(|(key, value)| (format!("field_{key}"), value))
            .collect()
    })
}

/// A row set of 2-7 objects, each given a unique `name` field (derived from
/// position, not generated) so there is always a legitimate identity-column
/// candidate regardless of what the other fields happen to collapse to.
fn rows_strategy() -> impl Strategy<Value = Vec<Value>> {
    proptest::collection::vec(row_fields_strategy(), 2..8).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, fields)| {
                let mut map = OrderedMap::new();
                map.insert("name", Value::Str(format!("row-{idx}")));
                for (key, value) in fields {
                    map.insert(key, value);
                }
                Value::Obj(map)
            })
            .collect()
    })
}

fn build_and_preprocess(items: &[Value], heuristics: &Heuristics) -> Table {
    let mut table = build_table("t", items, heuristics);
    table.identity_column = identity::pick(&table);
    preprocess::run(&mut table, heuristics);
    table
}

proptest! {
    #[test]
    fn p1_determinism_condense_value_is_stable(items in rows_strategy()) {
        let mut root = OrderedMap::new();
        root.insert("items", Value::Arr(items));
        let tree = Value::Obj(root);
        let heuristics = Heuristics::default();
        let first = toon_condense::condense_value(&tree, &heuristics);
        let second = toon_condense::condense_value(&tree, &heuristics);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn p5_identity_column_survives_elision(items in rows_strategy()) {
        let table = build_and_preprocess(&items, &Heuristics::default());
        // "name" is unique per row by construction, so it must be picked and
        // must survive every elision step regardless of what else is constant.
        prop_assert_eq!(table.identity_column.as_deref(), Some("name"));
        prop_assert!(table.columns.iter().any(|c| c == "name"));
    }

    #[test]
    fn p6_column_set_agreement_after_preprocessing(items in rows_strategy()) {
        let table = build_and_preprocess(&items, &Heuristics::default());
        for row in &table.rows {
            prop_assert_eq!(row.len(), table.columns.len());
        }
    }
}
