//! Column order and row order properties

use proptest::prelude::*;
use serde_json::json;
use tabula::collection::{Collection, CollectionView, FormatTable, TableProperty};
use tabula::query::{CollectionGroupResults, QueryResult, ReducerResults};
use tabula::record::{Block, NodeGraph, Record};
use tabula::table::{materialize_rows, reconcile_columns};

fn view_from(flags: &[bool]) -> CollectionView {
    CollectionView {
        id: "v".to_string(),
        view_type: "table".to_string(),
        format: Some(FormatTable {
            table_properties: flags
                .iter()
                .enumerate()
                .map(|(i, visible)| TableProperty::new(format!("p{}", i), *visible, 100))
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn empty_collection() -> Collection {
    serde_json::from_value(json!({"id": "c", "schema": {}})).unwrap()
}

/// Column count equals visible count, indices run 0..V-1 in declared order
#[test]
fn test_reconciled_columns_follow_visible_declared_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&proptest::collection::vec(any::<bool>(), 0..24), |flags| {
            let view = view_from(&flags);
            let columns = reconcile_columns("p", &view, Some(&empty_collection())).unwrap();

            let expected: Vec<String> = flags
                .iter()
                .enumerate()
                .filter(|(_, visible)| **visible)
                .map(|(i, _)| format!("p{}", i))
                .collect();

            prop_assert_eq!(columns.len(), expected.len());
            for (i, col) in columns.iter().enumerate() {
                prop_assert_eq!(col.index, i);
                prop_assert_eq!(col.id(), expected[i].as_str());
            }
            Ok(())
        })
        .unwrap();
}

/// Rows are the resolvable subsequence of the server's id list, in order
#[test]
fn test_rows_preserve_server_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec((0u8..40, any::<bool>()), 0..30),
            |entries| {
                let mut graph = NodeGraph::default();
                let mut ids = Vec::new();
                for (n, present) in &entries {
                    let id = format!("r{}", n);
                    if *present {
                        graph.blocks.insert(
                            id.clone(),
                            Record {
                                role: Some("reader".to_string()),
                                value: Some(Block {
                                    id: id.clone(),
                                    ..Default::default()
                                }),
                            },
                        );
                    }
                    ids.push(id);
                }

                let result = QueryResult {
                    reducer_results: Some(ReducerResults {
                        collection_group_results: Some(CollectionGroupResults {
                            block_ids: ids.clone(),
                            ..Default::default()
                        }),
                    }),
                    ..Default::default()
                };

                let rows = materialize_rows(&result, &graph, &[]);
                let got: Vec<&str> = rows.rows.iter().map(|r| r.id()).collect();
                let expected: Vec<&str> = ids
                    .iter()
                    .filter(|id| graph.blocks.contains_key(*id))
                    .map(String::as_str)
                    .collect();
                prop_assert_eq!(got, expected);
                Ok(())
            },
        )
        .unwrap();
}
