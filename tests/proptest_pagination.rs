//! Property-based tests using proptest
//!
//! Pagination, merge order and the normalizers, checked over randomized
//! inputs.

mod common;

use cloud_inventory::error::{ErrorCategory, RegionFailure};
use cloud_inventory::inventory::buckets::{encryption_algorithm, versioning_status};
use cloud_inventory::inventory::clusters::normalize_cluster;
use cloud_inventory::inventory::fetcher::fetch_all;
use cloud_inventory::inventory::instances::normalize_instance;
use cloud_inventory::inventory::{Inventory, RegionOutcome};
use common::page_of;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Keys the normalizers look at, mixed with noise
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("instanceId".to_string()),
        Just("instanceType".to_string()),
        Just("instanceState".to_string()),
        Just("name".to_string()),
        Just("launchTime".to_string()),
        Just("tagSet".to_string()),
        Just("item".to_string()),
        Just("key".to_string()),
        Just("value".to_string()),
        Just("Name".to_string()),
        Just("createdAt".to_string()),
        Just("Rule".to_string()),
        Just("Status".to_string()),
        "[a-z]{1,6}",
    ]
}

/// Arbitrary JSON trees shaped loosely like descriptors
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        "[a-zA-Z0-9:. -]{0,16}".prop_map(Value::from),
        Just(Value::from("2024-03-01T08:30:00Z")),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Per-region result: a record count or an error message
fn arb_outcome() -> impl Strategy<Value = Result<usize, String>> {
    prop_oneof![(0usize..4).prop_map(Ok), "[A-Za-z]{1,12}".prop_map(Err),]
}

fn to_outcome(region: &str, outcome: &Result<usize, String>) -> RegionOutcome<String> {
    RegionOutcome {
        region: region.to_string(),
        result: match outcome {
            Ok(n) => Ok((0..*n).map(|i| format!("{}-{}", region, i)).collect()),
            Err(message) => Err(RegionFailure {
                category: ErrorCategory::Unexpected,
                description: message.clone(),
            }),
        },
    }
}

proptest! {
    /// Fetching yields every page's items, in page order
    #[test]
    fn test_pages_concatenate(pages in prop::collection::vec(
        prop::collection::vec(any::<i64>().prop_map(Value::from), 0..5),
        0..8,
    )) {
        let calls = std::cell::Cell::new(0usize);
        let items = tokio_test::block_on(fetch_all("prop", |token| {
            calls.set(calls.get() + 1);
            let page = page_of(&pages, token.as_deref());
            async move { Ok(page) }
        }))
        .unwrap();

        let expected: Vec<Value> = pages.iter().flatten().cloned().collect();
        prop_assert_eq!(items, expected);
        prop_assert_eq!(calls.get(), pages.len().max(1));
    }

    /// Merging the same outcomes in any order gives the same document
    #[test]
    fn test_merge_order_independent(
        (outcomes, shuffled) in prop::collection::btree_map("[a-z]{2}-[a-z]{4}-[1-3]", arb_outcome(), 0..10)
            .prop_flat_map(|m| {
                let ordered: Vec<(String, Result<usize, String>)> = m.into_iter().collect();
                (Just(ordered.clone()), Just(ordered).prop_shuffle())
            })
    ) {
        let mut forward = Inventory::new();
        for (region, outcome) in &outcomes {
            forward.merge(to_outcome(region, outcome));
        }
        let mut mixed = Inventory::new();
        for (region, outcome) in &shuffled {
            mixed.merge(to_outcome(region, outcome));
        }

        prop_assert_eq!(
            serde_json::to_value(&forward).unwrap(),
            serde_json::to_value(&mixed).unwrap()
        );

        let reported = outcomes.iter().filter(|(_, o)| matches!(o, Ok(n) if *n > 0)).count();
        let failed = outcomes.iter().filter(|(_, o)| o.is_err()).count();
        prop_assert_eq!(forward.regions.len(), reported);
        prop_assert_eq!(forward.diagnostics.len(), failed);
    }

    /// Instance normalization never fails and never leaves a field empty
    #[test]
    fn test_instance_normalizer_total(item in arb_json()) {
        let record = normalize_instance(&item, "us-east-1");
        for field in [
            &record.name,
            &record.instance_id,
            &record.instance_type,
            &record.state,
            &record.launch_time,
        ] {
            prop_assert!(!field.is_empty());
        }
        prop_assert_eq!(record.region, "us-east-1");
    }

    /// Cluster normalization never fails
    #[test]
    fn test_cluster_normalizer_total(item in arb_json()) {
        let record = normalize_cluster(&item, "eu-west-1");
        prop_assert!(!record.created_at.is_empty());
        prop_assert!(!record.name.is_empty());
    }

    /// Bucket documents always map to a status and an algorithm
    #[test]
    fn test_bucket_documents_total(doc in arb_json()) {
        prop_assert!(!versioning_status(&doc).is_empty());
        prop_assert!(!encryption_algorithm(&doc).is_empty());
    }

    /// The first Name tag wins, wherever it sits in the tag set
    #[test]
    fn test_first_name_tag_wins(
        before in prop::collection::vec("[a-z]{1,8}", 0..4),
        name in "[a-zA-Z0-9-]{1,16}",
        after in prop::collection::vec("[a-zA-Z0-9-]{1,16}", 0..3),
    ) {
        let mut tags: Vec<Value> = before
            .iter()
            .filter(|k| k.as_str() != "Name")
            .map(|k| json!({"key": k, "value": "x"}))
            .collect();
        tags.push(json!({"key": "Name", "value": name}));
        tags.extend(after.iter().map(|v| json!({"key": "Name", "value": v})));

        let item = json!({"tagSet": {"item": tags}});
        prop_assert_eq!(normalize_instance(&item, "us-east-1").name, name);
    }
}
