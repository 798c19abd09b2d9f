//! Concurrency and Async Callback Tests
//!
//! - One compiled tree is shared by concurrent validations
//! - Async validate and transform callbacks are awaited in place
//! - Results do not depend on callback completion order

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docrule::observability::MetricsRegistry;
use docrule::schema::{compile, types, FieldRule, SchemaDefinition};
use docrule::validate::{validate, ValidateOptions, Validator, ViolationRule};
use serde_json::{json, Value};

/// Sleeps longer for earlier fields so completion order inverts declaration order.
fn slow_schema() -> SchemaDefinition {
    let mut def = SchemaDefinition::new();
    for (i, delay) in [30u64, 20, 10].iter().enumerate() {
        let delay = *delay;
        def.insert(
            format!("f{}", i),
            FieldRule::new(types::number()).validate_async(move |v| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                v.as_i64().map_or(false, |n| n >= 0)
            }),
        );
    }
    def
}

/// Errors come back in declaration order even when callbacks finish in reverse.
#[tokio::test]
async fn test_async_validate_order_is_stable() {
    let schema = compile(&slow_schema()).unwrap();
    let doc = json!({ "f0": -1, "f1": -2, "f2": -3 });

    let failure = validate(&doc, &schema, &ValidateOptions::default())
        .await
        .unwrap_err();
    let paths: Vec<_> = failure.errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["f0", "f1", "f2"]);
    assert!(failure
        .errors()
        .iter()
        .all(|e| e.rule == ViolationRule::Validate));
}

/// Async transforms replace the value with their awaited result.
#[tokio::test]
async fn test_async_transform() {
    let def = SchemaDefinition::new().field(
        "tags",
        FieldRule::new(types::array(types::string())).transform_async(|v| async move {
            tokio::task::yield_now().await;
            let count = v.as_array().map_or(0, Vec::len);
            json!({ "items": v, "count": count })
        }),
    );
    let schema = compile(&def).unwrap();

    let value = validate(&json!({ "tags": ["a", "b"] }), &schema, &ValidateOptions::default())
        .await
        .unwrap();
    assert_eq!(value["tags"], json!({ "items": ["a", "b"], "count": 2 }));
}

/// Stop-on-first-error does not start callbacks after the first failure.
#[tokio::test]
async fn test_stop_on_first_error_skips_later_callbacks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut def = SchemaDefinition::new();
    for name in ["a", "b", "c"] {
        let calls = Arc::clone(&calls);
        def.insert(
            name,
            FieldRule::new(types::string()).validate_async(move |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    false
                }
            }),
        );
    }
    let schema = compile(&def).unwrap();
    let doc = json!({ "a": "x", "b": "y", "c": "z" });

    let failure = validate(&doc, &schema, &ValidateOptions::default().stop_on_first_error())
        .await
        .unwrap_err();
    assert_eq!(failure.errors().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Many tasks validate against one shared tree and each gets its own result.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_tree_across_tasks() {
    let def = SchemaDefinition::new()
        .field("id", FieldRule::new(types::number()).required())
        .field(
            "name",
            FieldRule::new(types::string())
                .trim()
                .validate_async(|v| async move {
                    tokio::task::yield_now().await;
                    v.as_str().map_or(false, |s| !s.is_empty())
                }),
        );
    let metrics = Arc::new(MetricsRegistry::new());
    let validator = Validator::new(Arc::new(compile(&def).unwrap()))
        .with_metrics(Arc::clone(&metrics));

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let validator = validator.clone();
            tokio::spawn(async move {
                let name = if i % 4 == 0 { "   ".to_string() } else { format!(" user{} ", i) };
                let doc = json!({ "id": i.to_string(), "name": name });
                (i, validator.validate(&doc).await)
            })
        })
        .collect();

    for handle in handles {
        let (i, outcome) = handle.await.unwrap();
        if i % 4 == 0 {
            let failure = outcome.unwrap_err();
            assert_eq!(failure.errors()[0].path, "name");
        } else {
            let value: Value = outcome.unwrap();
            assert_eq!(value["id"], i);
            assert_eq!(value["name"], format!("user{}", i));
        }
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.documents_validated, 64);
    assert_eq!(snapshot.documents_rejected, 16);
    assert_eq!(snapshot.violations_recorded, 16);
}

/// Dropping a validation mid-flight leaves the shared tree usable.
#[tokio::test]
async fn test_cancelled_validation_has_no_effect() {
    let schema = Arc::new(compile(&slow_schema()).unwrap());
    let metrics = Arc::new(MetricsRegistry::new());
    let validator = Validator::new(Arc::clone(&schema)).with_metrics(Arc::clone(&metrics));

    let doc = json!({ "f0": 1, "f1": 2, "f2": 3 });
    let timed_out =
        tokio::time::timeout(Duration::from_millis(1), validator.validate(&doc)).await;
    assert!(timed_out.is_err());
    assert_eq!(metrics.documents_validated(), 0);

    let value = validator.validate(&doc).await.unwrap();
    assert_eq!(value, doc);
    assert_eq!(metrics.documents_validated(), 1);
}
