mod support;

use std::collections::HashMap;

use metrics::Unit;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serial_test::serial;

use bookshelf::infra::telemetry;
use support::{Harness, dune};

#[tokio::test]
#[serial]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let harness = Harness::new();

    // Empty rebuild, then a populated miss, a hit, and a write-triggered eviction.
    harness.cache.get_cached_result_set().await.expect("empty read");
    harness.add(dune()).await;
    harness.cache.get_cached_result_set().await.expect("miss");
    harness.cache.get_cached_result_set().await.expect("hit");
    harness.cache.invalidate().await.expect("invalidate");

    let mut counters = HashMap::new();
    let mut units = HashMap::new();
    let mut histograms = Vec::new();
    for (composite_key, unit, _, value) in snapshotter.snapshot().into_vec() {
        let name = composite_key.key().name().to_string();
        if let Some(unit) = unit {
            units.insert(name.clone(), unit);
        }
        match value {
            DebugValue::Counter(count) => {
                counters.insert(name, count);
            }
            DebugValue::Histogram(_) => histograms.push(name),
            DebugValue::Gauge(_) => {}
        }
    }

    assert_eq!(counters.get("bookshelf_cache_hit_total"), Some(&1));
    assert_eq!(counters.get("bookshelf_cache_miss_total"), Some(&2));
    assert_eq!(counters.get("bookshelf_cache_empty_total"), Some(&1));
    // One eviction from the create hook, one explicit.
    assert_eq!(counters.get("bookshelf_cache_invalidate_total"), Some(&2));
    assert!(histograms.contains(&"bookshelf_cache_rebuild_ms".to_string()));
    assert_eq!(
        units.get("bookshelf_cache_rebuild_ms"),
        Some(&Unit::Milliseconds)
    );
}
