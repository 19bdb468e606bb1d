//! Store operation counter, read back through an in-memory exporter.
//!
//! Lives in its own test binary because it installs the global meter
//! provider.

mod common;

use std::collections::HashMap;

use common::{generated, temp_data_dir};
use essaygen::model::ItemId;
use essaygen::storage::ItemStore;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

fn store_operations(exporter: &InMemoryMetricExporter) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    let finished = exporter.get_finished_metrics().unwrap();
    let Some(latest) = finished.last() else {
        return counts;
    };
    for scope in latest.scope_metrics() {
        for metric in scope.metrics() {
            if metric.name() != "essaygen.store.operations" {
                continue;
            }
            if let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() {
                for point in sum.data_points() {
                    let operation = point
                        .attributes()
                        .find(|kv| kv.key.as_str() == "operation")
                        .map(|kv| kv.value.to_string())
                        .unwrap_or_default();
                    counts.insert(operation, point.value());
                }
            }
        }
    }
    counts
}

#[tokio::test]
async fn each_public_call_counts_once() {
    let exporter = InMemoryMetricExporter::default();
    let provider = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(exporter.clone()).build())
        .build();
    opentelemetry::global::set_meter_provider(provider.clone());

    let store = ItemStore::new(temp_data_dir(), 2);
    store.persist(&[generated(1, "a")]).await.unwrap();
    store.append(&[generated(2, "b"), generated(3, "c")]).await.unwrap();
    store.load().await.unwrap();
    store.delete(ItemId(2)).await.unwrap();
    store.delete(ItemId(42)).await.unwrap();

    provider.force_flush().unwrap();
    let counts = store_operations(&exporter);

    assert_eq!(counts.get("persist"), Some(&1));
    assert_eq!(counts.get("append"), Some(&1));
    assert_eq!(counts.get("load"), Some(&1));
    assert_eq!(counts.get("delete"), Some(&2));
}
