//! Metric instrument factories for essaygen.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"essaygen"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};

/// Returns the shared meter for essaygen instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("essaygen")
}

/// Counter: items produced by batches.
/// Labels: `result` ("ok" | "error").
pub fn items_generated() -> Counter<u64> {
    meter()
        .u64_counter("essaygen.items.generated")
        .with_description("Number of items produced by batches")
        .build()
}

/// Histogram: remote generation call duration in milliseconds.
/// Labels: `model`.
pub fn generation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("essaygen.generation.duration_ms")
        .with_description("Remote generation call duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: item store operations.
/// Labels: `operation` ("load" | "persist" | "append" | "delete"), one
/// record per public store call.
pub fn store_operations() -> Counter<u64> {
    meter()
        .u64_counter("essaygen.store.operations")
        .with_description("Number of item store operations")
        .build()
}

/// Up/down counter: open progress channels.
pub fn progress_subscribers() -> UpDownCounter<i64> {
    meter()
        .i64_up_down_counter("essaygen.progress.subscribers")
        .with_description("Number of open progress channels")
        .build()
}
