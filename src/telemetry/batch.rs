//! Batch execution span helpers.
//!
//! Provides span creation and state-transition recording for batches
//! flowing through the processor.

use tracing::Span;
use uuid::Uuid;

/// Start a span for one batch run.
///
/// The `batch.state` field is declared empty and can be updated via
/// [`record_state_transition`].
pub fn start_batch_span(batch_id: &Uuid, topics: usize) -> Span {
    tracing::info_span!(
        "batch.run",
        "batch.id" = %batch_id,
        "batch.topics" = topics,
        "batch.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the batch span.
///
/// Emits a tracing `info` event scoped to the given span and updates its
/// `batch.state` field.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("batch.state", to);
    span.in_scope(|| {
        tracing::info!(from = from, to = to, "state_transition");
    });
}
