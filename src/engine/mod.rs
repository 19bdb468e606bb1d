//! Batch engine: ordered topic processing, incremental flushing, progress.

pub mod batch;

pub use batch::{BatchConfig, BatchProcessor, BatchState, validate_topics};
