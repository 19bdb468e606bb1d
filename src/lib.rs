//! # essaygen
//!
//! Batch generation of structured essay summaries through a remote
//! text-generation service, with live progress streaming to browser
//! viewers and flat-file persistence of the results.
//!
//! Provides the item store (chunked JSON files), the generation client
//! (rig-core), the batch processor, the progress broadcaster, the axum
//! HTTP surface, and OpenTelemetry observability.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod llm;
pub mod model;
pub mod progress;
pub mod server;
pub mod storage;
pub mod telemetry;
