//! Batch processor: drives one submitted list of topics to completion.
//!
//! Topics run strictly in order, one remote call at a time, with a fixed
//! pause between calls. A topic that fails becomes a failed item and the
//! batch moves on. Results reach the caller twice: as live progress events
//! through the [`ProgressSink`], and as the returned ordered item list.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event::ProgressEvent;
use crate::llm::{Completer, GenerationClient};
use crate::model::{Item, ItemId};
use crate::progress::ProgressSink;
use crate::storage::ItemStore;
use crate::telemetry::batch::{record_state_transition, start_batch_span};
use crate::telemetry::metrics;

/// Configuration for the batch processor.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause between consecutive remote calls.
    pub request_delay: Duration,
    /// Flush accumulated items to the store after this many.
    pub flush_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(1),
            flush_every: 50,
        }
    }
}

/// Lifecycle of one batch. There is no cancelled state: a batch runs
/// until its topic list is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Running,
    Completed,
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchState::Pending => "pending",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Runs batches against a generation client, a store and a progress sink.
pub struct BatchProcessor<C> {
    generator: GenerationClient<C>,
    store: Arc<ItemStore>,
    sink: Arc<dyn ProgressSink>,
    config: BatchConfig,
    /// Held for the whole of a batch so overlapping submissions queue up.
    running: Mutex<()>,
    /// Lowest id not yet handed out.
    next_id: AtomicI64,
}

impl<C: Completer> BatchProcessor<C> {
    pub fn new(
        generator: GenerationClient<C>,
        store: Arc<ItemStore>,
        sink: Arc<dyn ProgressSink>,
        config: BatchConfig,
    ) -> Self {
        Self {
            generator,
            store,
            sink,
            config,
            running: Mutex::new(()),
            next_id: AtomicI64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    /// Process `topics` in order and return one item per topic.
    ///
    /// # Errors
    /// [`Error::Validation`] if the list is empty or holds a blank topic;
    /// a storage error if a flush fails. Generation failures never surface
    /// here, they become failed items.
    pub async fn run(&self, topics: Vec<String>) -> Result<Vec<Item>> {
        let topics = validate_topics(topics)?;
        let total = topics.len();

        let batch_id = Uuid::new_v4();
        let span = start_batch_span(&batch_id, total);
        record_state_transition(&span, "none", &BatchState::Pending.to_string());

        if self.running.try_lock().is_err() {
            info!(%batch_id, "another batch is running, waiting");
        }
        let _running = self.running.lock().await;

        let run_span = span.clone();
        async move {
            record_state_transition(
                &span,
                &BatchState::Pending.to_string(),
                &BatchState::Running.to_string(),
            );
            let base = self.allocate_ids(total);
            let mut results: Vec<Item> = Vec::with_capacity(total);
            let mut unflushed = 0;

            for (index, topic) in topics.into_iter().enumerate() {
                let current = index + 1;
                let id = ItemId(base + index as i64);
                info!(current, total, %topic, "processing topic");

                self.sink.emit(ProgressEvent::Progress {
                    current,
                    total,
                    topic: topic.clone(),
                });

                let item = self.process_topic(id, topic, current, total).await;
                results.push(item);
                unflushed += 1;

                if unflushed >= self.config.flush_every {
                    self.flush(&results[results.len() - unflushed..]).await?;
                    unflushed = 0;
                }

                if current < total && !self.config.request_delay.is_zero() {
                    tokio::time::sleep(self.config.request_delay).await;
                }
            }

            if unflushed > 0 {
                self.flush(&results[results.len() - unflushed..]).await?;
            }

            let failed = results.iter().filter(|item| item.is_failed()).count();
            record_state_transition(
                &span,
                &BatchState::Running.to_string(),
                &BatchState::Completed.to_string(),
            );
            info!(%batch_id, total, failed, "batch completed");
            Ok(results)
        }
        .instrument(run_span)
        .await
    }

    /// Generate one item and announce it. Never fails: errors become a
    /// failed item.
    async fn process_topic(&self, id: ItemId, topic: String, current: usize, total: usize) -> Item {
        match self.generator.generate(&topic).await {
            Ok(summary) => {
                let item = Item::generated(id, topic, summary, Utc::now());
                metrics::items_generated().add(1, &[KeyValue::new("result", "ok")]);
                debug!(%id, "item generated");
                self.sink.emit(ProgressEvent::EssayCompleted {
                    current,
                    total,
                    essay: item.clone(),
                });
                item
            }
            Err(e) => {
                let message = e.to_string();
                metrics::items_generated().add(1, &[KeyValue::new("result", "error")]);
                warn!(%id, %topic, error = %message, "topic failed");
                self.sink.emit(ProgressEvent::EssayError {
                    current,
                    total,
                    topic: topic.clone(),
                    error: message.clone(),
                });
                Item::failed(id, topic, message, Utc::now())
            }
        }
    }

    async fn flush(&self, items: &[Item]) -> Result<()> {
        let chunks = self.store.append(items).await?;
        debug!(items = items.len(), chunks, "batch results flushed");
        Ok(())
    }

    /// Reserve `count` consecutive ids starting no earlier than now (epoch
    /// millis) and after every id handed out before.
    fn allocate_ids(&self, count: usize) -> i64 {
        let now = Utc::now().timestamp_millis();
        let count = count as i64;
        let prev = match self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                Some(next.max(now) + count)
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        prev.max(now)
    }
}

/// Trim topics and reject an empty list or a blank entry.
pub fn validate_topics(topics: Vec<String>) -> Result<Vec<String>> {
    if topics.is_empty() {
        return Err(Error::Validation(
            "topics must be a non-empty array of strings".to_string(),
        ));
    }
    topics
        .into_iter()
        .enumerate()
        .map(|(i, topic)| {
            let trimmed = topic.trim();
            if trimmed.is_empty() {
                Err(Error::Validation(format!("topic {} is blank", i + 1)))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}
