//! Fan-out of progress events to connected viewers.
//!
//! Each viewer owns a [`Subscription`]: a bounded receiver registered in
//! the broadcaster under a numeric handle. Sending never waits on a slow
//! viewer. A viewer whose receiver is gone, or whose queue is full, is
//! dropped on the next broadcast. Dropping a `Subscription` unsubscribes it.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::event::ProgressEvent;
use crate::telemetry::metrics;

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events a viewer may have queued before it counts as stalled.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Owns the set of open viewer channels. Cheap to clone.
#[derive(Clone, Default)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

struct Inner {
    next_id: AtomicU64,
    capacity: usize,
    sinks: Mutex<HashMap<SubscriberId, Sender<ProgressEvent>>>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            sinks: Mutex::new(HashMap::new()),
        }
    }
}

impl Inner {
    fn sinks(&self) -> MutexGuard<'_, HashMap<SubscriberId, Sender<ProgressEvent>>> {
        // The map holds no invariants a panicking holder could break.
        self.sinks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.sinks().remove(&id).is_some();
        if removed {
            metrics::progress_subscribers().add(-1, &[]);
        }
        removed
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broadcaster whose viewers may each queue at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                ..Inner::default()
            }),
        }
    }

    /// Open a new channel. Its first event is always `connected`.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        // Queued before registration so nothing can overtake it.
        let _ = tx.try_send(ProgressEvent::Connected);
        self.inner.sinks().insert(id, tx);
        metrics::progress_subscribers().add(1, &[]);
        debug!(subscriber = %id, "progress channel opened");

        Subscription {
            id,
            rx,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Remove a channel. Returns whether it was still registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscriber = %id, "progress channel closed");
        }
        removed
    }

    /// Deliver `event` to every open channel, dropping channels that are
    /// gone or too far behind.
    ///
    /// Returns the number of channels the event reached.
    pub fn broadcast(&self, event: &ProgressEvent) -> usize {
        let mut sinks = self.inner.sinks();
        let before = sinks.len();
        sinks.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscriber = %id, "progress channel stalled, dropping it");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        let delivered = sinks.len();
        drop(sinks);

        let dropped = before - delivered;
        if dropped > 0 {
            metrics::progress_subscribers().add(-(dropped as i64), &[]);
            debug!(dropped, "dropped closed progress channels");
        }
        delivered
    }

    /// Number of currently registered channels.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sinks().len()
    }
}

/// Receiver side of batch progress reporting.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl ProgressSink for Broadcaster {
    fn emit(&self, event: ProgressEvent) {
        let delivered = self.broadcast(&event);
        debug!(kind = event.kind(), delivered, "progress event broadcast");
    }
}

/// One viewer's live event stream.
pub struct Subscription {
    id: SubscriberId,
    rx: Receiver<ProgressEvent>,
    inner: Arc<Inner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once the broadcaster dropped this channel.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.inner.remove(self.id) {
            debug!(subscriber = %self.id, "progress channel dropped");
        }
    }
}
