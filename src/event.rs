//! Progress events emitted while a batch runs.
//!
//! Events are ephemeral: they are forwarded to whichever viewers are
//! connected at the moment they happen and are never stored or replayed.

use serde::{Deserialize, Serialize};

use crate::model::Item;

/// A live notification about batch advancement.
///
/// Serialized with a `type` discriminator, e.g.
/// `{"type":"progress","current":1,"total":2,"topic":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Sent once on a freshly opened channel.
    Connected,
    /// Topic `current` of `total` has been dispatched.
    Progress {
        current: usize,
        total: usize,
        topic: String,
    },
    EssayCompleted {
        current: usize,
        total: usize,
        essay: Item,
    },
    EssayError {
        current: usize,
        total: usize,
        topic: String,
        error: String,
    },
}

impl ProgressEvent {
    /// The `type` discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Connected => "connected",
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::EssayCompleted { .. } => "essay_completed",
            ProgressEvent::EssayError { .. } => "essay_error",
        }
    }
}
