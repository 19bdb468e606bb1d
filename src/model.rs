//! Core data model.
//!
//! An item is the record produced for one submitted topic. It is either
//! generated (all nine content fields) or failed (an error message and
//! nothing else); there is no mixed shape.

pub mod category;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One generated (or failed) topic summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItem")]
pub struct Item {
    pub id: ItemId,

    /// The user-supplied topic. Never empty.
    pub topic: String,

    #[serde(flatten)]
    pub outcome: Outcome,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Newtype for item ids: creation time in epoch millis plus a batch offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the generation step produced for an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Generated(Summary),
    Failed { error: String },
}

/// The nine content fields of a generated item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub category: String,
    pub product: String,
    pub problem: String,
    pub relevance: String,
    pub goal: String,
    pub resources: String,
    pub roles: String,
    pub target_audience: String,
}

impl Item {
    pub fn generated(
        id: ItemId,
        topic: impl Into<String>,
        summary: Summary,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            outcome: Outcome::Generated(summary),
            created_at,
        }
    }

    pub fn failed(
        id: ItemId,
        topic: impl Into<String>,
        error: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            outcome: Outcome::Failed {
                error: error.into(),
            },
            created_at,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match &self.outcome {
            Outcome::Generated(summary) => Some(summary),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Generated(_) => None,
            Outcome::Failed { error } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error().is_some()
    }

    /// Case-insensitive substring match against the topic and, for
    /// generated items, the summary, product and problem fields.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if self.topic.to_lowercase().contains(&needle) {
            return true;
        }
        self.summary().is_some_and(|s| {
            [&s.summary, &s.product, &s.problem]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// Flat on-disk/wire record. Every content field is optional here so the
/// shape can be checked in one place before an [`Item`] exists.
#[derive(Deserialize)]
struct RawItem {
    id: ItemId,
    topic: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    error: Option<String>,
    summary: Option<String>,
    category: Option<String>,
    product: Option<String>,
    problem: Option<String>,
    relevance: Option<String>,
    goal: Option<String>,
    resources: Option<String>,
    roles: Option<String>,
    target_audience: Option<String>,
}

impl TryFrom<RawItem> for Item {
    type Error = String;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let fields = [
            raw.summary,
            raw.category,
            raw.product,
            raw.problem,
            raw.relevance,
            raw.goal,
            raw.resources,
            raw.roles,
            raw.target_audience,
        ];
        let present = fields.iter().filter(|f| f.is_some()).count();

        let outcome = match raw.error {
            Some(error) if present == 0 => Outcome::Failed { error },
            Some(_) => {
                return Err(format!(
                    "item {} carries both an error and content fields",
                    raw.id
                ));
            }
            None => {
                let [
                    Some(summary),
                    Some(category),
                    Some(product),
                    Some(problem),
                    Some(relevance),
                    Some(goal),
                    Some(resources),
                    Some(roles),
                    Some(target_audience),
                ] = fields
                else {
                    return Err(format!(
                        "item {} has {present} of 9 content fields and no error",
                        raw.id
                    ));
                };
                Outcome::Generated(Summary {
                    summary,
                    category,
                    product,
                    problem,
                    relevance,
                    goal,
                    resources,
                    roles,
                    target_audience,
                })
            }
        };

        if raw.topic.trim().is_empty() {
            return Err(format!("item {} has an empty topic", raw.id));
        }

        Ok(Item {
            id: raw.id,
            topic: raw.topic,
            outcome,
            created_at: raw.created_at,
        })
    }
}
