//! Snapshot record schema and the three-way run outcome.

use serde::{Deserialize, Serialize};

use crate::config::SOURCE_TAG;
use crate::error::FetchError;

/// How a fetch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Extraction completed; zero to `max_trends` entries.
    Success(Vec<String>),
    /// The browser capability is missing; the network was never touched.
    Degraded { note: String },
    /// Something failed after the capability was found.
    Failed { error: String },
}

impl Outcome {
    /// Classify a fault into the degraded or failed tier.
    pub fn from_error(err: &FetchError) -> Self {
        if err.is_unavailable() {
            Outcome::Degraded {
                note: err.to_string(),
            }
        } else {
            Outcome::Failed {
                error: err.to_string(),
            }
        }
    }
}

/// The persisted artifact. Field order here is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub source: String,
    pub trends: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Outcome> for SnapshotRecord {
    fn from(outcome: Outcome) -> Self {
        let (trends, note, error) = match outcome {
            Outcome::Success(trends) => (trends, None, None),
            Outcome::Degraded { note } => (Vec::new(), Some(note), None),
            Outcome::Failed { error } => (Vec::new(), None, Some(error)),
        };
        Self {
            source: SOURCE_TAG.to_string(),
            trends,
            note,
            error,
        }
    }
}

impl SnapshotRecord {
    /// Pretty-printed JSON, two-space indent.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
