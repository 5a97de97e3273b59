//! Error types for the trend fetcher.

use std::time::Duration;

/// All faults that can occur while producing a snapshot.
///
/// `BrowserUnavailable` is the only variant that degrades to a `note`;
/// every other variant is recorded as an `error`.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {}ms", .0.as_millis())]
    NavigationTimeout(Duration),

    #[error("DOM evaluation failed: {0}")]
    Evaluation(String),

    #[error("failed to close browser: {0}")]
    Close(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether this fault means the automation capability is missing
    /// rather than that a run went wrong.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchError::BrowserUnavailable(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
