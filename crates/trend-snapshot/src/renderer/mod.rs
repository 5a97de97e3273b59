//! Renderer abstraction for browser-based page rendering.
//!
//! `Launcher` acquires a browser, `Renderer` owns it and hands out
//! `RenderContext` pages. The Chromium implementation lives in
//! [`chromium`]; tests drive the fetcher through their own impls.

pub mod chromium;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::FetcherConfig;
use crate::error::{FetchError, FetchResult};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Acquires a browser engine.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start a browser. Returns `FetchError::BrowserUnavailable` when no
    /// engine can be found at all, and other variants when one was found
    /// but failed to start.
    async fn launch(&self, config: &FetcherConfig) -> FetchResult<Box<dyn Renderer>>;
}

/// A running browser engine that can create pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a new page.
    async fn new_context(&self) -> FetchResult<Box<dyn RenderContext>>;
    /// Shut the engine down and reap its process.
    async fn shutdown(self: Box<Self>) -> FetchResult<()>;
}

/// A single browser page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate and wait until the document has been parsed. Callers
    /// bound this with their own timeout.
    async fn navigate(&mut self, url: &str) -> FetchResult<NavigationResult>;
    /// Evaluate JavaScript in the page and return its JSON value.
    async fn execute_js(&self, script: &str) -> FetchResult<serde_json::Value>;
    /// Close this page.
    async fn close(self: Box<Self>) -> FetchResult<()>;
}

/// A launcher that never finds a browser.
pub struct NoopLauncher;

#[async_trait]
impl Launcher for NoopLauncher {
    async fn launch(&self, _config: &FetcherConfig) -> FetchResult<Box<dyn Renderer>> {
        Err(FetchError::BrowserUnavailable(
            "browser automation disabled".into(),
        ))
    }
}
