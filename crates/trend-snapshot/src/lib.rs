// Copyright 2026 trend-snapshot contributors
// SPDX-License-Identifier: MIT

//! trend-snapshot — snapshot a trending-topics page into a dated JSON file.
//!
//! The library exposes the fetcher and its seams so the binary stays thin
//! and the integration tests can drive a run without a real browser.

pub mod artifact;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod record;
pub mod renderer;

pub use config::FetcherConfig;
pub use error::{FetchError, FetchResult};
pub use fetcher::TrendFetcher;
pub use record::{Outcome, SnapshotRecord};
pub use renderer::chromium::ChromiumLauncher;
