//! The trend snapshot fetcher.
//!
//! One run launches a browser, loads the trends page, waits for client
//! rendering to settle, pulls short text candidates out of the DOM and
//! writes a dated [`SnapshotRecord`]. Every fault is contained and turned
//! into a degraded record, so [`TrendFetcher::run`] always yields a path.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::artifact::{output_path, write_record};
use crate::config::FetcherConfig;
use crate::error::{FetchError, FetchResult};
use crate::extract::{collect_script, select_trends};
use crate::record::{Outcome, SnapshotRecord};
use crate::renderer::{Launcher, RenderContext, Renderer};

pub struct TrendFetcher<L> {
    config: FetcherConfig,
    launcher: L,
}

impl<L: Launcher> TrendFetcher<L> {
    pub fn new(config: FetcherConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    /// Run once for today's UTC date.
    pub async fn run(&self) -> PathBuf {
        self.run_on(Utc::now().date_naive()).await
    }

    /// Run once and write the record for `date`. Never fails: if the
    /// record cannot be written, a `Failed` record is attempted in its
    /// place, and the path is returned either way.
    pub async fn run_on(&self, date: NaiveDate) -> PathBuf {
        let path = output_path(&self.config.output_dir, &self.config.file_prefix, date);

        let outcome = match AssertUnwindSafe(self.fetch()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!("fetch panicked: {msg}");
                Outcome::Failed {
                    error: format!("panic: {msg}"),
                }
            }
        };

        let record = SnapshotRecord::from(outcome);
        if let Err(e) = write_record(&path, &record) {
            error!(path = %path.display(), "failed to write snapshot: {e}");
            let fallback = SnapshotRecord::from(Outcome::Failed {
                error: e.to_string(),
            });
            if let Err(e) = write_record(&path, &fallback) {
                error!(path = %path.display(), "failed to write fallback snapshot: {e}");
            }
        } else {
            info!(
                path = %path.display(),
                trends = record.trends.len(),
                degraded = record.note.is_some() || record.error.is_some(),
                "snapshot written"
            );
        }

        path
    }

    /// Produce the outcome of one extraction without touching disk.
    pub async fn fetch(&self) -> Outcome {
        match self.try_fetch().await {
            Ok(trends) => Outcome::Success(trends),
            Err(e) if e.is_unavailable() => {
                warn!("{e}; writing empty snapshot");
                Outcome::from_error(&e)
            }
            Err(e) => {
                error!("trend extraction failed: {e}");
                Outcome::from_error(&e)
            }
        }
    }

    async fn try_fetch(&self) -> FetchResult<Vec<String>> {
        let renderer = self.launcher.launch(&self.config).await?;

        // From here on the browser is shut down whatever happens.
        let extracted = self.extract(renderer.as_ref()).await;
        let released = renderer.shutdown().await;

        match (extracted, released) {
            (Ok(trends), Ok(())) => Ok(trends),
            (Ok(_), Err(close)) => Err(close),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close)) => {
                warn!("browser shutdown also failed: {close}");
                Err(e)
            }
        }
    }

    async fn extract(&self, renderer: &dyn Renderer) -> FetchResult<Vec<String>> {
        let mut ctx = renderer.new_context().await?;
        let result = self.scrape_page(ctx.as_mut()).await;
        if let Err(e) = ctx.close().await {
            debug!("page close failed: {e}");
        }
        result
    }

    async fn scrape_page(&self, ctx: &mut dyn RenderContext) -> FetchResult<Vec<String>> {
        let timeout = self.config.navigation_timeout;
        let nav = tokio::time::timeout(timeout, ctx.navigate(&self.config.url))
            .await
            .map_err(|_| FetchError::NavigationTimeout(timeout))??;
        info!(
            url = %nav.final_url,
            load_ms = nav.load_time_ms,
            "page loaded"
        );

        // Rendering completion is not observable; wait a fixed interval.
        tokio::time::sleep(self.config.settle_delay).await;

        let limits = self.config.limits;
        let value = ctx.execute_js(&collect_script(&limits)).await?;
        let candidates: Vec<String> = serde_json::from_value(value)
            .map_err(|e| FetchError::Evaluation(format!("unexpected script result: {e}")))?;
        debug!(candidates = candidates.len(), "collected DOM text");

        Ok(select_trends(candidates, &limits))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
