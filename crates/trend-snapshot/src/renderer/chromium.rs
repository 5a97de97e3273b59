//! Chromium-based renderer using chromiumoxide.

use super::{Launcher, NavigationResult, RenderContext, Renderer};
use crate::config::FetcherConfig;
use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Binaries looked up on `PATH` when the configured one is missing.
const PATH_CANDIDATES: &[&str] = &[
    "chromium-browser",
    "chromium",
    "google-chrome",
    "google-chrome-stable",
];

/// Added to the navigation timeout to get the CDP request timeout, so the
/// fetcher's own bound is always the one that fires first.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// How long to wait for the process to exit before killing it.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// True once the navigated document has been parsed (DOMContentLoaded).
const READY_SCRIPT: &str =
    "document.readyState !== 'loading' && location.href !== 'about:blank'";

/// Find the Chromium binary, preferring the configured path.
pub fn find_chromium(preferred: &Path) -> Option<PathBuf> {
    if preferred.exists() {
        return Some(preferred.to_path_buf());
    }

    PATH_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Build the launch configuration for `chrome_path`.
pub fn browser_config(chrome_path: PathBuf, config: &FetcherConfig) -> FetchResult<BrowserConfig> {
    BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .request_timeout(config.navigation_timeout + REQUEST_TIMEOUT_MARGIN)
        .arg("--headless=new")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .build()
        .map_err(|e| FetchError::Launch(format!("failed to build browser config: {e}")))
}

/// Launches headless Chromium.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumLauncher;

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self, config: &FetcherConfig) -> FetchResult<Box<dyn Renderer>> {
        let chrome_path = find_chromium(&config.chromium_path).ok_or_else(|| {
            FetchError::BrowserUnavailable(format!(
                "no Chromium executable at {} or on PATH",
                config.chromium_path.display()
            ))
        })?;
        debug!(path = %chrome_path.display(), "launching Chromium");
        Ok(Box::new(ChromiumRenderer::launch(chrome_path, config).await?))
    }
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance from `chrome_path`.
    pub async fn launch(chrome_path: PathBuf, config: &FetcherConfig) -> FetchResult<Self> {
        let (browser, mut handler) = Browser::launch(browser_config(chrome_path, config)?)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        // Drive the CDP connection until the browser goes away.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("chromium handler: {e}");
                }
            }
        });

        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> FetchResult<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Launch(format!("failed to create new page: {e}")))?;

        Ok(Box::new(ChromiumContext { page }))
    }

    async fn shutdown(self: Box<Self>) -> FetchResult<()> {
        let Self {
            mut browser,
            handler,
        } = *self;
        let released = release(&mut browser, REAP_TIMEOUT).await;
        handler.abort();
        released
    }
}

/// The parts of a browser process that shutdown needs.
#[async_trait]
trait BrowserProcess: Send {
    /// Ask the browser to close over CDP.
    async fn close(&mut self) -> Result<(), String>;
    /// Wait for the child process to exit.
    async fn wait(&mut self) -> std::io::Result<()>;
    /// Kill the child process.
    async fn kill(&mut self);
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> std::io::Result<()> {
        Browser::wait(self).await.map(|_| ())
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = Browser::kill(self).await {
            warn!("failed to kill Chromium process: {e}");
        }
    }
}

/// Close the browser and reap its process. Never waits longer than
/// `reap_timeout` twice: an unresponsive process is killed.
async fn release<P: BrowserProcess>(process: &mut P, reap_timeout: Duration) -> FetchResult<()> {
    let closed = process.close().await;
    if let Err(e) = &closed {
        warn!("browser close failed, killing process: {e}");
        process.kill().await;
    }

    match tokio::time::timeout(reap_timeout, process.wait()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("failed to reap Chromium process: {e}"),
        Err(_) => {
            warn!(
                "Chromium still running after {}ms, killing",
                reap_timeout.as_millis()
            );
            process.kill().await;
            if tokio::time::timeout(reap_timeout, process.wait()).await.is_err() {
                warn!("Chromium did not exit after kill");
            }
        }
    }

    closed.map_err(FetchError::Close)
}

/// Poll `check` until it reports true. Errors count as "not yet", since
/// the execution context is replaced while a navigation commits.
async fn wait_until<F, Fut>(mut check: F, interval: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchResult<bool>>,
{
    loop {
        match check().await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => debug!("readiness check failed: {e}"),
        }
        tokio::time::sleep(interval).await;
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    /// Issues `Page.navigate` and returns once the document is parsed,
    /// without waiting for the `load` event.
    async fn navigate(&mut self, url: &str) -> FetchResult<NavigationResult> {
        let start = Instant::now();

        let response = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        if let Some(err) = response.result.error_text {
            return Err(FetchError::Navigation(err));
        }

        let page = &self.page;
        wait_until(
            || async move {
                page.evaluate(READY_SCRIPT)
                    .await
                    .map_err(|e| FetchError::Evaluation(e.to_string()))?
                    .into_value::<bool>()
                    .map_err(|e| FetchError::Evaluation(e.to_string()))
            },
            READY_POLL_INTERVAL,
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms,
        })
    }

    async fn execute_js(&self, script: &str) -> FetchResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| FetchError::Evaluation(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| FetchError::Evaluation(format!("failed to convert JS result: {e}")))
    }

    async fn close(self: Box<Self>) -> FetchResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| FetchError::Close(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A browser process whose close result and exit behavior are scripted.
    struct StubProcess {
        close_fails: bool,
        /// Exit only once killed.
        hangs: bool,
        killed: bool,
        kills: usize,
    }

    impl StubProcess {
        fn new(close_fails: bool, hangs: bool) -> Self {
            Self {
                close_fails,
                hangs,
                killed: false,
                kills: 0,
            }
        }
    }

    #[async_trait]
    impl BrowserProcess for StubProcess {
        async fn close(&mut self) -> Result<(), String> {
            if self.close_fails {
                Err("Request timed out".into())
            } else {
                Ok(())
            }
        }

        async fn wait(&mut self) -> std::io::Result<()> {
            if self.hangs && !self.killed {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn kill(&mut self) {
            self.killed = true;
            self.kills += 1;
        }
    }

    #[test]
    fn configured_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, "").unwrap();
        assert_eq!(find_chromium(&fake), Some(fake));
    }

    #[test]
    fn request_timeout_outlasts_navigation_timeout() {
        let config = FetcherConfig::default();
        let built = browser_config(PathBuf::from("/opt/chrome/chrome"), &config).unwrap();
        let debug = format!("{built:?}");
        assert!(
            debug.contains("request_timeout: 50s"),
            "unexpected browser config: {debug}"
        );

        let short = FetcherConfig {
            navigation_timeout: Duration::from_secs(10),
            ..FetcherConfig::default()
        };
        let built = browser_config(PathBuf::from("/opt/chrome/chrome"), &short).unwrap();
        assert!(format!("{built:?}").contains("request_timeout: 15s"));
    }

    #[tokio::test]
    async fn failed_close_kills_before_waiting() {
        let mut process = StubProcess::new(true, true);
        let result = release(&mut process, Duration::from_millis(20)).await;

        assert!(matches!(result, Err(FetchError::Close(ref e)) if e.contains("timed out")));
        assert_eq!(process.kills, 1);
    }

    #[tokio::test]
    async fn hung_process_is_killed_after_reap_timeout() {
        let mut process = StubProcess::new(false, true);
        let result = release(&mut process, Duration::from_millis(20)).await;

        assert!(result.is_ok());
        assert_eq!(process.kills, 1);
    }

    #[tokio::test]
    async fn clean_exit_is_not_killed() {
        let mut process = StubProcess::new(false, false);
        release(&mut process, Duration::from_millis(20)).await.unwrap();
        assert_eq!(process.kills, 0);
    }

    #[tokio::test]
    async fn readiness_retries_until_true() {
        let calls = AtomicUsize::new(0);
        wait_until(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Err(FetchError::Evaluation("context destroyed".into())),
                        1 => Ok(false),
                        _ => Ok(true),
                    }
                }
            },
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_execute_js() {
        let config = FetcherConfig::default();
        let renderer = ChromiumLauncher
            .launch(&config)
            .await
            .expect("failed to launch Chromium");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate("data:text/html,<a>Hello world</a><span>abc</span>")
            .await
            .expect("navigation failed");

        let result = ctx
            .execute_js(&crate::extract::collect_script(&config.limits))
            .await
            .expect("JS execution failed");
        let texts: Vec<String> = serde_json::from_value(result).unwrap();
        assert!(texts.iter().any(|t| t == "Hello world"));

        ctx.close().await.expect("close failed");
        renderer.shutdown().await.expect("shutdown failed");
    }
}
