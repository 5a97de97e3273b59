//! Fetcher configuration and its defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Page listing the current trending searches.
pub const DEFAULT_URL: &str = "https://trends.google.com/trending?geo=VN";

/// Browser binary tried before falling back to a `PATH` lookup.
pub const DEFAULT_CHROMIUM_PATH: &str = "/usr/bin/chromium-browser";

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_FILE_PREFIX: &str = "browser_trends";

/// Tag written into every record's `source` field.
pub const SOURCE_TAG: &str = "chromium";

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2500);

/// Candidate text length bounds, inclusive, counted after trimming.
pub const DEFAULT_MIN_LEN: usize = 4;
pub const DEFAULT_MAX_LEN: usize = 80;

pub const DEFAULT_MAX_TRENDS: usize = 30;

/// Limits applied to DOM text candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLimits {
    pub min_len: usize,
    pub max_len: usize,
    pub max_trends: usize,
}

impl Default for CandidateLimits {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
            max_trends: DEFAULT_MAX_TRENDS,
        }
    }
}

/// Everything a single fetch run needs. Built once and passed in.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub url: String,
    pub chromium_path: PathBuf,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub limits: CandidateLimits,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            url: DEFAULT_URL.to_string(),
            chromium_path: PathBuf::from(DEFAULT_CHROMIUM_PATH),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            limits: CandidateLimits::default(),
        }
    }
}

impl FetcherConfig {
    /// Apply optional overrides on top of the defaults.
    pub fn with_overrides(
        output_dir: Option<PathBuf>,
        url: Option<String>,
        chromium_path: Option<PathBuf>,
    ) -> Self {
        let mut config = Self::default();
        if let Some(dir) = output_dir {
            config.output_dir = dir;
        }
        if let Some(url) = url {
            config.url = url;
        }
        if let Some(path) = chromium_path {
            config.chromium_path = path;
        }
        config
    }
}
