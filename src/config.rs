//! Run configuration
//!
//! Everything a harvest run needs is carried in `HarvestConfig` and passed
//! explicitly through the pipeline.

use crate::fetch::FetchOptions;
use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

/// Site scraped when none is given
pub const DEFAULT_SITE: &str = "nickelodeon.be";

/// Where rtmpdump usually gets installed
pub const DEFAULT_CAPTURE_TOOL: &str = "/usr/local/bin/rtmpdump";

/// Container extension of recorded episodes
pub const DEFAULT_CONTAINER: &str = "mp4";

/// Errors in the run configuration, detected before any network activity
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option was not provided
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// An option has a value that cannot be used
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue {
        option: &'static str,
        reason: String,
    },
}

/// Configuration of a single harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Origin host serving the show pages
    pub site: String,
    /// Path segment identifying the show on the site
    pub show: String,
    /// Root directory of the media library
    pub media_root: PathBuf,
    /// Capture executable
    pub capture_tool: PathBuf,
    /// Extension of recorded files
    pub container: String,
    /// Directory receiving in-progress recordings
    pub scratch_dir: PathBuf,
    /// Resolve streams without capturing them
    pub dry_run: bool,
    /// Executable run with the show directory after new episodes were captured
    pub rescan_command: Option<PathBuf>,
    /// HTTP client settings
    pub fetch: FetchOptions,
}

impl HarvestConfig {
    /// Creates a configuration with defaults for everything but show and media root.
    pub fn new(show: impl Into<String>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            show: show.into(),
            media_root: media_root.into(),
            capture_tool: PathBuf::from(DEFAULT_CAPTURE_TOOL),
            container: DEFAULT_CONTAINER.to_string(),
            scratch_dir: std::env::temp_dir(),
            dry_run: false,
            rescan_command: None,
            fetch: FetchOptions::default(),
        }
    }

    /// Checks that the configuration is complete and usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.show.trim().is_empty() {
            return Err(ConfigError::MissingOption("show"));
        }
        if self.media_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingOption("path"));
        }
        if self.site.trim().is_empty() {
            return Err(ConfigError::MissingOption("site"));
        }
        if self.container.is_empty()
            || !self.container.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::InvalidValue {
                option: "container",
                reason: format!("'{}' is not a plain file extension", self.container),
            });
        }

        self.show_url().map(|_| ())
    }

    /// URL of the show's listing page, `http://<site>/<show>`.
    pub fn show_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse(&format!("http://{}/", self.site.trim())).map_err(|e| {
            ConfigError::InvalidValue {
                option: "site",
                reason: e.to_string(),
            }
        })?;
        url.set_path(self.show.trim().trim_matches('/'));

        Ok(url.to_string())
    }
}
