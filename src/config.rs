//! Configuration types for notes-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration for [`NoteScraper`](crate::NoteScraper)
///
/// Immutable for the duration of one run. All fields have sensible defaults
/// except `cookies`, which the vendor requires on every call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Vendor base URL (default: the official web frontend)
    ///
    /// Tests point this at a local mock server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credential cookie string, sent verbatim in the `Cookie` header
    pub cookies: String,

    /// Optional HTTP(S) proxy URL applied to all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Output directory pair (media root, spreadsheet root)
    #[serde(default)]
    pub output: OutputConfig,

    /// Retry policy for the per-note fetch
    #[serde(default)]
    pub retry: RetryConfig,

    /// Inter-request pacing window
    #[serde(default)]
    pub pacing: PacingConfig,

    /// When spreadsheet rows are written to disk
    #[serde(default)]
    pub flush: FlushStrategy,
}

impl Config {
    /// Build a configuration with the given credential and defaults elsewhere
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            cookies: cookies.into(),
            proxy: None,
            output: OutputConfig::default(),
            retry: RetryConfig::default(),
            pacing: PacingConfig::default(),
            flush: FlushStrategy::default(),
        }
    }

    /// Validate settings that would otherwise fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.cookies.trim().is_empty() {
            return Err(Error::config("cookies must not be empty", "cookies"));
        }
        if self.pacing.max < self.pacing.min {
            return Err(Error::config(
                "pacing.max must be >= pacing.min",
                "pacing.max",
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "backoff_multiplier must be >= 1.0",
                "retry.backoff_multiplier",
            ));
        }
        Ok(())
    }
}

/// Output directory pair
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for downloaded media (default: "./media")
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Root directory for spreadsheet files (default: "./spreadsheets")
    #[serde(default = "default_spreadsheet_dir")]
    pub spreadsheet_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            spreadsheet_dir: default_spreadsheet_dir(),
        }
    }
}

/// Retry configuration for transient fetch failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum total attempts, the initial call included (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 4 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Cap on the delay between retries (default: 65 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(65),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Pacing window for the sleep between batch items
///
/// After every attempt the runner sleeps a uniform random duration in
/// `[min, max)` to keep the request rate acceptable to the vendor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the sleep window (default: 2 seconds)
    #[serde(default = "default_pacing_min", with = "duration_serde")]
    pub min: Duration,

    /// Upper bound of the sleep window (default: 3 seconds)
    #[serde(default = "default_pacing_max", with = "duration_serde")]
    pub max: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min: default_pacing_min(),
            max: default_pacing_max(),
        }
    }
}

/// When spreadsheet rows are written
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushStrategy {
    /// Write and flush one row per successful note (default)
    ///
    /// Preserves partial results if the run is interrupted.
    #[default]
    Streaming,
    /// Collect successful notes and write the spreadsheet once at the end
    Buffered,
}

/// What a run produces: spreadsheet rows, media files, or both
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Spreadsheet rows and all media
    All,
    /// Spreadsheet rows only
    Spreadsheet,
    /// Media files only, restricted by the filter
    Media(MediaFilter),
}

impl SaveMode {
    /// True if this mode writes spreadsheet rows
    pub fn wants_spreadsheet(&self) -> bool {
        matches!(self, SaveMode::All | SaveMode::Spreadsheet)
    }

    /// The media filter in effect, or None if this mode downloads nothing
    pub fn media_filter(&self) -> Option<MediaFilter> {
        match self {
            SaveMode::All => Some(MediaFilter::All),
            SaveMode::Spreadsheet => None,
            SaveMode::Media(filter) => Some(*filter),
        }
    }
}

impl FromStr for SaveMode {
    type Err = Error;

    /// Accepts the historical string forms: "all", "excel", "media",
    /// "media-video", "media-image". Any other value containing "media"
    /// downloads all media.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SaveMode::All),
            "excel" => Ok(SaveMode::Spreadsheet),
            "media" => Ok(SaveMode::Media(MediaFilter::All)),
            "media-video" => Ok(SaveMode::Media(MediaFilter::VideoOnly)),
            "media-image" => Ok(SaveMode::Media(MediaFilter::ImageOnly)),
            other if other.contains("media") => Ok(SaveMode::Media(MediaFilter::All)),
            other => Err(Error::config(
                format!("unknown save mode '{other}'"),
                "save_mode",
            )),
        }
    }
}

/// Which media assets to download
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFilter {
    /// Videos, covers and images (default)
    #[default]
    All,
    /// Video files and their covers only
    VideoOnly,
    /// Image files only
    ImageOnly,
}

impl MediaFilter {
    /// True if video assets should be downloaded
    pub fn includes_video(&self) -> bool {
        matches!(self, MediaFilter::All | MediaFilter::VideoOnly)
    }

    /// True if image assets should be downloaded
    pub fn includes_image(&self) -> bool {
        matches!(self, MediaFilter::All | MediaFilter::ImageOnly)
    }
}

fn default_base_url() -> String {
    "https://www.xiaohongshu.com".to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

fn default_spreadsheet_dir() -> PathBuf {
    PathBuf::from("./spreadsheets")
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(4)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(65)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_pacing_min() -> Duration {
    Duration::from_secs(2)
}

fn default_pacing_max() -> Duration {
    Duration::from_secs(3)
}

// Duration serialization helper (fractional seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
