//! Configuration types for flipbook-dl

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration for [`FlipbookDownloader`](crate::FlipbookDownloader)
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid
/// configuration. The CLI builds one of these from its flags, optionally on top
/// of a JSON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the flipbook host (default: "https://online.fliphtml5.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of images downloaded at once (default: available parallelism - 1, min 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory the PDF is written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory downloaded images are written to (None = fresh temporary directory)
    #[serde(default)]
    pub image_output_dir: Option<PathBuf>,

    /// Overwrite an existing PDF instead of aborting (default: false)
    #[serde(default)]
    pub force_overwrite: bool,

    /// Per-request timeout (None = transport default)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Retry configuration for transient failures (disabled by default)
    #[serde(default)]
    pub retry: RetryConfig,

    /// What to do when the progress observer fails
    #[serde(default)]
    pub progress_failure: ProgressFailurePolicy,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            image_output_dir: None,
            force_overwrite: false,
            request_timeout: None,
            retry: RetryConfig::default(),
            progress_failure: ProgressFailurePolicy::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("concurrency".to_string()),
            });
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::Config {
                message: format!("base URL '{}' must be an http(s) URL", self.base_url),
                key: Some("base_url".to_string()),
            });
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "retry backoff multiplier must be >= 1.0".to_string(),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }

        Ok(())
    }

    /// Base URL without a trailing slash
    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// External tool paths
///
/// Flattened into [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the img2pdf executable (auto-detected if None)
    #[serde(default)]
    pub img2pdf_path: Option<PathBuf>,

    /// Whether to search PATH for img2pdf if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            img2pdf_path: None,
            search_path: true,
        }
    }
}

/// Retry configuration for transient failures
///
/// `max_attempts = 0` (the default) means every failure is final.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0, disabled)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// How the scheduler treats a failing progress observer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressFailurePolicy {
    /// Abort the whole batch (default)
    #[default]
    Abort,
    /// Log a warning and keep downloading
    Ignore,
}

fn default_base_url() -> String {
    "https://online.fliphtml5.com".to_string()
}

/// Default worker bound: one less than the available parallelism, at least 1
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
