//! Error types for flipbook-dl
//!
//! Every failure in the pipeline is reported through [`Error`]. Variants keep
//! their underlying cause as a `source`, so callers can walk the chain with
//! [`Error::chain`] (the CLI prints it on a single line).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flipbook-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for flipbook-dl
#[derive(Debug, Error)]
pub enum Error {
    /// The input is neither a `namespace/name` identifier nor a URL containing one
    #[error("invalid ID or URL: {input}")]
    InvalidIdentifier {
        /// The input as supplied by the caller
        input: String,
    },

    /// A manifest or image request failed (non-2xx status or transport error)
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed {
        /// Requested URL
        url: String,
        /// HTTP status, when the server answered
        status: Option<u16>,
        /// Human-readable reason (status line or transport error)
        reason: String,
        /// Transport error, if any
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The manifest payload could not be isolated or decoded
    #[error("malformed manifest: {reason}")]
    ManifestMalformed {
        /// What went wrong while isolating or decoding the payload
        reason: String,
        /// Decoder error, if any
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The manifest describes no downloadable images
    #[error("book \"{title}\" has no images")]
    NoResources {
        /// Title of the document
        title: String,
    },

    /// The output artifact already exists and overwriting was not requested
    #[error("output file \"{}\" already exists, use -f to overwrite", path.display())]
    OutputConflict {
        /// Path of the existing artifact
        path: PathBuf,
    },

    /// The computed output artifact path is a directory
    #[error("output path \"{}\" is a directory", path.display())]
    OutputIsDirectory {
        /// Offending path
        path: PathBuf,
    },

    /// The batch download stopped because one image failed
    #[error("download aborted after {completed}/{total} images: {source}")]
    DownloadAborted {
        /// Images fully written before the batch stopped
        completed: usize,
        /// Images in the batch
        total: usize,
        /// The first failure; later cancellation-induced failures are dropped
        #[source]
        source: Box<Error>,
    },

    /// The operation was cancelled from outside (e.g. Ctrl+C)
    #[error("cancelled")]
    Cancelled,

    /// The progress observer failed to record progress
    #[error("progress reporting failed: {0}")]
    Progress(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or request building error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External tool execution failed (img2pdf)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary)
    #[error("not supported: {0}")]
    NotSupported(String),
}

impl Error {
    /// Build a [`Error::FetchFailed`] for a non-success HTTP status
    pub(crate) fn http_status(url: &str, status: reqwest::StatusCode) -> Self {
        Error::FetchFailed {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: status.to_string(),
            source: None,
        }
    }

    /// Build a [`Error::FetchFailed`] for a transport-level failure
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            "request failed".to_string()
        };
        Error::FetchFailed {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            reason,
            source: Some(err),
        }
    }

    /// Whether this error is the result of cancellation rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Render the error and all of its sources on one line, outermost first
    ///
    /// # Examples
    ///
    /// ```
    /// use flipbook_dl::Error;
    ///
    /// let err = Error::DownloadAborted {
    ///     completed: 2,
    ///     total: 5,
    ///     source: Box::new(Error::Cancelled),
    /// };
    /// assert_eq!(err.chain(), "download aborted after 2/5 images: cancelled");
    /// ```
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            let text = cause.to_string();
            // Variants that already embed their source in Display would repeat it
            if !out.ends_with(&text) {
                out.push_str(": ");
                out.push_str(&text);
            }
            current = std::error::Error::source(cause);
        }
        out
    }
}
