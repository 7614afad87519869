//! Events emitted while a book is processed

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Milestone emitted by [`FlipbookDownloader`](crate::FlipbookDownloader)
///
/// Subscribe with [`FlipbookDownloader::subscribe`](crate::FlipbookDownloader::subscribe).
/// Per-image progress goes through
/// [`ProgressObserver`](crate::scheduler::ProgressObserver) instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Manifest fetched and decoded
    DocumentResolved {
        /// Book identifier (`namespace/name`)
        id: String,
        /// Decoded title
        title: String,
        /// Number of pages
        pages: usize,
        /// Number of images across all pages
        images: usize,
    },

    /// Batch download starting
    DownloadStarted {
        /// Book identifier
        id: String,
        /// Images to download
        images: usize,
        /// Directory the images are written to
        image_dir: PathBuf,
    },

    /// Every image downloaded and reordered
    ImagesDownloaded {
        /// Book identifier
        id: String,
        /// Images downloaded
        images: usize,
    },

    /// Artifact assembly starting
    Assembling {
        /// Book identifier
        id: String,
        /// Destination of the artifact
        output: PathBuf,
        /// Sink implementation name
        sink: String,
    },

    /// Artifact written
    ArtifactWritten {
        /// Book identifier
        id: String,
        /// Path of the artifact
        path: PathBuf,
    },

    /// Processing failed
    Failed {
        /// Book identifier, if it could be resolved
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Error message with its cause chain
        error: String,
    },
}
