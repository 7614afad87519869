//! # flipbook-dl
//!
//! Download online flipbooks as ordered page images and assemble them into a
//! single PDF.
//!
//! ## How it works
//!
//! - The input (a `namespace/name` identifier or any URL containing one) is
//!   resolved to an [`Identifier`](identifier::Identifier)
//! - The book's manifest script is fetched and its embedded JSON decoded into
//!   a [`Document`]
//! - Every image is downloaded under a fixed concurrency limit; the first
//!   failure cancels the rest of the batch
//! - Images are put back into document order and handed to an
//!   [`ArtifactSink`](sink::ArtifactSink)
//!
//! ## Quick Start
//!
//! ```no_run
//! use flipbook_dl::{Config, FlipbookDownloader};
//! use flipbook_dl::scheduler::StderrProgress;
//! use flipbook_dl::sink::CliArtifactSink;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         concurrency: 4,
//!         ..Default::default()
//!     };
//!     let sink = CliArtifactSink::from_config(&config.tools)?;
//!     let downloader = FlipbookDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let cancel = CancellationToken::new();
//!     tokio::spawn(flipbook_dl::cancel_on_signal(cancel.clone()));
//!
//!     let pdf = downloader
//!         .run("abcd/efgh", &sink, Arc::new(StderrProgress), &cancel)
//!         .await?;
//!     println!("{}", pdf.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Document model and resource enumeration
pub mod document;
/// Error types
pub mod error;
/// Identifier resolution
pub mod identifier;
/// Manifest retrieval and decoding
pub mod manifest;
/// End-to-end processing
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Bounded batch download
pub mod scheduler;
/// Artifact assembly
pub mod sink;
/// Events
pub mod types;

// Re-export commonly used types
pub use config::{Config, ProgressFailurePolicy, RetryConfig, ToolsConfig};
pub use document::{Document, DownloadedResource, Page, Resource};
pub use error::{Error, Result};
pub use identifier::Identifier;
pub use pipeline::FlipbookDownloader;
pub use types::Event;

use tokio_util::sync::CancellationToken;

/// Cancel `token` once a termination signal arrives
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Meant to be spawned next to [`FlipbookDownloader::run`] with a clone of
/// the token passed to it.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = wait_for_signal() => {
            token.cancel();
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
