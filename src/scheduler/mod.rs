//! Bounded, fail-fast batch download of document images
//!
//! Images are admitted in document order, each only after it holds one of
//! `concurrency` permits, so at most that many downloads are in flight. All
//! tasks share a cancellation scope derived from the caller's token: the
//! first task to fail cancels the scope before giving its permit back, which
//! stops admission and interrupts every in-flight request. Only that first
//! failure is reported; the cancellation errors it causes in sibling tasks
//! are dropped.
//!
//! Split into:
//! - [`fetcher`] - the per-image download seam ([`ResourceFetcher`]) and its HTTP implementation
//! - [`progress`] - progress observation
//! - [`reorder`] - restoring document order after out-of-order completion

mod fetcher;
mod progress;
mod reorder;

pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use progress::{NoopProgress, Progress, ProgressObserver, StderrProgress};
pub use reorder::{ordered_paths, reorder};

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ProgressFailurePolicy;
use crate::document::{DownloadedResource, Resource};
use crate::error::{Error, Result};

/// Parameters for downloading one batch of images
pub struct DownloadBatch {
    /// Images to download, in document order
    pub resources: Vec<Resource>,
    /// Directory the images are written to (created if absent)
    pub dest_dir: PathBuf,
    /// Maximum number of downloads in flight (0 is treated as 1)
    pub concurrency: usize,
    /// Per-image download implementation
    pub fetcher: Arc<dyn ResourceFetcher>,
    /// Receives one report per completed image
    pub observer: Arc<dyn ProgressObserver>,
    /// What to do when the observer fails
    pub progress_failure: ProgressFailurePolicy,
    /// Caller's cancellation token; cancelling it aborts the batch with [`Error::Cancelled`]
    pub cancel: CancellationToken,
}

/// Shared state handed to every download task
struct TaskContext {
    dest_dir: PathBuf,
    fetcher: Arc<dyn ResourceFetcher>,
    observer: Arc<dyn ProgressObserver>,
    progress_failure: ProgressFailurePolicy,
    /// Completed count; held while the observer runs so reports stay ordered
    completed: Mutex<usize>,
    total: usize,
    /// The failure that aborted the batch, set by the task that cancels the scope
    first_error: OnceLock<Error>,
}

/// Download every resource of the batch
///
/// Returns one [`DownloadedResource`] per input resource, in completion
/// order; pass the result through [`reorder`] to restore document order.
///
/// # Errors
///
/// - [`Error::DownloadAborted`] wrapping the first task failure
/// - [`Error::Cancelled`] if the caller's token was cancelled
/// - [`Error::Io`] if the destination directory cannot be created
pub async fn download_all(batch: DownloadBatch) -> Result<Vec<DownloadedResource>> {
    let DownloadBatch {
        resources,
        dest_dir,
        concurrency,
        fetcher,
        observer,
        progress_failure,
        cancel,
    } = batch;

    let total = resources.len();
    let limit = concurrency.max(1);

    tokio::fs::create_dir_all(&dest_dir).await?;

    tracing::info!(
        images = total,
        concurrency = limit,
        dest_dir = %dest_dir.display(),
        "Starting batch download"
    );

    let scope = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(limit));
    let ctx = Arc::new(TaskContext {
        dest_dir,
        fetcher,
        observer,
        progress_failure,
        completed: Mutex::new(0),
        total,
        first_error: OnceLock::new(),
    });

    let mut tasks = JoinSet::new();

    for resource in resources {
        // Stop admitting as soon as the scope is cancelled, even if a permit is free
        let permit = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let ctx = ctx.clone();
        let scope = scope.clone();
        tasks.spawn(async move {
            let result = download_one(&ctx, &resource, &scope).await;

            let result = match result {
                Err(e) if e.is_cancelled() => Err(e),
                Err(e) if scope.is_cancelled() => {
                    tracing::debug!(
                        overall_order = resource.overall_order,
                        error = %e,
                        "Dropping failure after batch abort"
                    );
                    Err(Error::Cancelled)
                }
                Err(e) => {
                    // Whoever records the first error cancels the scope, before the permit is released
                    match ctx.first_error.set(e) {
                        Ok(()) => scope.cancel(),
                        Err(e) => {
                            tracing::debug!(
                                overall_order = resource.overall_order,
                                error = %e,
                                "Dropping concurrent failure"
                            );
                        }
                    }
                    Err(Error::Cancelled)
                }
                ok => ok,
            };

            drop(permit);
            result
        });
    }

    let mut results = Vec::with_capacity(total);

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(downloaded)) => results.push(downloaded),
            Ok(Err(_)) => {}
            Err(join_err) => {
                let _ = ctx.first_error.set(Error::Io(std::io::Error::other(format!(
                    "download task failed: {join_err}"
                ))));
                scope.cancel();
            }
        }
    }

    // Every task has finished, so this is the last reference
    let first_error = Arc::into_inner(ctx).and_then(|ctx| ctx.first_error.into_inner());

    if let Some(e) = first_error {
        tracing::error!(
            completed = results.len(),
            total,
            error = %e,
            "Batch download aborted"
        );
        return Err(Error::DownloadAborted {
            completed: results.len(),
            total,
            source: Box::new(e),
        });
    }

    if cancel.is_cancelled() {
        tracing::info!(completed = results.len(), total, "Batch download cancelled");
        return Err(Error::Cancelled);
    }

    if results.len() != total {
        return Err(Error::Io(std::io::Error::other(format!(
            "expected {total} downloaded images, got {}",
            results.len()
        ))));
    }

    tracing::info!(images = total, "Batch download complete");
    Ok(results)
}

async fn download_one(
    ctx: &TaskContext,
    resource: &Resource,
    scope: &CancellationToken,
) -> Result<DownloadedResource> {
    if scope.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tracing::debug!(
        overall_order = resource.overall_order,
        url = %resource.url,
        "Downloading image"
    );

    let downloaded = ctx.fetcher.fetch(resource, &ctx.dest_dir, scope).await?;

    let mut completed = ctx.completed.lock().await;
    *completed += 1;
    let report = ctx.observer.on_progress(Progress {
        completed: *completed,
        total: ctx.total,
        resource: &downloaded.resource,
    });

    if let Err(e) = report {
        match ctx.progress_failure {
            ProgressFailurePolicy::Abort => return Err(e),
            ProgressFailurePolicy::Ignore => {
                tracing::warn!(error = %e, "Progress reporting failed, continuing");
            }
        }
    }

    Ok(downloaded)
}
