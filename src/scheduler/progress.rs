//! Progress observation for batch downloads

use std::io::Write;

use crate::document::Resource;
use crate::error::{Error, Result};

/// One unit of progress, reported after an image is fully written
#[derive(Clone, Copy, Debug)]
pub struct Progress<'a> {
    /// Images completed so far, including this one (1..=total)
    pub completed: usize,
    /// Images in the batch
    pub total: usize,
    /// The image that just completed
    pub resource: &'a Resource,
}

/// Receives progress reports from the scheduler
///
/// Calls are serialized and `completed` strictly increases by one per call.
/// A failing observer aborts the batch unless the scheduler runs with
/// [`ProgressFailurePolicy::Ignore`](crate::config::ProgressFailurePolicy::Ignore).
pub trait ProgressObserver: Send + Sync {
    /// Record one completed image
    fn on_progress(&self, progress: Progress<'_>) -> Result<()>;
}

/// Observer that discards progress
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _progress: Progress<'_>) -> Result<()> {
        Ok(())
    }
}

/// Observer writing one line per completed image to stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrProgress;

impl ProgressObserver for StderrProgress {
    fn on_progress(&self, progress: Progress<'_>) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(
            stderr,
            "[{}/{}] {}",
            progress.completed,
            progress.total,
            progress.resource.file_name()
        )
        .map_err(|e| Error::Progress(e.to_string()))
    }
}
