//! Restoring document order after out-of-order completion

use std::path::PathBuf;

use crate::document::DownloadedResource;

/// Sort downloaded images by their global order key
///
/// The sort is stable, idempotent, and independent of the order results
/// arrived in.
pub fn reorder(mut results: Vec<DownloadedResource>) -> Vec<DownloadedResource> {
    results.sort_by_key(DownloadedResource::overall_order);
    results
}

/// Local paths of already ordered results
pub fn ordered_paths(results: &[DownloadedResource]) -> Vec<PathBuf> {
    results.iter().map(|r| r.local_path.clone()).collect()
}
