//! Artifact sink trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Trait for combining ordered page images into the final artifact
///
/// The scheduler hands over the local paths of every downloaded image in
/// document order; what the sink produces from them is opaque to the rest of
/// the pipeline.
///
/// # Examples
///
/// ```no_run
/// use flipbook_dl::sink::{ArtifactSink, CliArtifactSink};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = CliArtifactSink::from_path().expect("img2pdf binary not found");
///
/// let pages = vec![PathBuf::from("1-1.jpg"), PathBuf::from("2-1.jpg")];
/// sink.assemble(&pages, Path::new("Book.pdf")).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Write the artifact for `images` (already in document order) to `output`
    ///
    /// Must not leave a partial artifact at `output` on failure.
    async fn assemble(&self, images: &[PathBuf], output: &Path) -> crate::Result<()>;

    /// Implementation name, for logging
    fn name(&self) -> &'static str;
}
