//! PDF sink driving the external img2pdf binary

use super::traits::ArtifactSink;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::config::ToolsConfig;

const BINARY_NAME: &str = "img2pdf";

/// PDF sink using the external `img2pdf` binary
///
/// The PDF is first written next to the output as `<output>.part` and
/// renamed into place only once img2pdf has succeeded.
///
/// # Examples
///
/// ```no_run
/// use flipbook_dl::sink::CliArtifactSink;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let sink = CliArtifactSink::new(PathBuf::from("/usr/bin/img2pdf"));
///
/// // Or auto-discover from PATH
/// let sink = CliArtifactSink::from_path().expect("img2pdf not found in PATH");
/// ```
#[derive(Clone, Debug)]
pub struct CliArtifactSink {
    binary_path: PathBuf,
}

impl CliArtifactSink {
    /// Create a sink with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find img2pdf in PATH
    pub fn from_path() -> Option<Self> {
        which::which(BINARY_NAME).ok().map(Self::new)
    }

    /// Resolve the binary from configuration
    ///
    /// An explicit `img2pdf_path` wins; otherwise PATH is searched when
    /// `search_path` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`](crate::Error::NotSupported) if no usable binary is found.
    pub fn from_config(tools: &ToolsConfig) -> crate::Result<Self> {
        if let Some(path) = &tools.img2pdf_path {
            if path.is_file() {
                return Ok(Self::new(path.clone()));
            }
            return Err(crate::Error::NotSupported(format!(
                "configured {} binary {} does not exist",
                BINARY_NAME,
                path.display()
            )));
        }

        if tools.search_path
            && let Some(sink) = Self::from_path()
        {
            return Ok(sink);
        }

        Err(crate::Error::NotSupported(format!(
            "{BINARY_NAME} not found, install it or pass its location with --img2pdf"
        )))
    }

    /// Path of the binary this sink runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

fn part_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

#[async_trait]
impl ArtifactSink for CliArtifactSink {
    async fn assemble(&self, images: &[PathBuf], output: &Path) -> crate::Result<()> {
        if images.is_empty() {
            return Err(crate::Error::ExternalTool(
                "no images to assemble".to_string(),
            ));
        }

        let part = part_path(output);

        tracing::debug!(
            binary = %self.binary_path.display(),
            images = images.len(),
            output = %output.display(),
            "Running img2pdf"
        );

        let result = Command::new(&self.binary_path)
            .args(images)
            .arg("-o")
            .arg(&part)
            .kill_on_drop(true)
            .output()
            .await;

        let output_status = match result {
            Ok(out) => out,
            Err(e) => {
                discard(&part).await;
                return Err(crate::Error::ExternalTool(format!(
                    "Failed to execute {BINARY_NAME}: {e}"
                )));
            }
        };

        if !output_status.status.success() {
            discard(&part).await;
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(crate::Error::ExternalTool(format!(
                "{BINARY_NAME} exited with {}: {}",
                output_status.status,
                stderr.trim()
            )));
        }

        if let Err(e) = tokio::fs::rename(&part, output).await {
            discard(&part).await;
            return Err(e.into());
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-img2pdf"
    }
}

async fn discard(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %part.display(), error = %e, "Failed to remove partial artifact");
    }
}
