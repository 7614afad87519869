//! Sink that records what it was given

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flipbook_dl::sink::ArtifactSink;

/// Concatenates the images into the output and remembers the call
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingSink {
    /// Image lists of every `assemble` call so far
    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// File names of the images handed over in the only call
    pub fn file_names(&self) -> Vec<String> {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one assemble call");
        calls[0]
            .iter()
            .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
            .collect()
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn assemble(&self, images: &[PathBuf], output: &Path) -> flipbook_dl::Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(images.to_vec());

        let mut combined = Vec::new();
        for image in images {
            combined.extend(tokio::fs::read(image).await?);
        }
        tokio::fs::write(output, combined).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
