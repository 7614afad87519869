//! Final artifact assembly
//!
//! The pipeline treats assembly as a black box behind [`ArtifactSink`]: it
//! receives the downloaded images in document order and an output path.
//!
//! - [`CliArtifactSink`]: builds a PDF with the external `img2pdf` binary
//!
//! An unavailable sink is reported as
//! [`Error::NotSupported`](crate::Error::NotSupported) before any download
//! starts.

mod cli;
mod traits;

pub use cli::CliArtifactSink;
pub use traits::ArtifactSink;
