//! Command line entry point

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use flipbook_dl::config::default_concurrency;
use flipbook_dl::scheduler::StderrProgress;
use flipbook_dl::sink::CliArtifactSink;
use flipbook_dl::{Config, Event, FlipbookDownloader, Result};

/// Download an online flipbook and save it as a PDF
#[derive(Debug, Parser)]
#[command(name = "flipbook-dl", version, about)]
struct Args {
    /// ID or URL of the book to download
    input: String,

    /// Number of concurrent downloads (0 or unset: number of CPUs - 1)
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Output folder for the PDF (default: current directory)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: Option<PathBuf>,

    /// Output folder for downloaded images (default: a temporary directory)
    #[arg(long = "image-out", value_name = "DIR")]
    image_out: Option<PathBuf>,

    /// Overwrite the PDF if it already exists
    #[arg(short = 'f', long)]
    force: bool,

    /// Base URL of the flipbook host
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retry transient failures up to N times
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Path to the img2pdf executable (default: search PATH)
    #[arg(long, value_name = "PATH")]
    img2pdf: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    /// Split into the input and the effective configuration
    fn into_config(self) -> Result<(String, Config)> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        match self.concurrency {
            Some(0) => config.concurrency = default_concurrency(),
            Some(n) => config.concurrency = n,
            None => {}
        }
        if let Some(dir) = self.output {
            config.output_dir = dir;
        }
        if let Some(dir) = self.image_out {
            config.image_output_dir = Some(dir);
        }
        if self.force {
            config.force_overwrite = true;
        }
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(retries) = self.retries {
            config.retry.max_attempts = retries;
        }
        if let Some(path) = self.img2pdf {
            config.tools.img2pdf_path = Some(path);
        }

        Ok((self.input, config))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.chain());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (input, config) = args.into_config()?;

    // Fail on a missing img2pdf before touching the network
    let sink = CliArtifactSink::from_config(&config.tools)?;
    let downloader = FlipbookDownloader::new(config)?;

    let mut events = downloader.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_milestone(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed milestone events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(flipbook_dl::cancel_on_signal(cancel.clone()));

    let result = downloader
        .run(&input, &sink, Arc::new(StderrProgress), &cancel)
        .await;

    signals.abort();
    // Closing the channel lets the printer drain what is left and exit
    drop(downloader);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Milestone printer failed");
    }

    result.map(|_| ())
}

fn print_milestone(event: &Event) {
    match event {
        Event::DocumentResolved {
            title,
            pages,
            images,
            ..
        } => {
            println!("Found book \"{title}\" with {pages} pages and {images} images");
        }
        Event::ImagesDownloaded { .. } => {
            println!("All images downloaded. Generating PDF");
        }
        Event::ArtifactWritten { path, .. } => {
            println!("PDF saved to \"{}\"", path.display());
        }
        _ => {}
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let args = Args::try_parse_from(["flipbook-dl", "abc/def"]).unwrap();
        let (input, config) = args.into_config().unwrap();

        assert_eq!(input, "abc/def");
        assert_eq!(config.concurrency, default_concurrency());
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(!config.force_overwrite);
        assert_eq!(config.retry.max_attempts, 0);
    }

    #[test]
    fn flags_are_applied() {
        let args = Args::try_parse_from([
            "flipbook-dl",
            "https://online.fliphtml5.com/abc/def",
            "-c",
            "6",
            "-o",
            "/tmp/out",
            "--image-out",
            "/tmp/img",
            "-f",
            "--timeout",
            "20",
            "--retries",
            "3",
            "--img2pdf",
            "/opt/img2pdf",
        ])
        .unwrap();
        let (_, config) = args.into_config().unwrap();

        assert_eq!(config.concurrency, 6);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.image_output_dir, Some(PathBuf::from("/tmp/img")));
        assert!(config.force_overwrite);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(
            config.tools.img2pdf_path,
            Some(PathBuf::from("/opt/img2pdf"))
        );
    }

    #[test]
    fn zero_concurrency_means_default() {
        let args = Args::try_parse_from(["flipbook-dl", "abc/def", "-c", "0"]).unwrap();
        let (_, config) = args.into_config().unwrap();
        assert_eq!(config.concurrency, default_concurrency());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"concurrency": 2, "force_overwrite": true}"#).unwrap();

        let args = Args::try_parse_from([
            "flipbook-dl",
            "abc/def",
            "--config",
            path.to_str().unwrap(),
            "-c",
            "9",
        ])
        .unwrap();
        let (_, config) = args.into_config().unwrap();

        assert_eq!(config.concurrency, 9);
        assert!(config.force_overwrite, "file value kept when no flag overrides it");
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["flipbook-dl"]).is_err());
    }
}
