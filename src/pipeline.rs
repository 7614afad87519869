//! End-to-end processing of one book
//!
//! [`FlipbookDownloader`] owns the HTTP client and the event channel and
//! composes the stages: identifier resolution, manifest fetch and decode,
//! output checks, bounded download, reordering and artifact assembly. Each
//! stage is also exposed on its own for callers that want to drive them.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::document::{Document, DownloadedResource};
use crate::error::{Error, Result};
use crate::identifier;
use crate::manifest;
use crate::scheduler::{
    self, DownloadBatch, HttpFetcher, ProgressObserver, ResourceFetcher, ordered_paths, reorder,
};
use crate::sink::ArtifactSink;
use crate::types::Event;

const USER_AGENT: &str = concat!("flipbook-dl/", env!("CARGO_PKG_VERSION"));

/// Prefix of freshly created scratch directories
const TEMP_DIR_PREFIX: &str = "flipbook-dl-";

/// Downloads flipbooks and hands their pages to an [`ArtifactSink`]
///
/// # Examples
///
/// ```no_run
/// use flipbook_dl::{Config, FlipbookDownloader};
/// use flipbook_dl::scheduler::NoopProgress;
/// use flipbook_dl::sink::CliArtifactSink;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let sink = CliArtifactSink::from_config(&config.tools)?;
/// let downloader = FlipbookDownloader::new(config)?;
///
/// let pdf = downloader
///     .run("abcd/efgh", &sink, Arc::new(NoopProgress), &CancellationToken::new())
///     .await?;
/// println!("saved {}", pdf.display());
/// # Ok(())
/// # }
/// ```
pub struct FlipbookDownloader {
    config: Arc<Config>,
    client: reqwest::Client,
    fetcher: Arc<dyn ResourceFetcher>,
    event_tx: broadcast::Sender<Event>,
}

/// Directory the images of one run are written to
#[derive(Debug)]
pub struct ImageDir {
    path: PathBuf,
    temporary: bool,
}

impl ImageDir {
    /// Location of the directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory was created as scratch space for this run
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Remove the directory if it is scratch space; configured directories are kept
    pub async fn cleanup(&self) {
        if !self.temporary {
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove image directory");
        }
    }
}

impl FlipbookDownloader {
    /// Create a downloader from a validated configuration
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - [`Error::Network`] if the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let fetcher = Arc::new(HttpFetcher::new(client.clone(), config.retry.clone()));
        let (event_tx, _rx) = broadcast::channel(64);

        Ok(Self {
            config: Arc::new(config),
            client,
            fetcher,
            event_tx,
        })
    }

    /// Subscribe to milestone events
    ///
    /// Events sent while nobody is subscribed are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Resolve `input` and fetch the document it names
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIdentifier`] before any request is made, then
    /// [`Error::FetchFailed`] or [`Error::ManifestMalformed`].
    pub async fn fetch_document(&self, input: &str, cancel: &CancellationToken) -> Result<Document> {
        let id = identifier::resolve(input)?;

        let script = manifest::fetch_manifest(&self.client, &self.config, &id, cancel).await?;
        let payload = manifest::extract_payload(&script)?;
        let document = manifest::parse_document(payload, &id, self.config.base())?;

        tracing::info!(
            id = %id,
            title = %document.title,
            pages = document.pages.len(),
            images = document.image_count(),
            "Resolved document"
        );
        self.emit(Event::DocumentResolved {
            id: id.to_string(),
            title: document.title.clone(),
            pages: document.pages.len(),
            images: document.image_count(),
        });

        Ok(document)
    }

    /// Where the artifact for `document` is written: `<output_dir>/<title>.pdf`
    pub fn output_path(&self, document: &Document) -> PathBuf {
        let dir = std::path::absolute(&self.config.output_dir)
            .unwrap_or_else(|_| self.config.output_dir.clone());
        dir.join(format!("{}.pdf", artifact_stem(document)))
    }

    /// Refuse to clobber an existing artifact unless overwriting is enabled
    ///
    /// # Errors
    ///
    /// - [`Error::OutputIsDirectory`] if `path` is a directory, regardless of overwrite
    /// - [`Error::OutputConflict`] if `path` exists and overwriting is disabled
    pub fn check_output(&self, path: &Path) -> Result<()> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Err(Error::OutputIsDirectory {
                path: path.to_path_buf(),
            }),
            Ok(_) if !self.config.force_overwrite => Err(Error::OutputConflict {
                path: path.to_path_buf(),
            }),
            Ok(_) => {
                tracing::info!(path = %path.display(), "Existing output will be overwritten");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Create the directory images are downloaded into
    ///
    /// Uses the configured `image_output_dir` (created if absent), or a fresh
    /// `flipbook-dl-*` directory under the system temp dir.
    pub async fn prepare_image_dir(&self) -> Result<ImageDir> {
        if let Some(dir) = &self.config.image_output_dir {
            let path = std::path::absolute(dir)?;
            tokio::fs::create_dir_all(&path).await?;
            return Ok(ImageDir {
                path,
                temporary: false,
            });
        }

        let root = std::env::temp_dir();
        loop {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(10)
                .map(char::from)
                .collect();
            let path = root.join(format!("{TEMP_DIR_PREFIX}{suffix}"));

            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    return Ok(ImageDir {
                        path,
                        temporary: true,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Download every image of `document` into `image_dir`, in document order
    ///
    /// # Errors
    ///
    /// See [`scheduler::download_all`].
    pub async fn download(
        &self,
        document: &Document,
        image_dir: &Path,
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DownloadedResource>> {
        let resources = document.resources();
        let images = resources.len();

        self.emit(Event::DownloadStarted {
            id: document.id.to_string(),
            images,
            image_dir: image_dir.to_path_buf(),
        });

        let results = scheduler::download_all(DownloadBatch {
            resources,
            dest_dir: image_dir.to_path_buf(),
            concurrency: self.config.concurrency,
            fetcher: self.fetcher.clone(),
            observer,
            progress_failure: self.config.progress_failure,
            cancel: cancel.clone(),
        })
        .await?;

        let ordered = reorder(results);
        self.emit(Event::ImagesDownloaded {
            id: document.id.to_string(),
            images: ordered.len(),
        });

        Ok(ordered)
    }

    /// Process `input` from identifier to artifact and return the artifact path
    ///
    /// The output location is checked before any image is requested; a book
    /// without images fails with [`Error::NoResources`] after that check.
    /// Scratch images are removed once the artifact is written and kept on
    /// failure.
    pub async fn run(
        &self,
        input: &str,
        sink: &dyn ArtifactSink,
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let result = self.run_stages(input, sink, observer, cancel).await;

        if let Err(e) = &result {
            self.emit(Event::Failed {
                id: identifier::resolve(input).ok().map(|id| id.to_string()),
                error: e.chain(),
            });
        }

        result
    }

    async fn run_stages(
        &self,
        input: &str,
        sink: &dyn ArtifactSink,
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let document = self.fetch_document(input, cancel).await?;

        let output = self.output_path(&document);
        self.check_output(&output)?;

        if document.image_count() == 0 {
            return Err(Error::NoResources {
                title: document.title.clone(),
            });
        }

        let image_dir = self.prepare_image_dir().await?;
        let images = self
            .download(&document, image_dir.path(), observer, cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.emit(Event::Assembling {
            id: document.id.to_string(),
            output: output.clone(),
            sink: sink.name().to_string(),
        });
        tracing::info!(sink = sink.name(), output = %output.display(), "Assembling artifact");

        sink.assemble(&ordered_paths(&images), &output).await?;

        self.emit(Event::ArtifactWritten {
            id: document.id.to_string(),
            path: output.clone(),
        });

        image_dir.cleanup().await;

        Ok(output)
    }
}

/// File stem of the artifact: the title with path separators and NUL
/// replaced, or the identifier when the title is blank
pub fn artifact_stem(document: &Document) -> String {
    let title: String = document
        .title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if title.is_empty() {
        document.id.as_str().replace('/', "-")
    } else {
        title
    }
}
