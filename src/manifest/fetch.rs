//! Manifest download and payload isolation

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identifier::Identifier;
use crate::retry::with_retry;

/// URL of the manifest script for `id`
pub fn manifest_url(base: &str, id: &Identifier) -> String {
    format!("{}/{}/javascript/config.js", base.trim_end_matches('/'), id)
}

/// Download the manifest script for `id` and return its raw text
///
/// # Errors
///
/// - [`Error::FetchFailed`] on a non-2xx response or a transport error
/// - [`Error::Cancelled`] if `cancel` fires before the body is read
pub async fn fetch_manifest(
    client: &reqwest::Client,
    config: &Config,
    id: &Identifier,
    cancel: &CancellationToken,
) -> Result<String> {
    let url = manifest_url(config.base(), id);
    tracing::debug!(url = %url, "Fetching manifest");

    let url = url.as_str();
    with_retry(&config.retry, cancel, || async move {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            body = fetch_text(client, url) => body,
        }
    })
    .await
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::transport(url, e))?;

    if !response.status().is_success() {
        return Err(Error::http_status(url, response.status()));
    }

    response.text().await.map_err(|e| Error::transport(url, e))
}

/// Isolate the JSON object embedded in the manifest script
///
/// Keeps everything from the first `{` to the last `}` inclusive. This is a
/// heuristic tied to how the host wraps its configuration, not a JavaScript
/// parser: it assumes the script contains exactly one brace-delimited object
/// literal and nothing brace-like around it.
///
/// # Examples
///
/// ```
/// use flipbook_dl::manifest::extract_payload;
///
/// let script = r#"var htmlConfig = {"meta":{"title":"x"}};"#;
/// assert_eq!(extract_payload(script).unwrap(), r#"{"meta":{"title":"x"}}"#);
/// ```
pub fn extract_payload(script: &str) -> Result<&str> {
    let start = script.find('{');
    let end = script.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&script[start..=end]),
        _ => Err(Error::ManifestMalformed {
            reason: "no brace-delimited object found in manifest script".to_string(),
            source: None,
        }),
    }
}
