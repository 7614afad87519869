//! Decoding of the manifest payload into a [`Document`]

use serde::Deserialize;

use crate::document::{Document, Page};
use crate::error::{Error, Result};
use crate::identifier::Identifier;

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "fliphtml5_pages", default)]
    pages: Vec<RawPage>,
    #[serde(default)]
    meta: RawMeta,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    /// Image references, relative to `files/large/`
    #[serde(rename = "n", default)]
    images: Vec<String>,
    /// Thumbnail reference
    #[serde(rename = "t", default)]
    thumbnail: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    title: String,
}

/// Decode a manifest payload (already isolated by
/// [`extract_payload`](super::extract_payload)) into a [`Document`]
///
/// Image references are qualified as `<base>/<id>/files/large/<ref>` and the
/// title has its HTML entities decoded. Missing fields decode as empty.
///
/// # Errors
///
/// Returns [`Error::ManifestMalformed`] if the payload is not valid JSON of
/// the expected shape.
///
/// # Examples
///
/// ```
/// use flipbook_dl::identifier::Identifier;
/// use flipbook_dl::manifest::parse_document;
///
/// let id: Identifier = "abc/def".parse().unwrap();
/// let payload = r#"{"fliphtml5_pages":[{"n":["p1.jpg"],"t":"t1.jpg"}],"meta":{"title":"A &amp; B"}}"#;
/// let doc = parse_document(payload, &id, "https://online.fliphtml5.com").unwrap();
///
/// assert_eq!(doc.title, "A & B");
/// assert_eq!(doc.pages[0].image_urls[0], "https://online.fliphtml5.com/abc/def/files/large/p1.jpg");
/// ```
pub fn parse_document(payload: &str, id: &Identifier, base: &str) -> Result<Document> {
    let raw: RawManifest = serde_json::from_str(payload).map_err(|e| Error::ManifestMalformed {
        reason: "payload is not a valid manifest object".to_string(),
        source: Some(e),
    })?;

    let base = base.trim_end_matches('/');
    let book_url = format!("{base}/{id}/");

    let pages = raw
        .pages
        .into_iter()
        .enumerate()
        .map(|(idx, page)| Page {
            number: idx + 1,
            thumbnail_url: page.thumbnail,
            image_urls: page
                .images
                .iter()
                .map(|reference| format!("{book_url}files/large/{reference}"))
                .collect(),
        })
        .collect::<Vec<_>>();

    let title = html_escape::decode_html_entities(&raw.meta.title).into_owned();

    tracing::debug!(
        id = %id,
        title = %title,
        pages = pages.len(),
        "Decoded manifest"
    );

    Ok(Document {
        id: id.clone(),
        url: book_url,
        title,
        pages,
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::extract_payload;

    const BASE: &str = "https://online.fliphtml5.com";

    fn id() -> Identifier {
        "abc/def".parse().unwrap()
    }

    #[test]
    fn decodes_pages_images_and_title() {
        let script = r#"var htmlConfig = {"fliphtml5_pages":[{"n":["a.jpg"],"t":"ta.jpg"},{"n":["b.jpg","c.jpg"],"t":"tb.jpg"}],"meta":{"title":"Hello &quot;World&quot; &amp; more"}};"#;
        let doc = parse_document(extract_payload(script).unwrap(), &id(), BASE).unwrap();

        assert_eq!(doc.title, "Hello \"World\" & more");
        assert_eq!(doc.url, "https://online.fliphtml5.com/abc/def/");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[0].thumbnail_url, "ta.jpg");
        assert_eq!(
            doc.pages[1].image_urls,
            vec![
                "https://online.fliphtml5.com/abc/def/files/large/b.jpg",
                "https://online.fliphtml5.com/abc/def/files/large/c.jpg",
            ]
        );
        assert_eq!(doc.image_count(), 3);
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let doc = parse_document("{}", &id(), BASE).unwrap();
        assert!(doc.title.is_empty());
        assert!(doc.pages.is_empty());

        let doc = parse_document(r#"{"fliphtml5_pages":[{}]}"#, &id(), BASE).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].image_urls.is_empty());
        assert_eq!(doc.image_count(), 0);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = r#"{"bookConfig":{"x":1},"fliphtml5_pages":[{"n":["a.jpg"],"t":"t","l":[]}],"meta":{"title":"T","author":"me"}}"#;
        let doc = parse_document(payload, &id(), BASE).unwrap();
        assert_eq!(doc.title, "T");
        assert_eq!(doc.image_count(), 1);
    }

    #[test]
    fn invalid_json_is_malformed() {
        for payload in ["{not json}", r#"{"fliphtml5_pages": 3}"#, r#"{"meta":{"title":7}}"#] {
            match parse_document(payload, &id(), BASE) {
                Err(Error::ManifestMalformed { source, .. }) => assert!(source.is_some()),
                other => panic!("expected ManifestMalformed for {payload}, got {other:?}"),
            }
        }
    }

    #[test]
    fn base_with_trailing_slash_is_normalized() {
        let doc = parse_document(
            r#"{"fliphtml5_pages":[{"n":["a.jpg"]}]}"#,
            &id(),
            "http://127.0.0.1:9000/",
        )
        .unwrap();
        assert_eq!(
            doc.pages[0].image_urls[0],
            "http://127.0.0.1:9000/abc/def/files/large/a.jpg"
        );
    }
}
