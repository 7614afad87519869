//! Fake flipbook host built on wiremock

use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flipbook_dl::Config;

/// Identifier every fixture book is served under
pub const BOOK_ID: &str = "abcd/efgh";

/// Manifest script as the host serves it: a JSON literal wrapped in JavaScript
pub fn manifest_script(title: &str, pages: &[&[&str]]) -> String {
    let pages: Vec<_> = pages
        .iter()
        .enumerate()
        .map(|(i, images)| {
            serde_json::json!({
                "n": images,
                "t": format!("thumb/{}.jpg", i + 1),
            })
        })
        .collect();

    let payload = serde_json::json!({
        "fliphtml5_pages": pages,
        "meta": { "title": title },
    });

    format!("var htmlConfig = {payload};\n")
}

/// Body served for the image with reference `reference`
pub fn image_body(reference: &str) -> String {
    format!("image {reference}\n")
}

/// Serve the manifest of [`BOOK_ID`]
pub async fn mount_manifest(server: &MockServer, script: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{BOOK_ID}/javascript/config.js")))
        .respond_with(ResponseTemplate::new(200).set_body_string(script))
        .mount(server)
        .await;
}

/// Serve one image of [`BOOK_ID`], optionally delayed
pub async fn mount_image(server: &MockServer, reference: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/{BOOK_ID}/files/large/{reference}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(image_body(reference))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Fail the test if any image is requested
pub async fn forbid_image_requests(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"/files/large/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

/// Configuration pointing at `server`, writing into `out_dir`
pub fn test_config(server: &MockServer, out_dir: &Path) -> Config {
    Config {
        base_url: server.uri(),
        concurrency: 3,
        output_dir: out_dir.join("pdf"),
        image_output_dir: Some(out_dir.join("images")),
        ..Default::default()
    }
}
