//! Manifest retrieval and decoding
//!
//! The host publishes each book's layout as a script (`javascript/config.js`)
//! that assigns a JSON object literal to a variable. Split into:
//! - [`fetch`] - HTTP retrieval and isolation of the JSON payload from its script wrapper
//! - [`parse`] - decoding the payload into a [`Document`](crate::document::Document)

mod fetch;
mod parse;

pub use fetch::{extract_payload, fetch_manifest, manifest_url};
pub use parse::parse_document;
