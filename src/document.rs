//! Document model and the flattening of pages into ordered download units

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::identifier::Identifier;

/// A book as described by its manifest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Canonical identifier
    pub id: Identifier,
    /// Reader URL of the book (`<base>/<id>/`)
    pub url: String,
    /// Title, HTML entities already decoded
    pub title: String,
    /// Pages in reading order
    pub pages: Vec<Page>,
}

/// One page of a [`Document`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based position in the document
    pub number: usize,
    /// Thumbnail reference as found in the manifest
    pub thumbnail_url: String,
    /// Fully-qualified image URLs in page order
    pub image_urls: Vec<String>,
}

/// A single image to download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// 1-based page number
    pub page_number: usize,
    /// 1-based position within the page
    pub image_number: usize,
    /// 1-based position across the whole document, the only ordering key for output
    pub overall_order: usize,
    /// Image URL
    pub url: String,
}

impl Resource {
    /// File name the image is stored under, unique within a document
    pub fn file_name(&self) -> String {
        format!("{}-{}.jpg", self.page_number, self.image_number)
    }
}

/// A [`Resource`] whose file has been fully written and closed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedResource {
    /// The resource that was downloaded
    #[serde(flatten)]
    pub resource: Resource,
    /// Where the image was written
    pub local_path: PathBuf,
}

impl DownloadedResource {
    /// Global order key of the underlying resource
    pub fn overall_order(&self) -> usize {
        self.resource.overall_order
    }
}

impl Document {
    /// Total number of images across all pages
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.image_urls.len()).sum()
    }

    /// Flatten the document into download units, pages first then images
    ///
    /// `overall_order` starts at 1 and increases by one per image with no gaps,
    /// so sorting by it restores reading order.
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = Vec::with_capacity(self.image_count());
        let mut order = 1;

        for (page_idx, page) in self.pages.iter().enumerate() {
            for (image_idx, url) in page.image_urls.iter().enumerate() {
                resources.push(Resource {
                    page_number: page_idx + 1,
                    image_number: image_idx + 1,
                    overall_order: order,
                    url: url.clone(),
                });
                order += 1;
            }
        }

        resources
    }
}
