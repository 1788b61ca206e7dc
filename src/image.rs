//! Product image download
//!
//! Images are optional. A failed download never fails the product,
//! the image is left out instead.

use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, info, warn};
use reqwest::{StatusCode, blocking::Client};

/// Source of raw image bytes
#[cfg_attr(test, mockall::automock)]
pub trait ImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloads images over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("status {status}");
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// Image field of a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Sent as `false`
    Absent,
    /// Base64-encoded image bytes
    Encoded(String),
}

/// Download and encode the image at `url`, degrading every failure to [ImagePayload::Absent]
pub fn resolve_image(source: &impl ImageSource, url: Option<&str>) -> ImagePayload {
    let Some(url) = url else {
        debug!("No image to download");
        return ImagePayload::Absent;
    };

    info!("Downloading image from {url}");
    match source.fetch(url) {
        Ok(bytes) => {
            debug!("Encoding {} image bytes", bytes.len());
            ImagePayload::Encoded(STANDARD.encode(bytes))
        }
        Err(e) => {
            warn!("Image download failed, continuing without image: {e:#}");
            ImagePayload::Absent
        }
    }
}
