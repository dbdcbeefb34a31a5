// THEORY:
// A probe is the detached image load used to learn an image's natural size.
// The card's own `<img>` may already be shrunk by CSS, so the pipeline never
// asks it; instead it loads the resource again, independently, and reads the
// intrinsic width and height from the decoded header.
//
// `ImageProbe` is the seam. The filesystem probe serves local runs and tests;
// the HTTP probe (feature `http`) fetches from an image host, prefixing
// relative `src` paths the way the dataset page did.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::ImageReader;

use crate::core_modules::geometry::Dimensions;
use crate::error::ProbeError;

/// Resolves an image `src` to its natural dimensions.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn natural_dimensions(&self, src: &str) -> Result<Dimensions, ProbeError>;
}

/// Reads the intrinsic size from encoded image bytes without decoding pixels.
pub fn dimensions_from_bytes(src: &str, bytes: Vec<u8>) -> Result<Dimensions, ProbeError> {
    let decode = |source| ProbeError::Decode {
        src: src.to_string(),
        source,
    };
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode(image::ImageError::IoError(e)))?;
    let size = reader.into_dimensions().map_err(decode)?;
    Ok(Dimensions::from(size))
}

/// Loads images from a directory tree. `src` values like `/system/a.jpg` or
/// `file:///abs/a.jpg` are resolved against `root`.
#[derive(Debug, Clone)]
pub struct FileProbe {
    root: PathBuf,
}

impl FileProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, src: &str) -> PathBuf {
        if let Some(absolute) = src.strip_prefix("file://") {
            return PathBuf::from(absolute);
        }
        self.root.join(src.trim_start_matches('/'))
    }
}

#[async_trait]
impl ImageProbe for FileProbe {
    async fn natural_dimensions(&self, src: &str) -> Result<Dimensions, ProbeError> {
        if src.trim().is_empty() {
            return Err(ProbeError::EmptySource);
        }
        let path = self.resolve(src);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ProbeError::Io { path, source })?;
        dimensions_from_bytes(src, bytes)
    }
}

#[cfg(feature = "http")]
pub use http::HttpProbe;

#[cfg(feature = "http")]
mod http {
    use super::*;

    /// Fetches images over HTTP. Relative `src` values are joined onto
    /// `base_url`; absolute URLs are fetched as-is.
    #[derive(Debug, Clone)]
    pub struct HttpProbe {
        client: reqwest::Client,
        base_url: String,
    }

    impl HttpProbe {
        pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }

        pub fn url_for(&self, src: &str) -> String {
            if src.starts_with("http://") || src.starts_with("https://") {
                return src.to_string();
            }
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                src.trim_start_matches('/')
            )
        }
    }

    #[async_trait]
    impl ImageProbe for HttpProbe {
        async fn natural_dimensions(&self, src: &str) -> Result<Dimensions, ProbeError> {
            if src.trim().is_empty() {
                return Err(ProbeError::EmptySource);
            }
            let http = |source| ProbeError::Http {
                src: src.to_string(),
                source,
            };
            let bytes = self
                .client
                .get(self.url_for(src))
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(http)?
                .bytes()
                .await
                .map_err(http)?;
            dimensions_from_bytes(src, bytes.to_vec())
        }
    }
}
