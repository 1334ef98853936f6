//! Raster byte sources.
//!
//! A source turns a raster URL into bytes. Frames are fetched through an
//! `Arc<dyn ImageSource>` so that the orchestrator can keep many fetches in
//! flight against one client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{RasterError, Result};

/// Anything that can produce raster bytes for a URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the raw bytes behind `url`.
    ///
    /// Fails with [`RasterError::Load`] on transport errors, non-success
    /// status, or an empty body.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Fetches rasters over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    /// Create a source with the given request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RasterError::load("<client>", format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RasterError::load(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RasterError::load(url, format!("HTTP {}", status)));
        }

        let body = response.bytes().await.map_err(|e| RasterError::load(url, e))?;
        if body.is_empty() {
            return Err(RasterError::load(url, "response has no body"));
        }

        debug!(size = body.len(), "Fetched raster");
        Ok(body)
    }
}

/// Reads rasters from a local mirror directory.
///
/// Accepts plain paths and `file://` URLs. Relative paths resolve against
/// `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileImageSource {
    root: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let path = self.resolve(url);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| RasterError::load(url, format!("{}: {}", path.display(), e)))?;
        if data.is_empty() {
            return Err(RasterError::load(url, "file is empty"));
        }
        Ok(Bytes::from(data))
    }
}

/// True when `url` names something [`FileImageSource`] should serve.
pub fn is_local(url: &str) -> bool {
    !(url.starts_with("http://") || url.starts_with("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local() {
        assert!(is_local("file:///tmp/a.png"));
        assert!(is_local("/data/neo-images/x.png"));
        assert!(!is_local("https://neo.gsfc.nasa.gov/servlet/RenderData?si=1"));
    }

    #[test]
    fn test_resolve_with_root() {
        let source = FileImageSource::with_root("/mirror");
        assert_eq!(source.resolve("A/1x1/2001-01-01.png"), PathBuf::from("/mirror/A/1x1/2001-01-01.png"));
        assert_eq!(source.resolve("file:///abs/b.png"), PathBuf::from("/abs/b.png"));
    }

    #[tokio::test]
    async fn test_file_source_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"abc").unwrap();

        let source = FileImageSource::new();
        let bytes = source.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(&bytes[..], b"abc");

        let missing = dir.path().join("nope.png");
        let err = source.fetch(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, RasterError::Load { .. }));
    }

    #[tokio::test]
    async fn test_file_source_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        let err = FileImageSource::new().fetch(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
