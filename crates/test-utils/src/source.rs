//! In-memory raster source for orchestrator and sampler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use raster::{ImageSource, RasterError};

/// Serves bytes registered ahead of time, keyed by URL.
///
/// URLs can be marked as failing or given an artificial latency so tests
/// can drive out-of-order completion in parallel loads.
#[derive(Debug, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, Bytes>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    fetched: Mutex<Vec<String>>,
    fetch_count: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `url`.
    pub fn with_image(mut self, url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.images.insert(url.into(), bytes.into());
        self
    }

    /// Make every fetch of `url` fail.
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// Delay fetches of `url` by `delay`.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// URLs in the order they were requested.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Most fetches that were outstanding at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a fetch as outstanding until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageSource for MemoryImageSource {
    async fn fetch(&self, url: &str) -> raster::Result<Bytes> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(outstanding, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(url) {
            return Err(RasterError::load(url, "injected failure"));
        }
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| RasterError::load(url, "HTTP 404 Not Found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_registered_bytes() {
        let source = MemoryImageSource::new().with_image("a.png", vec![1u8, 2, 3]);
        assert_eq!(source.fetch("a.png").await.unwrap().as_ref(), &[1, 2, 3]);
        assert!(source.fetch("b.png").await.is_err());
        assert_eq!(source.fetched(), vec!["a.png", "b.png"]);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_peak_in_flight_counts_overlapping_fetches() {
        let delay = Duration::from_millis(10);
        let source = MemoryImageSource::new()
            .with_image("a.png", vec![1u8])
            .with_image("b.png", vec![2u8])
            .with_delay("a.png", delay)
            .with_delay("b.png", delay);

        let (a, b) = tokio::join!(source.fetch("a.png"), source.fetch("b.png"));
        assert!(a.is_ok() && b.is_ok());
        source.fetch("a.png").await.unwrap();
        assert_eq!(source.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = MemoryImageSource::new()
            .with_image("a.png", vec![1u8])
            .with_failure("a.png");
        assert!(source.fetch("a.png").await.is_err());
    }
}
