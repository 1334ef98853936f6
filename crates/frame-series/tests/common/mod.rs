//! Shared helpers for orchestrator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use datasets::{DatasetCatalog, UrlMode, DEFAULT_RESOLUTION};
use frame_series::{FrameRow, FrameView, HostSink, OrchestratorConfig, SinkError, TimelineBounds};
use test_utils::{catalog_json, uniform_index_png, MemoryImageSource};

pub const MIRROR: &str = "mem://neo";

/// Everything a run published, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Rows { dataset_label: String, rows: Vec<FrameRow> },
    Timeline(TimelineBounds),
    Show(FrameView),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    reject_rows: bool,
    reject_timeline: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting_rows() -> Arc<Self> {
        Arc::new(Self {
            reject_rows: true,
            ..Default::default()
        })
    }

    /// Make later `set_timeline` calls fail, as if the host's control went away.
    pub fn reject_timeline(&self, reject: bool) {
        self.reject_timeline.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self) -> Vec<Vec<FrameRow>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Rows { rows, .. } => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn shown(&self) -> Vec<FrameView> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Show(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HostSink for RecordingSink {
    async fn push_rows(&self, dataset_label: &str, rows: &[FrameRow]) -> Result<(), SinkError> {
        if self.reject_rows {
            return Err(SinkError::new("table is read-only"));
        }
        self.record(SinkCall::Rows {
            dataset_label: dataset_label.to_string(),
            rows: rows.to_vec(),
        });
        Ok(())
    }

    async fn set_timeline(&self, bounds: TimelineBounds) -> Result<(), SinkError> {
        if self.reject_timeline.load(Ordering::SeqCst) {
            return Err(SinkError::new("timeline control unavailable"));
        }
        self.record(SinkCall::Timeline(bounds));
        Ok(())
    }

    async fn show_frame(&self, frame: &FrameView) -> Result<(), SinkError> {
        self.record(SinkCall::Show(frame.clone()));
        Ok(())
    }
}

/// Mirror URL of a frame at the default resolution.
pub fn frame_url(dataset_id: &str, date: &str) -> String {
    format!("{}/{}/{}/{}.png", MIRROR, dataset_id, DEFAULT_RESOLUTION, date)
}

pub fn catalog(dataset_id: &str, dates: &[&str]) -> DatasetCatalog {
    serde_json::from_value(catalog_json(dataset_id, dates, None)).unwrap()
}

pub fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        url_mode: UrlMode::mirror().with_base(MIRROR),
        ..Default::default()
    }
}

/// A source serving every date as a 720x360 raster filled with `index`.
pub fn source_with(
    dataset_id: &str,
    dates: &[&str],
    palette: &[(u8, u8, u8, u8)],
    index: u8,
) -> MemoryImageSource {
    dates.iter().fold(MemoryImageSource::new(), |source, date| {
        source.with_image(
            frame_url(dataset_id, date),
            uniform_index_png(DEFAULT_RESOLUTION.width as usize, DEFAULT_RESOLUTION.height as usize, palette, index),
        )
    })
}
