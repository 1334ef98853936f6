//! Loaded frames and the date-ordered frame set.

use std::sync::Arc;

use chrono::NaiveDate;
use datasets::Dataset;
use neo_common::{cursor_timestamp, Rgb, SamplePoint};
use serde::Serialize;

/// What one pin sampled in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSample {
    pub point_id: String,
    pub label: String,
    pub pin_color: String,
    pub color: Rgb,
    /// Palette index, or `-1` when the color is not in the palette.
    pub palette_index: i32,
    pub value: Option<f64>,
}

/// One successfully sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFrame {
    pub date: NaiveDate,
    pub source_url: String,
    /// Wall time of fetch and decode. In parallel mode this includes time
    /// spent queued behind other fetches.
    pub load_duration_ms: f64,
    /// In the order of the run's pin snapshot.
    pub samples: Vec<PointSample>,
}

impl LoadedFrame {
    /// Time cursor value of this frame.
    pub fn timestamp(&self) -> i64 {
        cursor_timestamp(self.date)
    }

    /// Sample of the pin at `position` in the run's snapshot.
    pub fn sample(&self, position: usize) -> Option<&PointSample> {
        self.samples.get(position)
    }
}

/// One outbound row: a (frame, pin) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRow {
    pub date: NaiveDate,
    /// `#rrggbb`
    pub color: String,
    pub palette_index: i32,
    pub value: Option<f64>,
    pub point_label: String,
    pub point_color: String,
    pub load_time_ms: f64,
    pub source_url: String,
}

/// Range of the shared timeline control, in time cursor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBounds {
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub initial_value: i64,
}

/// The frame a host should display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameView {
    pub index: usize,
    /// `"{dataset label} - {date}"`
    pub title: String,
    pub date: NaiveDate,
    pub source_url: String,
    pub timestamp: i64,
}

/// The date-sorted result of one run.
///
/// Cloning is cheap and every clone sees the same frames; nothing can mutate
/// them after construction.
#[derive(Debug, Clone)]
pub struct FrameSet {
    dataset_id: &'static str,
    dataset_label: &'static str,
    points: Arc<[SamplePoint]>,
    frames: Arc<[LoadedFrame]>,
}

impl FrameSet {
    /// Sort `frames` by date (stable, so equal dates keep arrival order).
    pub fn new(dataset: &Dataset, points: Vec<SamplePoint>, mut frames: Vec<LoadedFrame>) -> Self {
        frames.sort_by_key(|f| f.date);
        Self {
            dataset_id: dataset.id,
            dataset_label: dataset.label,
            points: points.into(),
            frames: frames.into(),
        }
    }

    pub fn dataset_id(&self) -> &'static str {
        self.dataset_id
    }

    pub fn dataset_label(&self) -> &'static str {
        self.dataset_label
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn frames(&self) -> &[LoadedFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&LoadedFrame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.frames.iter().map(LoadedFrame::timestamp).collect()
    }

    /// First and last frame timestamps, cursor starting on the first.
    pub fn bounds(&self) -> Option<TimelineBounds> {
        let first = self.frames.first()?.timestamp();
        let last = self.frames.last()?.timestamp();
        Some(TimelineBounds {
            lower_bound: first,
            upper_bound: last,
            initial_value: first,
        })
    }

    /// Frame whose half-open interval `[ts[i], ts[i+1])` holds `cursor`.
    /// The last frame's interval is unbounded above.
    pub fn index_at(&self, cursor: f64) -> Option<usize> {
        index_at(&self.timestamps(), cursor)
    }

    /// Display description of a frame.
    pub fn view(&self, index: usize) -> Option<FrameView> {
        let frame = self.frames.get(index)?;
        Some(FrameView {
            index,
            title: format!("{} - {}", self.dataset_label, frame.date.format("%Y-%m-%d")),
            date: frame.date,
            source_url: frame.source_url.clone(),
            timestamp: frame.timestamp(),
        })
    }

    /// Outbound rows grouped by pin (snapshot order), then by date.
    ///
    /// Pins are matched to samples by position, so pins sharing an id still
    /// get their own rows.
    pub fn rows(&self) -> Vec<FrameRow> {
        let mut rows = Vec::with_capacity(self.points.len() * self.frames.len());
        for position in 0..self.points.len() {
            for frame in self.frames.iter() {
                let Some(sample) = frame.sample(position) else {
                    continue;
                };
                rows.push(FrameRow {
                    date: frame.date,
                    color: sample.color.to_hex(),
                    palette_index: sample.palette_index,
                    value: sample.value,
                    point_label: sample.label.clone(),
                    point_color: sample.pin_color.clone(),
                    load_time_ms: frame.load_duration_ms,
                    source_url: frame.source_url.clone(),
                });
            }
        }
        rows
    }
}

/// Half-open interval search over ascending timestamps.
pub(crate) fn index_at(timestamps: &[i64], cursor: f64) -> Option<usize> {
    if !cursor.is_finite() {
        return None;
    }
    // Count of frames starting at or before the cursor.
    let after = timestamps.partition_point(|&ts| (ts as f64) <= cursor);
    after.checked_sub(1)
}
