//! Drives a full sampling run over one dataset.
//!
//! ```text
//! Idle ─▶ Loading (reverse palette) ─▶ Processing (frames) ─▶ Complete
//!              │
//!              └──────────────▶ Failed
//! ```
//!
//! A run fetches the dataset's first catalog raster to build the reverse
//! palette, then samples every frame at every pin. Frames that fail are
//! dropped; only catalog and palette problems fail the run. Nothing is
//! pushed to the host unless the run completes.

use std::sync::Arc;
use std::time::Instant;

use datasets::{CatalogEntry, Dataset, DatasetCatalog, DatasetError};
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use neo_common::SamplePoint;
use raster::{build_reverse_palette, ImageSource, RasterSampler, ReversePalette};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::{LoadMode, OrchestratorConfig};
use crate::error::{OrchestratorError, Result};
use crate::frame::{FrameSet, FrameView, LoadedFrame, PointSample};
use crate::sink::{HostSink, ProgressCallback};
use crate::time_sync::{SyncEffect, TimeSync};

/// Where the orchestrator is in its current (or last) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Building the reverse palette.
    Loading,
    Processing { processed: usize, total: usize },
    Complete { frames: usize },
    Failed(String),
}

/// Owns the frame set and time cursor of one embedding.
pub struct FrameOrchestrator {
    config: OrchestratorConfig,
    source: Arc<dyn ImageSource>,
    sink: Arc<dyn HostSink>,
    progress: Option<ProgressCallback>,
    state: RunState,
    frame_set: Option<FrameSet>,
    time_sync: TimeSync,
}

/// What a single frame needs, shared by all frames of a run.
struct FrameJob<'a> {
    dataset: &'a Dataset,
    points: &'a [SamplePoint],
    palette: &'a ReversePalette,
    source: &'a dyn ImageSource,
}

impl FrameOrchestrator {
    pub fn new(config: OrchestratorConfig, source: Arc<dyn ImageSource>, sink: Arc<dyn HostSink>) -> Result<Self> {
        config.validate().map_err(OrchestratorError::Config)?;
        Ok(Self {
            config,
            source,
            sink,
            progress: None,
            state: RunState::Idle,
            frame_set: None,
            time_sync: TimeSync::new(),
        })
    }

    /// Report `(processed, total)` once at start and after every frame.
    pub fn with_progress(mut self, callback: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Frame set of the last completed run.
    pub fn frame_set(&self) -> Option<&FrameSet> {
        self.frame_set.as_ref()
    }

    /// Index of the frame currently displayed.
    pub fn shown_frame(&self) -> Option<usize> {
        self.time_sync.shown()
    }

    /// Sample every catalog frame of `dataset` at `points` and push the
    /// result to the host.
    ///
    /// `points` is a snapshot; later pin edits need another run. An empty
    /// snapshot still loads frames and publishes the timeline, but pushes no
    /// rows.
    ///
    /// # Errors
    /// - [`OrchestratorError::Dataset`] if the catalog has no usable images
    /// - [`OrchestratorError::Palette`] if the reference raster cannot be
    ///   fetched or carries no palette
    /// - [`OrchestratorError::Sink`] if the host rejects the results
    #[instrument(skip(self, dataset, catalog, points), fields(dataset = dataset.id, points = points.len()))]
    pub async fn run(
        &mut self,
        dataset: &'static Dataset,
        catalog: &DatasetCatalog,
        points: Vec<SamplePoint>,
    ) -> Result<FrameSet> {
        match self.load(dataset, catalog, &points).await {
            Ok(frames) => {
                let frame_set = FrameSet::new(dataset, points, frames);
                info!(frames = frame_set.len(), "Run complete");
                if let Err(e) = self.publish(&frame_set).await {
                    self.state = RunState::Failed(e.to_string());
                    return Err(e);
                }
                self.state = RunState::Complete { frames: frame_set.len() };
                Ok(frame_set)
            }
            Err(e) => {
                warn!(error = %e, "Run failed");
                self.state = RunState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The host moved the shared time cursor.
    ///
    /// Displays the matching frame when it differs from the one shown.
    /// Returns the frame now displayed because of this change.
    pub async fn handle_cursor_change(&mut self, global_value: &Value) -> Result<Option<FrameView>> {
        let Some(SyncEffect::ShowFrame(index)) = self.time_sync.on_cursor_change(global_value) else {
            return Ok(None);
        };
        let Some(view) = self.frame_set.as_ref().and_then(|set| set.view(index)) else {
            return Ok(None);
        };
        self.sink.show_frame(&view).await?;
        Ok(Some(view))
    }

    async fn load(
        &mut self,
        dataset: &'static Dataset,
        catalog: &DatasetCatalog,
        points: &[SamplePoint],
    ) -> Result<Vec<LoadedFrame>> {
        let mut entries = catalog.entries(dataset.id)?;
        let total = match self.config.effective_max_frames() {
            Some(max) => entries.len().min(max),
            None => entries.len(),
        };
        // Catalog order is scrape order, so the kept dates need not be contiguous.
        entries.truncate(total);

        let resolution = self.config.resolution.unwrap_or_else(|| catalog.resolution());
        let urls: Vec<String> = entries
            .iter()
            .map(|entry| self.config.url_mode.frame_url(dataset.id, entry, resolution))
            .collect();

        let Some(reference_url) = urls.first() else {
            return Err(DatasetError::EmptyCatalog(dataset.id.to_string()).into());
        };

        self.report(0, total);

        self.state = RunState::Loading;
        let palette = build_reverse_palette(self.source.as_ref(), reference_url)
            .await
            .map_err(OrchestratorError::Palette)?;

        self.state = RunState::Processing { processed: 0, total };
        info!(
            total,
            mode = self.config.load_mode.as_str(),
            source = %self.config.url_mode,
            %resolution,
            "Processing frames"
        );

        let source = Arc::clone(&self.source);
        let job = FrameJob {
            dataset,
            points,
            palette: &palette,
            source: source.as_ref(),
        };
        let work = entries.iter().zip(urls.iter());

        let mut frames = Vec::with_capacity(total);
        let mut processed = 0;
        match self.config.load_mode {
            LoadMode::Parallel => {
                let mut in_flight = stream::iter(work)
                    .map(|(entry, url)| job.process(entry, url))
                    .buffer_unordered(total.max(1));
                while let Some(result) = in_flight.next().await {
                    processed += 1;
                    frames.extend(result);
                    self.advance(processed, total);
                }
            }
            LoadMode::Serial { delay } => {
                for (i, (entry, url)) in work.enumerate() {
                    if i > 0 {
                        tokio::time::sleep(delay).await;
                    }
                    processed += 1;
                    frames.extend(job.process(entry, url).await);
                    self.advance(processed, total);
                }
            }
        }

        Ok(frames)
    }

    /// Hand the run to the host. The frame set and cursor state are only
    /// replaced once every sink call has succeeded.
    async fn publish(&mut self, frame_set: &FrameSet) -> Result<()> {
        let mut time_sync = TimeSync::new();
        let effects = time_sync.on_frame_set(frame_set);

        let rows = frame_set.rows();
        if !rows.is_empty() {
            debug!(rows = rows.len(), "Pushing rows");
            self.sink.push_rows(frame_set.dataset_label(), &rows).await?;
        }

        for effect in effects {
            match effect {
                SyncEffect::PublishTimeline(bounds) => self.sink.set_timeline(bounds).await?,
                SyncEffect::ShowFrame(index) => {
                    if let Some(view) = frame_set.view(index) {
                        self.sink.show_frame(&view).await?;
                    }
                }
            }
        }

        self.frame_set = Some(frame_set.clone());
        self.time_sync = time_sync;
        Ok(())
    }

    fn advance(&mut self, processed: usize, total: usize) {
        self.state = RunState::Processing { processed, total };
        self.report(processed, total);
    }

    fn report(&self, processed: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(processed, total);
        }
    }
}

impl FrameJob<'_> {
    /// Fetch, decode and sample one frame. `None` if any step fails.
    async fn process(&self, entry: &CatalogEntry, url: &str) -> Option<LoadedFrame> {
        match self.try_process(entry, url).await {
            Ok(frame) => {
                counter!("neo_frames_loaded_total", "dataset" => self.dataset.id).increment(1);
                histogram!("neo_frame_load_ms", "dataset" => self.dataset.id).record(frame.load_duration_ms);
                Some(frame)
            }
            Err(e) => {
                counter!("neo_frames_failed_total", "dataset" => self.dataset.id).increment(1);
                warn!(date = %entry.date, url, error = %e, "Dropping frame");
                None
            }
        }
    }

    async fn try_process(&self, entry: &CatalogEntry, url: &str) -> raster::Result<LoadedFrame> {
        let started = Instant::now();
        let mut sampler = RasterSampler::new();
        let sampled = self.sample(&mut sampler, url, started).await;
        sampler.dispose();

        let (load_duration_ms, samples) = sampled?;
        Ok(LoadedFrame {
            date: entry.date,
            source_url: url.to_string(),
            load_duration_ms,
            samples,
        })
    }

    async fn sample(
        &self,
        sampler: &mut RasterSampler,
        url: &str,
        started: Instant,
    ) -> raster::Result<(f64, Vec<PointSample>)> {
        sampler.load(self.source, url).await?;
        let load_duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut samples = Vec::with_capacity(self.points.len());
        for point in self.points {
            let color = sampler.extract_color(point.latitude, point.longitude)?;
            let palette_index = self.palette.lookup(color);
            samples.push(PointSample {
                point_id: point.id.clone(),
                label: point.label.clone(),
                pin_color: point.color.clone(),
                color,
                palette_index,
                value: self.dataset.palette_to_value(palette_index),
            });
        }
        Ok((load_duration_ms, samples))
    }
}
