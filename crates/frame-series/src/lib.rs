//! Turns a dataset's raster catalog into a per-pin time series.
//!
//! A [`FrameOrchestrator`] run builds the dataset's reverse palette, samples
//! every frame at every pin, sorts the surviving frames into a [`FrameSet`]
//! and hands the rows, timeline bounds and current frame to a [`HostSink`].
//! Afterwards the [`TimeSync`] controller maps host cursor changes back onto
//! frames.

pub mod config;
pub mod error;
pub mod frame;
pub mod orchestrator;
pub mod sink;
pub mod time_sync;

pub use config::{LoadMode, OrchestratorConfig, DEFAULT_FRAME_DELAY, DEFAULT_SERIAL_MAX_FRAMES};
pub use error::{OrchestratorError, Result, SinkError};
pub use frame::{FrameRow, FrameSet, FrameView, LoadedFrame, PointSample, TimelineBounds};
pub use orchestrator::{FrameOrchestrator, RunState};
pub use sink::{HostSink, ProgressCallback};
pub use time_sync::{SyncEffect, TimeSync};
