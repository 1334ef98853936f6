//! The host side of a run.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::frame::{FrameRow, FrameView, TimelineBounds};

/// Receives everything a run publishes.
///
/// A host typically backs this with its tabular store, a timeline control
/// bound to the shared time cursor, and a map view.
#[async_trait]
pub trait HostSink: Send + Sync {
    /// Replace the host's rows with `rows`. Called once per run, and only
    /// when the run has at least one pin.
    async fn push_rows(&self, dataset_label: &str, rows: &[FrameRow]) -> Result<(), SinkError>;

    /// Configure the timeline control and set the shared cursor to
    /// `bounds.initial_value`.
    async fn set_timeline(&self, bounds: TimelineBounds) -> Result<(), SinkError>;

    /// Display a frame.
    async fn show_frame(&self, frame: &FrameView) -> Result<(), SinkError>;
}

/// Progress reporting: `(processed, total)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;
