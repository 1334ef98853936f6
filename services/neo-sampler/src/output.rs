//! Writes run results: rows as JSON lines or CSV, host events as JSON lines.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use clap::ValueEnum;
use frame_series::{FrameRow, FrameView, HostSink, SinkError, TimelineBounds};
use serde_json::json;
use tracing::info;

/// Row output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Jsonl,
    Csv,
}

/// CSV header row.
pub fn csv_header() -> &'static str {
    "dataset,date,color,paletteIndex,value,pointLabel,pointColor,loadTimeMs,sourceUrl"
}

/// Format one row as CSV.
pub fn format_csv(dataset_label: &str, row: &FrameRow) -> String {
    format!(
        "{},{},{},{},{},{},{},{:.1},{}",
        csv_field(dataset_label),
        row.date.format("%Y-%m-%d"),
        row.color,
        row.palette_index,
        row.value.map(|v| v.to_string()).unwrap_or_default(),
        csv_field(&row.point_label),
        row.point_color,
        row.load_time_ms,
        csv_field(&row.source_url),
    )
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// [`HostSink`] over two writers: one for rows, one for timeline and
/// display events.
pub struct WriterSink {
    format: OutputFormat,
    rows: Mutex<Box<dyn Write + Send>>,
    events: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new(format: OutputFormat, rows: Box<dyn Write + Send>, events: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            rows: Mutex::new(rows),
            events: Mutex::new(events),
        }
    }

    fn write_event(&self, event: serde_json::Value) -> Result<(), SinkError> {
        let mut out = self.events.lock().map_err(|_| SinkError::new("event writer poisoned"))?;
        writeln!(out, "{}", event).and_then(|_| out.flush()).map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> SinkError {
    SinkError::new(e.to_string())
}

#[async_trait]
impl HostSink for WriterSink {
    async fn push_rows(&self, dataset_label: &str, rows: &[FrameRow]) -> Result<(), SinkError> {
        let mut out = self.rows.lock().map_err(|_| SinkError::new("row writer poisoned"))?;
        match self.format {
            OutputFormat::Jsonl => {
                for row in rows {
                    let mut value = serde_json::to_value(row).map_err(|e| SinkError::new(e.to_string()))?;
                    value["dataset"] = json!(dataset_label);
                    writeln!(out, "{}", value).map_err(io_error)?;
                }
            }
            OutputFormat::Csv => {
                writeln!(out, "{}", csv_header()).map_err(io_error)?;
                for row in rows {
                    writeln!(out, "{}", format_csv(dataset_label, row)).map_err(io_error)?;
                }
            }
        }
        out.flush().map_err(io_error)?;
        info!(rows = rows.len(), dataset = dataset_label, "Wrote rows");
        Ok(())
    }

    async fn set_timeline(&self, bounds: TimelineBounds) -> Result<(), SinkError> {
        self.write_event(json!({ "event": "timeline", "bounds": bounds }))
    }

    async fn show_frame(&self, frame: &FrameView) -> Result<(), SinkError> {
        self.write_event(json!({ "event": "show_frame", "frame": frame }))
    }
}
