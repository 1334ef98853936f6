//! Full runs against in-memory rasters.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::*;
use datasets::find_dataset;
use frame_series::{FrameOrchestrator, LoadMode, OrchestratorConfig, OrchestratorError, RunState};
use neo_common::{cursor_timestamp, parse_catalog_date, SamplePoint};
use serde_json::json;
use test_utils::{
    create_png_rgba, demo_point, point, ramp_palette, ramp_palette_with_black_collision, solid_color_png,
    MemoryImageSource,
};

const RAIN: &str = "GPM_3IMERGM";
const Q1: [&str; 3] = ["2001-03-01", "2001-01-01", "2001-02-01"];

fn orchestrator(config: OrchestratorConfig, source: MemoryImageSource, sink: Arc<RecordingSink>) -> FrameOrchestrator {
    FrameOrchestrator::new(config, Arc::new(source), sink).unwrap()
}

#[tokio::test]
async fn test_run_samples_sorts_and_publishes() {
    let dataset = find_dataset(RAIN).unwrap();
    let sink = RecordingSink::new();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);

    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 10), sink.clone())
        .with_progress(move |done, total| seen.lock().unwrap().push((done, total)));

    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();

    let dates: Vec<String> = set.frames().iter().map(|f| f.date.to_string()).collect();
    assert_eq!(dates, vec!["2001-01-01", "2001-02-01", "2001-03-01"]);
    assert_eq!(orch.state(), &RunState::Complete { frames: 3 });

    let progress = progress.lock().unwrap().clone();
    assert_eq!(progress, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);

    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    let rows = &rows[0];
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert_eq!(row.palette_index, 10);
        assert_eq!(row.value, dataset.palette_to_value(10));
        assert_eq!(row.color, "#0af572");
        assert_eq!(row.point_label, "42.36, -73.00");
        assert_eq!(row.point_color, "#ff0000");
    }
    assert_eq!(rows[0].source_url, frame_url(RAIN, "2001-01-01"));

    let first = cursor_timestamp(parse_catalog_date("2001-01-01").unwrap());
    let last = cursor_timestamp(parse_catalog_date("2001-03-01").unwrap());
    let calls = sink.calls();
    assert!(matches!(&calls[0], SinkCall::Rows { dataset_label, .. } if dataset_label == "Rainfall"));
    assert!(matches!(&calls[1], SinkCall::Timeline(b) if b.lower_bound == first && b.upper_bound == last && b.initial_value == first));
    assert!(matches!(&calls[2], SinkCall::Show(v) if v.index == 0 && v.title == "Rainfall - 2001-01-01"));
}

#[tokio::test]
async fn test_red_frame_end_to_end() {
    let dataset = find_dataset(RAIN).unwrap();
    let date = "2001-01-01";
    let source = MemoryImageSource::new().with_image(frame_url(RAIN, date), solid_color_png(720, 360, (255, 0, 0)));
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), source, sink.clone());

    let set = orch.run(dataset, &catalog(RAIN, &[date]), vec![demo_point()]).await.unwrap();
    let sample = &set.frames()[0].samples[0];
    assert_eq!(sample.color.to_hex(), "#ff0000");
    assert_eq!(sample.palette_index, 0);
}

#[tokio::test]
async fn test_failed_frame_is_omitted() {
    let dataset = find_dataset(RAIN).unwrap();
    let source = source_with(RAIN, &Q1, &ramp_palette(), 10).with_failure(frame_url(RAIN, "2001-02-01"));
    let sink = RecordingSink::new();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let mut orch =
        orchestrator(config(), source, sink.clone()).with_progress(move |d, t| seen.lock().unwrap().push((d, t)));

    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();

    let dates: Vec<String> = set.frames().iter().map(|f| f.date.to_string()).collect();
    assert_eq!(dates, vec!["2001-01-01", "2001-03-01"]);
    assert_eq!(sink.rows()[0].len(), 2);
    // Failed frames still count toward progress.
    assert_eq!(progress.lock().unwrap().last(), Some(&(3, 3)));
}

#[tokio::test]
async fn test_undecodable_frame_is_omitted() {
    let dataset = find_dataset(RAIN).unwrap();
    let dates = ["2001-01-01", "2001-02-01"];
    let source = source_with(RAIN, &dates[..1], &ramp_palette(), 10)
        .with_image(frame_url(RAIN, "2001-02-01"), b"not a png".to_vec());
    let mut orch = orchestrator(config(), source, RecordingSink::new());

    let set = orch.run(dataset, &catalog(RAIN, &dates), vec![demo_point()]).await.unwrap();
    assert_eq!(set.len(), 1);
}

#[tokio::test]
async fn test_missing_palette_fails_run_without_push() {
    let dataset = find_dataset(RAIN).unwrap();
    let date = "2001-01-01";
    let rgba = create_png_rgba(&[255, 0, 0, 255].repeat(4), 2, 2).unwrap();
    let source = MemoryImageSource::new().with_image(frame_url(RAIN, date), rgba);
    let sink = RecordingSink::new();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let mut orch =
        orchestrator(config(), source, sink.clone()).with_progress(move |d, t| seen.lock().unwrap().push((d, t)));

    let err = orch.run(dataset, &catalog(RAIN, &[date]), vec![demo_point()]).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::Palette(_)));
    assert!(matches!(orch.state(), RunState::Failed(_)));
    assert!(sink.calls().is_empty());
    assert!(orch.frame_set().is_none());
    // The opening progress report may already have fired.
    assert_eq!(progress.lock().unwrap().clone(), vec![(0, 1)]);
}

#[tokio::test]
async fn test_unreachable_reference_raster_fails_run() {
    let dataset = find_dataset(RAIN).unwrap();
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), MemoryImageSource::new(), sink.clone());

    let err = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Palette(_)));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_empty_catalog_fails_run() {
    let dataset = find_dataset(RAIN).unwrap();
    let mut orch = orchestrator(config(), MemoryImageSource::new(), RecordingSink::new());
    let err = orch.run(dataset, &catalog(RAIN, &[]), vec![]).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Dataset(_)));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dataset = find_dataset(RAIN).unwrap();
    let pins = vec![demo_point(), point("eq", 0.0, 10.0)];
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 42), sink.clone());

    let first = orch.run(dataset, &catalog(RAIN, &Q1), pins.clone()).await.unwrap();
    let second = orch.run(dataset, &catalog(RAIN, &Q1), pins).await.unwrap();

    let strip = |set: &frame_series::FrameSet| {
        set.rows()
            .into_iter()
            .map(|mut r| {
                r.load_time_ms = 0.0;
                r
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&first), strip(&second));
    assert_eq!(first.rows().len(), 6);
    assert_eq!(sink.rows().len(), 2);
}

#[tokio::test]
async fn test_rows_grouped_by_pin_then_date() {
    let dataset = find_dataset(RAIN).unwrap();
    let pins = vec![point("b", 10.0, 10.0), point("a", -10.0, -10.0)];
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 5), RecordingSink::new());

    let set = orch.run(dataset, &catalog(RAIN, &Q1), pins).await.unwrap();
    let order: Vec<(String, String)> = set
        .rows()
        .into_iter()
        .map(|r| (r.point_label, r.date.to_string()))
        .collect();
    assert_eq!(order[0], ("10.00, 10.00".to_string(), "2001-01-01".to_string()));
    assert_eq!(order[2], ("10.00, 10.00".to_string(), "2001-03-01".to_string()));
    assert_eq!(order[3], ("-10.00, -10.00".to_string(), "2001-01-01".to_string()));
}

#[tokio::test]
async fn test_no_pins_still_publishes_timeline() {
    let dataset = find_dataset(RAIN).unwrap();
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 5), sink.clone());

    let set = orch.run(dataset, &catalog(RAIN, &Q1), Vec::<SamplePoint>::new()).await.unwrap();
    assert_eq!(set.len(), 3);
    assert!(sink.rows().is_empty());
    assert!(matches!(sink.calls()[0], SinkCall::Timeline(_)));
    assert_eq!(sink.shown().len(), 1);
}

#[tokio::test]
async fn test_max_frames_truncates_catalog_order() {
    let dataset = find_dataset(RAIN).unwrap();
    let config = OrchestratorConfig {
        max_frames: Some(2),
        ..config()
    };
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let mut orch = orchestrator(config, source_with(RAIN, &Q1, &ramp_palette(), 5), RecordingSink::new())
        .with_progress(move |d, t| seen.lock().unwrap().push((d, t)));

    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();

    // The first two catalog entries are March and January: February is skipped.
    let dates: Vec<String> = set.frames().iter().map(|f| f.date.to_string()).collect();
    assert_eq!(dates, vec!["2001-01-01", "2001-03-01"]);
    assert_eq!(progress.lock().unwrap().clone(), vec![(0, 2), (1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_parallel_completion_order_does_not_matter() {
    let dataset = find_dataset(RAIN).unwrap();
    let source = source_with(RAIN, &Q1, &ramp_palette(), 5)
        .with_delay(frame_url(RAIN, "2001-01-01"), Duration::from_millis(40))
        .with_delay(frame_url(RAIN, "2001-02-01"), Duration::from_millis(20));
    let mut orch = orchestrator(config(), source, RecordingSink::new());

    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();
    let dates: Vec<String> = set.frames().iter().map(|f| f.date.to_string()).collect();
    assert_eq!(dates, vec!["2001-01-01", "2001-02-01", "2001-03-01"]);
}

#[tokio::test]
async fn test_parallel_mode_issues_every_frame_at_once() {
    let dataset = find_dataset(RAIN).unwrap();
    let delay = Duration::from_millis(200);
    let source = Q1.iter().fold(source_with(RAIN, &Q1, &ramp_palette(), 5), |source, date| {
        source.with_delay(frame_url(RAIN, date), delay)
    });
    let source = Arc::new(source);
    let mut orch = FrameOrchestrator::new(config(), source.clone(), RecordingSink::new()).unwrap();

    let started = Instant::now();
    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(set.len(), 3);
    assert_eq!(source.peak_in_flight(), Q1.len());
    // Reference raster plus one overlapping batch; one by one would take four delays.
    assert!(elapsed < delay * 3, "took {:?}", elapsed);
}

#[tokio::test]
async fn test_serial_mode_waits_between_frames() {
    let dataset = find_dataset(RAIN).unwrap();
    let delay = Duration::from_millis(25);
    let config = OrchestratorConfig {
        load_mode: LoadMode::Serial { delay },
        ..config()
    };
    let source = Arc::new(source_with(RAIN, &Q1, &ramp_palette(), 5));
    let mut orch = FrameOrchestrator::new(config, source.clone(), RecordingSink::new()).unwrap();

    let started = Instant::now();
    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();

    assert_eq!(set.len(), 3);
    assert!(started.elapsed() >= delay * 2);
    assert_eq!(source.peak_in_flight(), 1);
    // Reference raster first, then frames strictly in catalog order.
    let fetched = source.fetched();
    assert_eq!(fetched[0], frame_url(RAIN, "2001-03-01"));
    let frames: Vec<String> = Q1.iter().map(|d| frame_url(RAIN, d)).collect();
    assert_eq!(&fetched[1..], &frames[..]);
}

#[tokio::test]
async fn test_colliding_black_resolves_to_no_data() {
    let dataset = find_dataset("MOD_NDVI_M").unwrap();
    let dates = ["2001-01-01"];
    let source = source_with(dataset.id, &dates, &ramp_palette_with_black_collision(), 0);
    let mut orch = orchestrator(config(), source, RecordingSink::new());

    let set = orch.run(dataset, &catalog(dataset.id, &dates), vec![demo_point()]).await.unwrap();
    let sample = &set.frames()[0].samples[0];
    assert_eq!(sample.color.to_hex(), "#000000");
    assert_eq!(sample.palette_index, 255);
    assert_eq!(sample.value, None);
}

#[tokio::test]
async fn test_cursor_change_shows_matching_frame() {
    let dataset = find_dataset(RAIN).unwrap();
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 5), sink.clone());
    let set = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();
    let ts = set.timestamps();

    // The host echoes the published initial value back.
    assert_eq!(orch.handle_cursor_change(&json!(ts[0])).await.unwrap(), None);

    // Between Jan and Feb: still January, nothing to do.
    assert_eq!(orch.handle_cursor_change(&json!((ts[0] + ts[1]) / 2)).await.unwrap(), None);

    let view = orch.handle_cursor_change(&json!(ts[2] + 3600)).await.unwrap().unwrap();
    assert_eq!(view.index, 2);
    assert_eq!(view.title, "Rainfall - 2001-03-01");
    assert_eq!(orch.shown_frame(), Some(2));

    // Before the first frame or not a number: no change.
    assert_eq!(orch.handle_cursor_change(&json!(ts[0] - 1)).await.unwrap(), None);
    assert_eq!(orch.handle_cursor_change(&json!("soon")).await.unwrap(), None);

    // Initial show plus the one cursor-driven change; the timeline was set once.
    assert_eq!(sink.shown().len(), 2);
    let timelines = sink.calls().iter().filter(|c| matches!(c, SinkCall::Timeline(_))).count();
    assert_eq!(timelines, 1);
}

#[tokio::test]
async fn test_sink_rejection_surfaces() {
    let dataset = find_dataset(RAIN).unwrap();
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 5), RecordingSink::rejecting_rows());
    let err = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Sink(_)));
}

#[tokio::test]
async fn test_failed_publish_keeps_previous_frame_set() {
    let dataset = find_dataset(RAIN).unwrap();
    let sink = RecordingSink::new();
    let mut orch = orchestrator(config(), source_with(RAIN, &Q1, &ramp_palette(), 5), sink.clone());
    let first = orch.run(dataset, &catalog(RAIN, &Q1), vec![demo_point()]).await.unwrap();
    let ts = first.timestamps();
    orch.handle_cursor_change(&json!(ts[0])).await.unwrap();
    orch.handle_cursor_change(&json!(ts[2])).await.unwrap();
    assert_eq!(orch.shown_frame(), Some(2));

    sink.reject_timeline(true);
    let err = orch
        .run(dataset, &catalog(RAIN, &Q1[1..2]), vec![demo_point()])
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Sink(_)));
    assert!(matches!(orch.state(), RunState::Failed(_)));

    // The earlier run is still what the controller follows.
    assert_eq!(orch.frame_set().unwrap().len(), 3);
    assert_eq!(orch.shown_frame(), Some(2));
    let view = orch.handle_cursor_change(&json!(ts[1])).await.unwrap().unwrap();
    assert_eq!(view.title, "Rainfall - 2001-02-01");
}

#[test]
fn test_invalid_config_rejected() {
    let config = OrchestratorConfig {
        max_frames: Some(0),
        ..config()
    };
    let result = FrameOrchestrator::new(config, Arc::new(MemoryImageSource::new()), RecordingSink::new());
    assert!(matches!(result, Err(OrchestratorError::Config(_))));
}
