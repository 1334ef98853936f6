//! NEO time series sampler.
//!
//! Samples a NASA Earth Observations dataset at a set of map pins:
//! - Loads the pre-scraped image catalog
//! - Fetches every frame from the NEO render servlet or a mirror
//! - Writes one row per (frame, pin) as JSON lines or CSV
//! - Optionally follows time cursor values on stdin and reports the frame
//!   that would be displayed

mod output;
mod pins;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use datasets::{all_datasets, default_dataset, find_dataset, Catalog, Resolution, UrlMode};
use frame_series::{FrameOrchestrator, LoadMode, OrchestratorConfig, DEFAULT_FRAME_DELAY};
use neo_common::SamplePoint;
use raster::{is_local, FileImageSource, HttpImageSource, ImageSource};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use output::{OutputFormat, WriterSink};

#[derive(Parser, Debug)]
#[command(name = "neo-sampler")]
#[command(about = "Sample NASA NEO raster datasets at map pins into a time series")]
struct Cli {
    /// Log level
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sample every frame of a dataset at the given pins
    Run(RunArgs),

    /// List supported datasets
    Datasets {
        /// Catalog file, to include frame counts
        #[arg(long, env = "NEO_CATALOG")]
        catalog: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Dataset id (default: the default dataset)
    #[arg(short, long, env = "NEO_DATASET")]
    dataset: Option<String>,

    /// Scraped catalog JSON
    #[arg(long, env = "NEO_CATALOG")]
    catalog: PathBuf,

    /// Pin as lat,long[,color]; repeatable
    #[arg(short, long = "pin")]
    pins: Vec<String>,

    /// YAML or JSON list of pin records
    #[arg(long)]
    pins_file: Option<PathBuf>,

    /// Row output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    format: OutputFormat,

    /// Row output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override NEO_LOAD_MODE: parallel or serial
    #[arg(long)]
    load_mode: Option<String>,

    /// Override NEO_MAX_FRAMES
    #[arg(long)]
    max_frames: Option<usize>,

    /// Override NEO_IMAGE_SOURCE: neo or mirror
    #[arg(long)]
    image_source: Option<String>,

    /// Override the image source base URL or mirror directory
    #[arg(long)]
    base_url: Option<String>,

    /// Request size as WIDTHxHEIGHT instead of the catalog's
    #[arg(long)]
    resolution: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// After the run, read time cursor values from stdin, one per line
    #[arg(long)]
    follow_cursor: bool,

    /// Write frame metrics in Prometheus text format to this file
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Datasets { catalog } => list_datasets(catalog),
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr; stdout carries rows.
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn list_datasets(catalog: Option<PathBuf>) -> Result<()> {
    let catalog = catalog.map(Catalog::from_path).transpose()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for dataset in all_datasets() {
        let frames = catalog
            .as_ref()
            .and_then(|c| c.dataset(dataset.id).ok())
            .map(|d| format!("{} frames @ {}", d.images.len(), d.resolution()))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<16} {:<32} {:<2} {}",
            dataset.id,
            dataset.label,
            if dataset.default_selected { "*" } else { "" },
            frames
        )?;
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let dataset = match &args.dataset {
        Some(id) => find_dataset(id)?,
        None => default_dataset(),
    };
    let catalog = Catalog::from_path(&args.catalog)?;
    let listing = catalog.dataset(dataset.id)?;

    let points = collect_points(&args)?;
    if points.is_empty() {
        warn!("No pins given; frames are loaded but no rows are written");
    }

    let metrics = match &args.metrics_out {
        Some(_) => Some(
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .context("installing Prometheus recorder")?,
        ),
        None => None,
    };

    let config = build_config(&args)?;
    let source = build_source(&config.url_mode, Duration::from_secs(args.timeout_secs))?;

    let rows: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let sink = Arc::new(WriterSink::new(args.format, rows, Box::new(io::stderr())));

    info!(
        dataset = dataset.id,
        label = dataset.label,
        frames = listing.images.len(),
        pins = points.len(),
        "Starting run"
    );

    let mut orchestrator = FrameOrchestrator::new(config, source, sink)?.with_progress(|done, total| {
        if done == total || done % 10 == 0 {
            info!(done, total, "Progress");
        }
    });
    let frame_set = orchestrator.run(dataset, listing, points).await?;
    info!(frames = frame_set.len(), "Run finished");

    if let (Some(path), Some(handle)) = (&args.metrics_out, &metrics) {
        std::fs::write(path, handle.render()).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Wrote metrics");
    }

    if args.follow_cursor {
        follow_cursor(&mut orchestrator, BufReader::new(tokio::io::stdin())).await?;
    }
    Ok(())
}

fn collect_points(args: &RunArgs) -> Result<Vec<SamplePoint>> {
    let mut points = Vec::new();
    if let Some(path) = &args.pins_file {
        points.extend(pins::load_pins_file(path)?);
    }
    for pin in &args.pins {
        let point = pins::parse_pin_arg(pin, points.len())?;
        points.push(point);
    }
    Ok(points)
}

fn build_config(args: &RunArgs) -> Result<OrchestratorConfig> {
    let mut config = OrchestratorConfig::from_env();

    if let Some(mode) = &args.load_mode {
        config.load_mode = match mode.to_lowercase().as_str() {
            "parallel" => LoadMode::Parallel,
            "serial" => match config.load_mode {
                serial @ LoadMode::Serial { .. } => serial,
                LoadMode::Parallel => LoadMode::Serial {
                    delay: DEFAULT_FRAME_DELAY,
                },
            },
            other => bail!("unknown load mode '{}', expected parallel or serial", other),
        };
    }
    if let Some(max) = args.max_frames {
        config.max_frames = Some(max);
    }
    if let Some(kind) = &args.image_source {
        config.url_mode = kind.parse::<UrlMode>().map_err(anyhow::Error::msg)?;
    }
    if let Some(base) = &args.base_url {
        config.url_mode = config.url_mode.with_base(base.clone());
    }
    if let Some(res) = &args.resolution {
        config.resolution = Some(parse_resolution(res)?);
    }

    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn parse_resolution(s: &str) -> Result<Resolution> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("resolution '{}' must be WIDTHxHEIGHT", s);
    };
    let width = w.trim().parse().with_context(|| format!("resolution '{}': bad width", s))?;
    let height = h.trim().parse().with_context(|| format!("resolution '{}': bad height", s))?;
    Ok(Resolution::new(width, height))
}

fn build_source(url_mode: &UrlMode, timeout: Duration) -> Result<Arc<dyn ImageSource>> {
    if is_local(url_mode.base()) {
        info!(base = url_mode.base(), "Reading frames from local mirror");
        return Ok(Arc::new(FileImageSource::new()));
    }
    Ok(Arc::new(HttpImageSource::new(timeout)?))
}

/// Apply cursor values as they arrive on `input`, until it closes. Each line
/// is a bare number or a JSON `{"globalValue": ...}` notification.
///
/// Returns how many values changed the displayed frame.
async fn follow_cursor<R>(orchestrator: &mut FrameOrchestrator, input: R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut changes = 0;
    while let Some(line) = lines.next_line().await.context("failed to read cursor input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match orchestrator.handle_cursor_change(&cursor_value(line)).await? {
            Some(view) => {
                changes += 1;
                info!(cursor = line, frame = view.index, title = %view.title, "Frame changed");
            }
            None => info!(cursor = line, shown = ?orchestrator.shown_frame(), "No frame change"),
        }
    }
    Ok(changes)
}

fn cursor_value(line: &str) -> Value {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(mut obj)) => obj.remove("globalValue").unwrap_or(Value::Null),
        Ok(value) => value,
        Err(_) => Value::String(line.to_string()),
    }
}
