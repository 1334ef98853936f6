//! Configuration for the frame orchestrator.

use std::time::Duration;

use datasets::{Resolution, UrlMode};

/// Frames fetched when loading serially and no explicit cap is given.
/// Keeps a run under the render servlet's per-client rate limit.
pub const DEFAULT_SERIAL_MAX_FRAMES: usize = 100;

/// Pause between consecutive frames in serial mode.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(500);

/// How frames are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Every frame fetch is in flight at once.
    #[default]
    Parallel,
    /// One frame at a time, with `delay` between the end of one frame and the
    /// start of the next.
    Serial { delay: Duration },
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Parallel => "parallel",
            LoadMode::Serial { .. } => "serial",
        }
    }
}

/// Configuration for a [`crate::FrameOrchestrator`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrchestratorConfig {
    pub load_mode: LoadMode,

    /// Explicit cap on frames per run. `None` picks the mode default.
    pub max_frames: Option<usize>,

    /// Where frame rasters come from.
    pub url_mode: UrlMode,

    /// Overrides the catalog's effective resolution.
    pub resolution: Option<Resolution>,
}

impl OrchestratorConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `NEO_LOAD_MODE` | `parallel` or `serial` |
    /// | `NEO_FRAME_DELAY_MS` | serial inter-frame delay |
    /// | `NEO_MAX_FRAMES` | frame cap |
    /// | `NEO_IMAGE_SOURCE` | `neo` or `mirror` |
    /// | `NEO_BASE_URL` | render servlet base |
    /// | `NEO_MIRROR_URL` | mirror base (URL or directory) |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let delay = lookup("NEO_FRAME_DELAY_MS")
            .and_then(|val| val.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FRAME_DELAY);

        if let Some(val) = lookup("NEO_LOAD_MODE") {
            config.load_mode = match val.to_lowercase().as_str() {
                "serial" => LoadMode::Serial { delay },
                _ => LoadMode::Parallel,
            };
        }

        if let Some(val) = lookup("NEO_MAX_FRAMES") {
            if let Ok(max) = val.parse() {
                config.max_frames = Some(max);
            }
        }

        if let Some(val) = lookup("NEO_IMAGE_SOURCE") {
            if let Ok(mode) = val.parse() {
                config.url_mode = mode;
            }
        }

        let base = match config.url_mode {
            UrlMode::Neo { .. } => lookup("NEO_BASE_URL"),
            UrlMode::Mirror { .. } => lookup("NEO_MIRROR_URL"),
        };
        if let Some(base) = base.filter(|b| !b.trim().is_empty()) {
            config.url_mode = config.url_mode.with_base(base);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_frames == Some(0) {
            return Err("max_frames must be > 0".to_string());
        }

        if self.url_mode.base().trim().is_empty() {
            return Err("image source base URL must not be empty".to_string());
        }

        if let Some(res) = self.resolution {
            if res.width == 0 || res.height == 0 {
                return Err(format!("resolution {} has a zero dimension", res));
            }
        }

        Ok(())
    }

    /// Frame cap actually applied: the explicit value, else unlimited in
    /// parallel mode and [`DEFAULT_SERIAL_MAX_FRAMES`] in serial mode.
    pub fn effective_max_frames(&self) -> Option<usize> {
        match (self.max_frames, self.load_mode) {
            (Some(max), _) => Some(max),
            (None, LoadMode::Parallel) => None,
            (None, LoadMode::Serial { .. }) => Some(DEFAULT_SERIAL_MAX_FRAMES),
        }
    }
}
