//! Keeps the shared time cursor and the displayed frame consistent.
//!
//! Two inputs drive the controller: a new frame set, and a cursor change
//! reported by the host. Each returns the effects to apply. A cursor change
//! can only ever produce [`SyncEffect::ShowFrame`], so displaying a frame in
//! response to the cursor never writes the cursor back.
//!
//! ```text
//!             frame set (non-empty)
//!   NoFrames ────────────────────────▶ AwaitingEcho ──cursor == pending──▶ Following
//!      ▲                                    │                                 │
//!      └──── frame set (empty) ─────────────┴──── other cursor ───────────────┘
//!                                                  (lookup, maybe ShowFrame)
//! ```

use neo_common::coerce_cursor;
use serde_json::Value;
use tracing::debug;

use crate::frame::{index_at, FrameSet, TimelineBounds};

/// Something the host must be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEffect {
    /// Configure the timeline and set the cursor to its initial value.
    PublishTimeline(TimelineBounds),
    /// Display the frame at this index.
    ShowFrame(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncState {
    NoFrames,
    /// The cursor was just published; the host will echo it back.
    AwaitingEcho { pending: f64, shown: usize },
    Following { shown: usize },
}

/// Time cursor state machine.
#[derive(Debug, Clone)]
pub struct TimeSync {
    state: SyncState,
    timestamps: Vec<i64>,
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSync {
    pub fn new() -> Self {
        Self {
            state: SyncState::NoFrames,
            timestamps: Vec::new(),
        }
    }

    /// A run completed. Publishes the range and snaps to the first frame.
    pub fn on_frame_set(&mut self, frames: &FrameSet) -> Vec<SyncEffect> {
        self.timestamps = frames.timestamps();
        let Some(bounds) = frames.bounds() else {
            self.state = SyncState::NoFrames;
            return Vec::new();
        };
        let shown = index_at(&self.timestamps, bounds.initial_value as f64).unwrap_or(0);
        self.state = SyncState::AwaitingEcho {
            pending: bounds.initial_value as f64,
            shown,
        };
        vec![SyncEffect::PublishTimeline(bounds), SyncEffect::ShowFrame(shown)]
    }

    /// The host reports a new cursor value (`globalValue`).
    ///
    /// Returns the frame to display, if the display must change. Values that
    /// are not number-like or fall before the first frame change nothing.
    pub fn on_cursor_change(&mut self, global_value: &Value) -> Option<SyncEffect> {
        let cursor = coerce_cursor(global_value)?;
        let shown = match self.state {
            SyncState::NoFrames => return None,
            SyncState::AwaitingEcho { pending, shown } if pending == cursor => {
                debug!(cursor, "Cursor echo consumed");
                self.state = SyncState::Following { shown };
                return None;
            }
            SyncState::AwaitingEcho { shown, .. } | SyncState::Following { shown } => shown,
        };

        let Some(index) = index_at(&self.timestamps, cursor) else {
            self.state = SyncState::Following { shown };
            return None;
        };
        self.state = SyncState::Following { shown: index };
        (index != shown).then_some(SyncEffect::ShowFrame(index))
    }

    /// Index of the frame currently displayed.
    pub fn shown(&self) -> Option<usize> {
        match self.state {
            SyncState::NoFrames => None,
            SyncState::AwaitingEcho { shown, .. } | SyncState::Following { shown } => Some(shown),
        }
    }
}
