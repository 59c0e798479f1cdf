//! Scheduler-owned playback state and the frame-advance step.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::timeline::FrameTimeline;

/// Lifecycle of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Loaded, never played.
    #[default]
    Idle,
    Playing,
    /// Position retained.
    Paused,
    /// Position reset. Only `restart()` plays again.
    Stopped,
}

/// Position and clock anchors, mutated only by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// Speed multiplier; 0 while paused.
    pub speed: f64,
    /// Position in the frame timeline.
    pub frame_index: usize,
    /// Next undispatched record of the active segment.
    pub record_index: usize,
    /// Seconds since the start of the first segment.
    pub elapsed_secs: f64,
    /// Accumulated real-world gap between segments, in ms.
    pub view_diff_ms: u64,
    /// Index of the active segment.
    pub view_index: usize,
    /// Wall-clock anchor of the current advance run.
    pub loop_start: Option<Instant>,
    /// Timeline value at `loop_start`.
    pub start_frame_value: f64,
    /// Most recently computed timeline value.
    pub target: f64,
}

impl PlaybackState {
    /// Fresh state positioned at the beginning of `timeline`.
    #[must_use]
    pub fn at_start(timeline: &FrameTimeline) -> Self {
        let start = timeline.start() as f64;
        Self {
            start_frame_value: start,
            target: start,
            ..Self::default()
        }
    }

    /// Timeline value reached at `now` under the current anchor and speed.
    #[must_use]
    pub fn target_at(&self, now: Instant) -> f64 {
        match self.loop_start {
            Some(anchor) => {
                let elapsed_ms = now.saturating_duration_since(anchor).as_secs_f64() * 1000.0;
                self.start_frame_value + elapsed_ms * self.speed
            }
            None => self.target,
        }
    }

    /// Re-anchor the clock so the timeline continues from `value` at `now`.
    pub fn anchor(&mut self, now: Instant, value: f64) {
        self.loop_start = Some(now);
        self.start_frame_value = value;
        self.target = value;
    }

    /// Zero the position counters, keeping segment bookkeeping.
    pub fn reset_position(&mut self, timeline: &FrameTimeline) {
        let start = timeline.start() as f64;
        self.speed = 0.0;
        self.frame_index = 0;
        self.record_index = 0;
        self.elapsed_secs = 0.0;
        self.loop_start = None;
        self.start_frame_value = start;
        self.target = start;
    }
}

/// Outcome of one [`advance_frames`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStep {
    /// Frame index before the step.
    pub from: usize,
    /// Frame index after the step.
    pub to: usize,
    /// Advancement stopped at the hold limit rather than at the target.
    pub held: bool,
}

impl FrameStep {
    #[must_use]
    pub fn crossed(&self) -> usize {
        self.to - self.from
    }
}

/// Advance `frame_index` across every boundary the clock has reached.
///
/// No boundary is skipped: a single step may cross many. When `hold_at` is
/// set, boundaries beyond it are not crossed and the clock is re-anchored at
/// the hold point so playback resumes without a jump once it is lifted.
pub fn advance_frames(
    state: &mut PlaybackState,
    timeline: &FrameTimeline,
    now: Instant,
    hold_at: Option<u64>,
) -> FrameStep {
    let from = state.frame_index;
    if state.loop_start.is_none() || timeline.is_empty() {
        return FrameStep {
            from,
            to: from,
            held: false,
        };
    }

    let target = state.target_at(now);
    state.target = target;

    let mut held = false;
    while let Some(next) = timeline.get(state.frame_index + 1) {
        if next as f64 > target {
            break;
        }
        if hold_at.is_some_and(|limit| next > limit) {
            held = true;
            break;
        }
        state.frame_index += 1;
    }

    // A held step can still have reached the hold point without a boundary
    // to cross; cap the clock there as well.
    if let Some(limit) = hold_at {
        if target > limit as f64 {
            let current = timeline.get(state.frame_index).unwrap_or(0) as f64;
            state.anchor(now, (limit as f64).max(current));
            held = true;
        }
    }

    let start = timeline.start() as f64;
    let end = timeline.end() as f64;
    state.elapsed_secs = (state.target.clamp(start, end.max(start)) - start) / 1000.0;

    FrameStep {
        from,
        to: state.frame_index,
        held,
    }
}
