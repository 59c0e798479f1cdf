//! Contracts between the scheduler and the surrounding system.
//!
//! The scheduler owns no global state. Everything it talks to is handed in at
//! construction: the renderer that applies records, the progress and subtitle
//! widgets, the segment source, the state facade and an event sink. Collector
//! implementations record every call for tests and headless runs.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::audio::{AudioElement, SimulatedAudio};
use crate::error::Result;
use crate::record::{Record, Segment};
use crate::tick::{IntervalTicks, TickSource};

// ---------------------------------------------------------------------------
// Renderer and widgets
// ---------------------------------------------------------------------------

/// Applies recorded mutations to a view.
///
/// `apply` may be called many times per tick. The scheduler never waits for
/// the mutation to become visible.
pub trait Renderer: Send {
    fn apply(&mut self, record: &Record);

    /// Signal that the view should be rebuilt for a newly active segment.
    fn reset_view(&mut self, view_index: usize, segment: &Segment) {
        let _ = (view_index, segment);
    }
}

/// Progress bar and timer.
pub trait ProgressWidget: Send {
    fn reset_thumb(&mut self);
    fn set_progress_animation(
        &mut self,
        frame_index: usize,
        total_frames: usize,
        interval_ms: u64,
        speed: f64,
    );
    fn draw_heat_points(&mut self, counts: &[u32]);
    fn update_timer(&mut self, frame_index: usize, interval_ms: u64, view_diff_ms: u64);
}

/// Caption display.
pub trait SubtitleWidget: Send {
    fn update_text(&mut self, text: &str);
    fn clean_text(&mut self);
}

// ---------------------------------------------------------------------------
// Segment source and state facade
// ---------------------------------------------------------------------------

/// Lazily loads segments by index. `Ok(None)` marks the end of the recording.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn load_segment(&self, index: usize) -> Result<Option<Segment>>;
}

/// Recording-wide time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,
}

/// Replay state shared with the surrounding UI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayState {
    pub speed: f64,
    pub progress: ProgressInfo,
    pub current_segment: usize,
    pub segments: Arc<[Segment]>,
}

/// Read and write access to the shared replay state.
pub trait StateFacade: Send + Sync {
    fn snapshot(&self) -> ReplayState;

    /// Change notifications. The scheduler reacts to speed changes only.
    fn subscribe(&self) -> watch::Receiver<ReplayState>;

    fn set_speed(&self, speed: f64);

    /// Record that the segment at `index` is now active.
    fn advance_segment(&self, index: usize);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Fire-and-forget notifications for the surrounding UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerEvent {
    Play,
    Pause,
    Stop,
    Speed { value: f64 },
    Progress { frame_index: usize, last_frame: usize },
    /// A requested segment has not arrived and playback is holding.
    Stalled { view_index: usize },
}

pub trait EventSink: Send {
    fn emit(&mut self, event: PlayerEvent);
}

impl EventSink for mpsc::UnboundedSender<PlayerEvent> {
    fn emit(&mut self, event: PlayerEvent) {
        // A dropped receiver just means nobody is listening.
        let _ = self.send(event);
    }
}

// ---------------------------------------------------------------------------
// Null implementations
// ---------------------------------------------------------------------------

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressWidget for NullProgress {
    fn reset_thumb(&mut self) {}
    fn set_progress_animation(&mut self, _: usize, _: usize, _: u64, _: f64) {}
    fn draw_heat_points(&mut self, _: &[u32]) {}
    fn update_timer(&mut self, _: usize, _: u64, _: u64) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSubtitles;

impl SubtitleWidget for NullSubtitles {
    fn update_text(&mut self, _: &str) {}
    fn clean_text(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullEvents;

impl EventSink for NullEvents {
    fn emit(&mut self, _: PlayerEvent) {}
}

// ---------------------------------------------------------------------------
// Collectors (cloneable handles over shared buffers)
// ---------------------------------------------------------------------------

/// Records applied records and view resets.
#[derive(Debug, Clone, Default)]
pub struct CollectorRenderer {
    applied: Arc<Mutex<Vec<Record>>>,
    resets: Arc<Mutex<Vec<usize>>>,
}

impl CollectorRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn applied(&self) -> Vec<Record> {
        self.applied.lock().clone()
    }

    /// Times of applied records, in application order.
    #[must_use]
    pub fn applied_times(&self) -> Vec<u64> {
        self.applied.lock().iter().map(|r| r.time).collect()
    }

    /// View indices passed to `reset_view`.
    #[must_use]
    pub fn resets(&self) -> Vec<usize> {
        self.resets.lock().clone()
    }
}

impl Renderer for CollectorRenderer {
    fn apply(&mut self, record: &Record) {
        self.applied.lock().push(record.clone());
    }

    fn reset_view(&mut self, view_index: usize, _segment: &Segment) {
        self.resets.lock().push(view_index);
    }
}

/// One recorded progress-widget call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressCall {
    ResetThumb,
    Animation {
        frame_index: usize,
        total_frames: usize,
        interval_ms: u64,
        speed: f64,
    },
    HeatPoints(Vec<u32>),
    Timer {
        frame_index: usize,
        interval_ms: u64,
        view_diff_ms: u64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CollectorProgress {
    calls: Arc<Mutex<Vec<ProgressCall>>>,
}

impl CollectorProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ProgressCall> {
        self.calls.lock().clone()
    }

    /// Every heatmap drawn so far.
    #[must_use]
    pub fn heat_points(&self) -> Vec<Vec<u32>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ProgressCall::HeatPoints(points) => Some(points.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressWidget for CollectorProgress {
    fn reset_thumb(&mut self) {
        self.calls.lock().push(ProgressCall::ResetThumb);
    }

    fn set_progress_animation(
        &mut self,
        frame_index: usize,
        total_frames: usize,
        interval_ms: u64,
        speed: f64,
    ) {
        self.calls.lock().push(ProgressCall::Animation {
            frame_index,
            total_frames,
            interval_ms,
            speed,
        });
    }

    fn draw_heat_points(&mut self, counts: &[u32]) {
        self.calls
            .lock()
            .push(ProgressCall::HeatPoints(counts.to_vec()));
    }

    fn update_timer(&mut self, frame_index: usize, interval_ms: u64, view_diff_ms: u64) {
        self.calls.lock().push(ProgressCall::Timer {
            frame_index,
            interval_ms,
            view_diff_ms,
        });
    }
}

#[derive(Debug, Default)]
struct SubtitleLog {
    shown: Vec<String>,
    current: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectorSubtitles {
    log: Arc<Mutex<SubtitleLog>>,
}

impl CollectorSubtitles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every text ever displayed, in order.
    #[must_use]
    pub fn shown(&self) -> Vec<String> {
        self.log.lock().shown.clone()
    }

    /// Text currently on screen.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.log.lock().current.clone()
    }
}

impl SubtitleWidget for CollectorSubtitles {
    fn update_text(&mut self, text: &str) {
        let mut log = self.log.lock();
        log.shown.push(text.to_string());
        log.current = Some(text.to_string());
    }

    fn clean_text(&mut self) {
        self.log.lock().current = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectorEvents {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl CollectorEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    /// Count events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&PlayerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for CollectorEvents {
    fn emit(&mut self, event: PlayerEvent) {
        self.events.lock().push(event);
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Everything the scheduler drives besides the source and facade.
pub struct Collaborators {
    pub renderer: Box<dyn Renderer>,
    pub progress: Box<dyn ProgressWidget>,
    pub subtitles: Box<dyn SubtitleWidget>,
    pub events: Box<dyn EventSink>,
    pub audio: Box<dyn AudioElement>,
    pub ticks: Box<dyn TickSource>,
}

impl Collaborators {
    /// Bundle with a renderer and inert defaults for everything else.
    ///
    /// Audio defaults to a simulated element and ticks to a tokio interval.
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
            progress: Box::new(NullProgress),
            subtitles: Box::new(NullSubtitles),
            events: Box::new(NullEvents),
            audio: Box::new(SimulatedAudio::new()),
            ticks: Box::new(IntervalTicks::new()),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressWidget + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    #[must_use]
    pub fn with_subtitles(mut self, subtitles: impl SubtitleWidget + 'static) -> Self {
        self.subtitles = Box::new(subtitles);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    #[must_use]
    pub fn with_audio(mut self, audio: impl AudioElement + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    #[must_use]
    pub fn with_ticks(mut self, ticks: impl TickSource + 'static) -> Self {
        self.ticks = Box::new(ticks);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(PlayerEvent::Progress {
            frame_index: 3,
            last_frame: 9,
        })
        .unwrap();
        assert_eq!(json["type"], "PROGRESS");
        assert_eq!(json["frame_index"], 3);

        let speed = serde_json::to_value(PlayerEvent::Speed { value: 2.0 }).unwrap();
        assert_eq!(speed["type"], "SPEED");
        assert_eq!(speed["value"], 2.0);
    }

    #[test]
    fn collector_renderer_shares_buffer_across_clones() {
        let renderer = CollectorRenderer::new();
        let mut handle = renderer.clone();
        handle.apply(&Record::new(RecordKind::Dom, 5));
        handle.reset_view(1, &Segment::default());
        assert_eq!(renderer.applied_times(), vec![5]);
        assert_eq!(renderer.resets(), vec![1]);
    }

    #[test]
    fn unbounded_sender_is_an_event_sink() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(PlayerEvent::Play);
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::Play);
        drop(rx);
        tx.emit(PlayerEvent::Stop);
    }

    #[test]
    fn collector_progress_filters_heat_points() {
        let progress = CollectorProgress::new();
        let mut handle = progress.clone();
        handle.reset_thumb();
        handle.draw_heat_points(&[1, 2]);
        assert_eq!(progress.heat_points(), vec![vec![1, 2]]);
        assert_eq!(progress.calls().len(), 2);
    }
}
