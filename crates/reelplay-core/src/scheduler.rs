//! Tick-driven playback scheduler.
//!
//! Each tick advances the frame position by wall-clock time times speed,
//! applies due records, hands off to the next segment when the active one
//! runs out, and periodically pulls the audio element back into line.
//!
//! All state changes happen inside `tick` or an explicit control call; both
//! run to completion. Segment fetches run as detached tasks that the tick
//! polls, so a slow source holds playback at the boundary instead of blocking
//! the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::audio::AudioSyncController;
use crate::collaborators::{
    Collaborators, EventSink, PlayerEvent, ProgressWidget, Renderer, ReplayState, SegmentSource,
    StateFacade, SubtitleWidget,
};
use crate::config::ReplayConfig;
use crate::dispatch::{dispatch_due, flush_remaining};
use crate::error::{Error, PlaybackError, Result};
use crate::heatmap::heat_points;
use crate::record::{Record, Segment};
use crate::state::{PlaybackState, PlayerState, advance_frames};
use crate::subtitle::SubtitleTrack;
use crate::tick::{TickHandle, TickSource};
use crate::timeline::FrameTimeline;
use crate::view::ViewState;

/// Control signal sent to [`PlaybackScheduler::run`] via a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerControl {
    Play,
    Pause,
    Stop,
    /// Reload segment 0 and play from the beginning.
    Restart,
    /// Change speed; 0 pauses.
    SetSpeed(f64),
}

struct PendingFetch {
    index: usize,
    rx: oneshot::Receiver<Result<Option<Segment>>>,
    task: JoinHandle<()>,
    requested_at: Instant,
}

#[derive(Debug, Default)]
struct StallTracker {
    since: Option<Instant>,
    reported: bool,
}

/// Plays a segmented recording against a frame timeline.
pub struct PlaybackScheduler {
    config: ReplayConfig,
    source: Arc<dyn SegmentSource>,
    facade: Arc<dyn StateFacade>,

    renderer: Box<dyn Renderer>,
    progress: Box<dyn ProgressWidget>,
    subtitle_widget: Box<dyn SubtitleWidget>,
    events: Box<dyn EventSink>,
    ticks: Box<dyn TickSource>,
    tick_handle: Option<TickHandle>,

    audio: AudioSyncController,
    subtitles: SubtitleTrack,
    view: ViewState,
    timeline: FrameTimeline,
    state: PlaybackState,
    player_state: PlayerState,

    resume_speed: f64,
    heat_drawn: bool,
    fetch: Option<PendingFetch>,
    source_exhausted: bool,
    stall: StallTracker,
    play_started: Option<Instant>,
    drift_window: Option<u64>,
    live_feed: Option<mpsc::UnboundedReceiver<Record>>,
}

impl PlaybackScheduler {
    /// Build a scheduler around an already loaded first segment.
    pub fn new(
        config: ReplayConfig,
        initial: Segment,
        source: Arc<dyn SegmentSource>,
        facade: Arc<dyn StateFacade>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            renderer,
            progress,
            subtitles: subtitle_widget,
            events,
            audio,
            ticks,
        } = collaborators;

        let mut audio = AudioSyncController::new(audio, &config.audio)?;
        audio.load(initial.audio.as_ref());
        let subtitles = SubtitleTrack::from_cues(cues_of(&initial));

        let view = ViewState::new(initial);
        let timeline = build_timeline(
            &view,
            &facade.snapshot(),
            config.playback.frame_interval_ms,
        );
        let state = PlaybackState::at_start(&timeline);
        let resume_speed = config.playback.initial_speed;

        tracing::debug!(
            frames = timeline.len(),
            live = view.is_live(),
            records = view.records().len(),
            "scheduler created"
        );

        Ok(Self {
            config,
            source,
            facade,
            renderer,
            progress,
            subtitle_widget,
            events,
            ticks,
            tick_handle: None,
            audio,
            subtitles,
            view,
            timeline,
            state,
            player_state: PlayerState::Idle,
            resume_speed,
            heat_drawn: false,
            fetch: None,
            source_exhausted: false,
            stall: StallTracker::default(),
            play_started: None,
            drift_window: None,
            live_feed: None,
        })
    }

    /// Fetch segment 0 from `source` and build a scheduler around it.
    pub async fn load(
        config: ReplayConfig,
        source: Arc<dyn SegmentSource>,
        facade: Arc<dyn StateFacade>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let initial = load_first(source.as_ref()).await?;
        Self::new(config, initial, source, facade, collaborators)
    }

    /// Feed records into a live session from a channel while [`run`](Self::run) is active.
    pub fn attach_live_feed(&mut self, feed: mpsc::UnboundedReceiver<Record>) {
        self.live_feed = Some(feed);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn player_state(&self) -> PlayerState {
        self.player_state
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn timeline(&self) -> &FrameTimeline {
        &self.timeline
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn audio(&self) -> &AudioSyncController {
        &self.audio
    }

    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.view.is_live()
    }

    /// A requested segment has held playback past the stall threshold.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.stall.reported
    }

    /// A next-segment fetch is in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    #[must_use]
    pub fn tick_active(&self) -> bool {
        self.tick_handle.is_some()
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Start or resume playback.
    ///
    /// The first call also draws the heatmap. After `stop()` only
    /// [`restart`](Self::restart) plays again.
    pub fn play(&mut self) -> Result<()> {
        match self.player_state {
            PlayerState::Stopped => return Err(PlaybackError::RestartRequired.into()),
            PlayerState::Idle => self.draw_heatmap_once(),
            PlayerState::Playing | PlayerState::Paused => {}
        }

        let now = Instant::now();
        let value = self.state.target_at(now);
        let speed = self.resume_speed;
        self.state.speed = speed;
        self.player_state = PlayerState::Playing;
        self.facade.set_speed(speed);

        let _span =
            crate::playback_span!("play", view_index = self.view.index(), speed = speed).entered();

        if self.view.is_live() {
            self.stop_ticks();
            let applied = self.flush_live();
            self.events.emit(PlayerEvent::Play);
            tracing::info!(applied, "live playback; applying pushed records on arrival");
            return Ok(());
        }

        self.state.anchor(now, value);
        self.play_started = Some(now);
        self.drift_window = Some(0);

        if !self.view.reset_pending() {
            self.dispatch_current();
        }
        let elapsed = self.segment_elapsed();
        self.audio.play_audio(elapsed, speed);
        self.progress.set_progress_animation(
            self.state.frame_index,
            self.timeline.len(),
            self.timeline.interval_ms(),
            speed,
        );
        self.start_ticks();
        self.events.emit(PlayerEvent::Play);
        tracing::info!(frame_index = self.state.frame_index, "playback started");
        Ok(())
    }

    /// Stop ticking and keep the position.
    pub fn pause(&mut self) {
        if self.player_state != PlayerState::Playing {
            return;
        }
        let now = Instant::now();
        self.stop_ticks();

        let value = self.state.target_at(now);
        self.state.anchor(now, value);
        if self.state.speed > 0.0 {
            self.resume_speed = self.state.speed;
        }
        self.state.speed = 0.0;
        self.player_state = PlayerState::Paused;

        self.audio.pause_audio();
        self.facade.set_speed(0.0);
        self.progress.set_progress_animation(
            self.state.frame_index,
            self.timeline.len(),
            self.timeline.interval_ms(),
            0.0,
        );
        self.events.emit(PlayerEvent::Pause);
        tracing::info!(frame_index = self.state.frame_index, "playback paused");
    }

    /// Stop ticking and reset the position to zero.
    pub fn stop(&mut self) {
        if self.player_state == PlayerState::Stopped {
            return;
        }
        self.stop_ticks();
        self.cancel_fetch();
        self.view.take_reset();

        self.state.reset_position(&self.timeline);
        self.player_state = PlayerState::Stopped;
        self.stall = StallTracker::default();
        self.play_started = None;
        self.drift_window = None;

        self.audio.reset();
        self.subtitles.reset(&mut *self.subtitle_widget);
        self.facade.set_speed(0.0);
        self.progress.reset_thumb();
        self.events.emit(PlayerEvent::Stop);
        tracing::info!(view_index = self.view.index(), "playback stopped");
    }

    /// Change speed. 0 pauses; a positive speed from paused plays.
    ///
    /// While stopped the speed is remembered for the next restart.
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(PlaybackError::InvalidSpeed(speed).into());
        }
        self.events.emit(PlayerEvent::Speed { value: speed });
        tracing::debug!(speed, "speed change");

        if speed == 0.0 {
            self.pause();
            return Ok(());
        }
        self.resume_speed = speed;

        match self.player_state {
            PlayerState::Stopped => return Ok(()),
            PlayerState::Idle | PlayerState::Paused => return self.play(),
            PlayerState::Playing => {}
        }

        let now = Instant::now();
        let value = self.state.target_at(now);
        self.state.speed = speed;
        self.state.anchor(now, value);
        self.facade.set_speed(speed);

        let elapsed = self.segment_elapsed();
        self.audio.play_audio(elapsed, speed);
        self.progress.set_progress_animation(
            self.state.frame_index,
            self.timeline.len(),
            self.timeline.interval_ms(),
            speed,
        );
        Ok(())
    }

    /// Reload segment 0 and play from the beginning.
    pub async fn restart(&mut self) -> Result<()> {
        self.stop_ticks();
        self.cancel_fetch();

        let first = load_first(self.source.as_ref()).await?;

        self.subtitles.reset(&mut *self.subtitle_widget);
        self.view.reset_to(first);
        self.timeline = build_timeline(
            &self.view,
            &self.facade.snapshot(),
            self.config.playback.frame_interval_ms,
        );
        self.state = PlaybackState::at_start(&self.timeline);
        self.source_exhausted = false;
        self.stall = StallTracker::default();

        self.facade.advance_segment(0);
        self.renderer.reset_view(0, self.view.segment());
        self.reload_segment_media();
        self.progress.reset_thumb();

        tracing::info!(frames = self.timeline.len(), "restarting from segment 0");
        self.player_state = PlayerState::Paused;
        self.play()
    }

    /// Apply a record pushed by a live session.
    ///
    /// Records pushed while not playing are held and applied, in arrival
    /// order, by the next `play()`. During a handoff grace period they wait
    /// for the view reset.
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        if !self.view.is_live() {
            return Err(PlaybackError::NotLive.into());
        }
        self.view.push(record);
        if self.player_state == PlayerState::Playing && !self.view.reset_pending() {
            self.flush_live();
        } else {
            tracing::debug!(
                held = self.view.records().len().saturating_sub(self.state.record_index),
                state = ?self.player_state,
                "holding pushed record until playback resumes"
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance playback to `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.player_state != PlayerState::Playing || self.timeline.is_empty() {
            return;
        }
        let last_frame = self.timeline.last_index();
        if self.state.frame_index >= last_frame && !self.segments_remaining() {
            self.finish();
            return;
        }

        if self.view.reset_due(now) {
            self.fire_view_reset();
        }
        self.poll_fetch(now);

        let hold_at =
            (!self.source_exhausted).then(|| self.view.adjusted_end(self.state.view_diff_ms));
        let step = advance_frames(&mut self.state, &self.timeline, now, hold_at);
        let waiting_at_end = self.state.frame_index >= last_frame && self.fetch.is_some();
        self.track_stall(step.held || waiting_at_end, now);

        for frame_index in step.from..step.to {
            self.events.emit(PlayerEvent::Progress {
                frame_index,
                last_frame,
            });
        }
        if step.crossed() > 0 {
            self.progress.update_timer(
                self.state.frame_index,
                self.timeline.interval_ms(),
                self.state.view_diff_ms,
            );
            if !self.view.reset_pending() {
                self.dispatch_current();
            }
        }

        self.request_next_segment(now);
        self.check_drift(now);

        let elapsed = self.segment_elapsed();
        self.subtitles.update(elapsed, &mut *self.subtitle_widget);

        if self.state.frame_index >= last_frame && !self.segments_remaining() {
            self.finish();
        }
    }

    /// Drive playback from a control channel until it stops.
    ///
    /// The initial control value is applied first. Returns when playback
    /// stops (explicitly or by reaching the end) or the control sender is
    /// dropped, which also stops playback. In a live session, closing the
    /// attached feed ends the session the same way.
    pub async fn run(&mut self, mut control_rx: watch::Receiver<PlayerControl>) -> Result<()> {
        let mut facade_rx = self.facade.subscribe();
        let mut facade_open = true;

        let initial = *control_rx.borrow_and_update();
        self.handle_control(initial).await?;

        loop {
            if self.player_state == PlayerState::Stopped {
                return Ok(());
            }

            tokio::select! {
                changed = control_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("control channel closed");
                        self.stop();
                        return Ok(());
                    }
                    let control = *control_rx.borrow_and_update();
                    self.handle_control(control).await?;
                }
                changed = facade_rx.changed(), if facade_open => {
                    if changed.is_err() {
                        facade_open = false;
                        continue;
                    }
                    let speed = facade_rx.borrow_and_update().speed;
                    self.follow_facade_speed(speed);
                }
                record = next_live_record(&mut self.live_feed), if self.live_feed.is_some() => {
                    match record {
                        Some(record) => {
                            if let Err(err) = self.push_record(record) {
                                tracing::warn!(error = %err, "dropping pushed record");
                            }
                        }
                        None => {
                            self.live_feed = None;
                            if self.view.is_live() {
                                tracing::info!("live feed closed; ending session");
                                self.stop();
                            }
                        }
                    }
                }
                now = self.ticks.next_tick(), if self.tick_handle.is_some() => {
                    self.tick(now);
                }
            }
        }
    }

    async fn handle_control(&mut self, control: PlayerControl) -> Result<()> {
        tracing::debug!(?control, "control signal");
        match control {
            PlayerControl::Play => self.play()?,
            PlayerControl::Pause => self.pause(),
            PlayerControl::Stop => self.stop(),
            PlayerControl::Restart => self.restart().await?,
            PlayerControl::SetSpeed(speed) => self.set_speed(speed)?,
        }
        Ok(())
    }

    fn follow_facade_speed(&mut self, speed: f64) {
        if (speed - self.state.speed).abs() <= f64::EPSILON {
            return;
        }
        if let Err(err) = self.set_speed(speed) {
            tracing::warn!(error = %err, "ignoring facade speed change");
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn start_ticks(&mut self) {
        self.stop_ticks();
        self.tick_handle = Some(self.ticks.start(self.config.playback.tick_period()));
    }

    fn stop_ticks(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.ticks.stop(handle);
        }
    }

    fn finish(&mut self) {
        self.fire_view_reset();
        let boundary = self.timeline.end();
        dispatch_due(
            self.view.records(),
            &mut self.state,
            boundary,
            &mut *self.renderer,
        );
        let flushed = flush_remaining(self.view.records(), &mut self.state, &mut *self.renderer);
        if flushed > 0 {
            tracing::warn!(
                view_index = self.view.index(),
                flushed,
                boundary,
                "records past the timeline end applied at finish"
            );
        }
        tracing::info!(
            frame_index = self.state.frame_index,
            view_index = self.view.index(),
            "reached end of timeline"
        );
        self.stop();
    }

    /// The facade lists segments after the active one that have not been played.
    fn segments_remaining(&self) -> bool {
        !self.source_exhausted && self.facade.snapshot().segments.len() > self.view.index() + 1
    }

    fn draw_heatmap_once(&mut self) {
        if self.heat_drawn {
            return;
        }
        self.heat_drawn = true;
        let snapshot = self.facade.snapshot();
        let points = heat_points(
            &snapshot.segments,
            snapshot.progress.duration,
            self.config.playback.heat_buckets,
        );
        self.progress.draw_heat_points(&points);
    }

    fn dispatch_current(&mut self) {
        let boundary = self
            .timeline
            .get(self.state.frame_index)
            .unwrap_or_else(|| self.timeline.start());
        let applied = dispatch_due(
            self.view.records(),
            &mut self.state,
            boundary,
            &mut *self.renderer,
        );
        if applied > 0 {
            tracing::trace!(
                frame_index = self.state.frame_index,
                record_index = self.state.record_index,
                applied,
                "dispatched records"
            );
        }
    }

    /// Fire a pending view reset, then catch the new segment up.
    fn fire_view_reset(&mut self) {
        if self.view.take_reset() {
            self.renderer.reset_view(self.view.index(), self.view.segment());
            tracing::debug!(view_index = self.view.index(), "view reset");
            if self.view.is_live() {
                self.flush_live();
            } else {
                self.dispatch_current();
            }
        }
    }

    /// Apply every live record that has arrived but not been applied.
    fn flush_live(&mut self) -> usize {
        flush_remaining(self.view.records(), &mut self.state, &mut *self.renderer)
    }

    fn reload_segment_media(&mut self) {
        let asset = self.view.segment().audio.as_ref();
        self.audio.load(asset);
        self.subtitles.reset(&mut *self.subtitle_widget);
        self.subtitles = SubtitleTrack::from_cues(cues_of(self.view.segment()));
    }

    /// Seconds since the active segment started, on the continuous timeline.
    fn segment_elapsed(&self) -> f64 {
        let start = self.timeline.start();
        let offset = self.view.segment_offset_ms(self.state.view_diff_ms, start);
        let segment_start = start.saturating_add(offset) as f64;
        ((self.state.target - segment_start) / 1000.0).max(0.0)
    }

    fn request_next_segment(&mut self, now: Instant) {
        if self.source_exhausted || self.fetch.is_some() || self.view.is_live() {
            return;
        }
        // Past the last boundary only segments the facade still lists are fetched.
        let due = match self.timeline.get(self.state.frame_index + 1) {
            Some(next) => next > self.view.adjusted_end(self.state.view_diff_ms),
            None => self.segments_remaining(),
        };
        if !due {
            return;
        }

        let index = self.view.index() + 1;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                view_index = index,
                "no async runtime to fetch the next segment; finishing current timeline"
            );
            self.source_exhausted = true;
            return;
        };

        let (tx, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let task = runtime.spawn(async move {
            let _ = tx.send(source.load_segment(index).await);
        });
        tracing::debug!(view_index = index, "requesting next segment");
        self.fetch = Some(PendingFetch {
            index,
            rx,
            task,
            requested_at: now,
        });
    }

    fn poll_fetch(&mut self, now: Instant) {
        let outcome = {
            let Some(pending) = self.fetch.as_mut() else {
                return;
            };
            match pending.rx.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::error::TryRecvError::Empty) => return,
                Err(oneshot::error::TryRecvError::Closed) => Err(Error::Runtime(
                    "segment fetch ended without a result".to_string(),
                )),
            }
        };
        let Some(pending) = self.fetch.take() else {
            return;
        };
        let waited_ms = now.saturating_duration_since(pending.requested_at).as_millis() as u64;

        match outcome {
            Ok(Some(segment)) => self.handoff(pending.index, segment, now),
            Ok(None) => {
                self.source_exhausted = true;
                tracing::info!(
                    view_index = pending.index,
                    waited_ms,
                    "no further segments; finishing current timeline"
                );
            }
            Err(err) => {
                self.source_exhausted = true;
                tracing::warn!(
                    view_index = pending.index,
                    error = %err,
                    "segment fetch failed; finishing current timeline"
                );
            }
        }
    }

    fn handoff(&mut self, index: usize, segment: Segment, now: Instant) {
        let _span = crate::playback_span!("handoff", view_index = index).entered();

        // The outgoing view must be settled before it is replaced.
        self.fire_view_reset();
        let flushed = flush_remaining(self.view.records(), &mut self.state, &mut *self.renderer);

        let gap = self.view.switch_next_view(
            segment,
            &mut self.state,
            now,
            self.config.playback.switch_grace(),
        );
        self.facade.advance_segment(self.view.index());
        self.reload_segment_media();

        if self.stall.reported {
            tracing::info!(view_index = index, "stalled segment arrived; resuming");
        }
        self.stall = StallTracker::default();

        if self.state.speed > 0.0 {
            let elapsed = self.segment_elapsed();
            self.audio.play_audio(elapsed, self.state.speed);
        }

        tracing::info!(
            view_index = self.view.index(),
            gap_ms = gap,
            view_diff_ms = self.state.view_diff_ms,
            flushed,
            "switched to next segment"
        );
    }

    fn track_stall(&mut self, held: bool, now: Instant) {
        if !held || self.fetch.is_none() {
            self.stall = StallTracker::default();
            return;
        }
        let since = *self.stall.since.get_or_insert(now);
        let waited = now.saturating_duration_since(since);
        if !self.stall.reported
            && waited >= Duration::from_millis(self.config.playback.stall_report_ms)
        {
            self.stall.reported = true;
            let view_index = self.view.index() + 1;
            tracing::warn!(
                view_index,
                waited_ms = waited.as_millis() as u64,
                "playback stalled waiting for next segment"
            );
            self.events.emit(PlayerEvent::Stalled { view_index });
        }
    }

    fn check_drift(&mut self, now: Instant) {
        if !self.audio.has_audio() || self.state.speed <= 0.0 || self.state.speed > 1.0 {
            return;
        }
        let Some(started) = self.play_started else {
            return;
        };
        let window = now.saturating_duration_since(started).as_millis() as u64
            / self.config.audio.drift_check_ms.max(1);
        if self.drift_window == Some(window) {
            return;
        }
        self.drift_window = Some(window);

        let elapsed = self.segment_elapsed();
        if let Some(drift_ms) = self.audio.correct_drift(elapsed) {
            tracing::info!(
                view_index = self.view.index(),
                drift_ms,
                elapsed_secs = elapsed,
                "audio drift corrected"
            );
        }
    }

    fn cancel_fetch(&mut self) {
        if let Some(pending) = self.fetch.take() {
            pending.task.abort();
            tracing::debug!(view_index = pending.index, "cancelled segment fetch");
        }
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        if let Some(pending) = self.fetch.take() {
            pending.task.abort();
        }
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("player_state", &self.player_state)
            .field("state", &self.state)
            .field("view_index", &self.view.index())
            .field("frames", &self.timeline.len())
            .field("fetching", &self.fetch.is_some())
            .finish_non_exhaustive()
    }
}

/// Frame timeline for the active view.
///
/// Recorded sessions span the facade's continuous progress range; when the
/// facade knows no range the active segment's own bounds are used.
fn build_timeline(view: &ViewState, replay: &ReplayState, interval_ms: u64) -> FrameTimeline {
    if view.is_live() {
        return FrameTimeline::live(interval_ms);
    }
    let progress = replay.progress;
    if progress.end_time > progress.start_time {
        return FrameTimeline::build(progress.start_time, progress.end_time, interval_ms);
    }
    let segment = view.segment();
    let start = segment.start_time().unwrap_or(0);
    let end = segment.end_time().unwrap_or(start);
    FrameTimeline::build(start, end, interval_ms)
}

async fn load_first(source: &dyn SegmentSource) -> Result<Segment> {
    source
        .load_segment(0)
        .await
        .map_err(|err| PlaybackError::SegmentLoad {
            index: 0,
            message: err.to_string(),
        })?
        .ok_or_else(|| PlaybackError::NoSegments.into())
}

fn cues_of(segment: &Segment) -> &[crate::record::SubtitleCue] {
    segment
        .audio
        .as_ref()
        .map_or(&[][..], |audio| audio.subtitles.as_slice())
}

async fn next_live_record(feed: &mut Option<mpsc::UnboundedReceiver<Record>>) -> Option<Record> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
