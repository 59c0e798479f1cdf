//! In-memory recording: segment source and state facade in one.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::collaborators::{ProgressInfo, ReplayState, SegmentSource, StateFacade};
use crate::error::Result;
use crate::orderer::ordered_bounds;
use crate::record::Segment;

/// A whole recording held in memory.
///
/// Progress spans the segments with inter-segment gaps removed, matching the
/// continuous timeline the scheduler plays.
#[derive(Debug)]
pub struct MemoryReplay {
    segments: Arc<[Segment]>,
    state: watch::Sender<ReplayState>,
    fetch_delay: Duration,
}

impl MemoryReplay {
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        let segments: Arc<[Segment]> = segments.into();
        let state = ReplayState {
            speed: 0.0,
            progress: continuous_progress(&segments),
            current_segment: 0,
            segments: Arc::clone(&segments),
        };
        let (tx, _rx) = watch::channel(state);
        Self {
            segments,
            state: tx,
            fetch_delay: Duration::ZERO,
        }
    }

    /// Parse a recording: a JSON array of segments.
    pub fn from_json(text: &str) -> Result<Self> {
        let segments: Vec<Segment> = serde_json::from_str(text)?;
        Ok(Self::new(segments))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Delay every segment fetch, simulating a slow store.
    #[must_use]
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Start, end and duration of `segments` laid end to end.
///
/// Spans are measured on font-first ordered records, matching what the
/// scheduler plays.
#[must_use]
pub fn continuous_progress(segments: &[Segment]) -> ProgressInfo {
    let bounds: Vec<(u64, u64)> = segments
        .iter()
        .filter_map(|segment| ordered_bounds(&segment.records))
        .collect();
    let start_time = bounds.first().map_or(0, |&(start, _)| start);
    let duration = bounds
        .iter()
        .map(|&(start, end)| end.saturating_sub(start))
        .fold(0u64, u64::saturating_add);
    ProgressInfo {
        start_time,
        end_time: start_time.saturating_add(duration),
        duration,
    }
}

#[async_trait]
impl SegmentSource for MemoryReplay {
    async fn load_segment(&self, index: usize) -> Result<Option<Segment>> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        Ok(self.segments.get(index).cloned())
    }
}

impl StateFacade for MemoryReplay {
    fn snapshot(&self) -> ReplayState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<ReplayState> {
        self.state.subscribe()
    }

    fn set_speed(&self, speed: f64) {
        self.state.send_if_modified(|state| {
            let changed = state.speed != speed;
            state.speed = speed;
            changed
        });
    }

    fn advance_segment(&self, index: usize) {
        self.state.send_if_modified(|state| {
            let changed = state.current_segment != index;
            state.current_segment = index;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::record::{Record, RecordKind};

    fn segment(times: &[u64]) -> Segment {
        Segment::new(
            times
                .iter()
                .map(|&t| Record::new(RecordKind::Dom, t))
                .collect(),
        )
    }

    #[test]
    fn progress_removes_gaps() {
        let replay = MemoryReplay::new(vec![segment(&[0, 1000]), segment(&[5000, 5500])]);
        let progress = replay.snapshot().progress;
        assert_eq!(progress.start_time, 0);
        assert_eq!(progress.end_time, 1500);
        assert_eq!(progress.duration, 1500);
    }

    #[test]
    fn progress_measures_font_first_spans() {
        let replay = MemoryReplay::new(vec![
            Segment::new(vec![
                Record::new(RecordKind::Dom, 0),
                Record::new(RecordKind::Font, 0),
                Record::new(RecordKind::Font, 0),
            ]),
            segment(&[100, 200]),
        ]);
        let progress = replay.snapshot().progress;
        assert_eq!(progress.duration, 102);
        assert_eq!(progress.end_time, 102);
    }

    #[test]
    fn parses_recording_json() {
        let replay = MemoryReplay::from_json(
            r#"[{"records": [{"type": "SNAPSHOT", "time": 10}, {"type": "DOM", "time": 20}]}]"#,
        )
        .unwrap();
        assert_eq!(replay.segments().len(), 1);
        assert_eq!(replay.snapshot().progress.start_time, 10);
    }

    #[test]
    fn invalid_json_is_json_error() {
        assert!(matches!(
            MemoryReplay::from_json("{not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn facade_writes_notify_subscribers() {
        let replay = MemoryReplay::new(vec![segment(&[0])]);
        let mut rx = replay.subscribe();
        replay.set_speed(2.0);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().speed, 2.0);

        replay.set_speed(2.0);
        assert!(!rx.has_changed().unwrap());

        replay.advance_segment(1);
        assert_eq!(replay.snapshot().current_segment, 1);
    }

    #[tokio::test]
    async fn source_returns_none_past_end() {
        let replay = MemoryReplay::new(vec![segment(&[0]), segment(&[10])]);
        assert!(replay.load_segment(1).await.unwrap().is_some());
        assert!(replay.load_segment(2).await.unwrap().is_none());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = MemoryReplay::load(Path::new("/no/such/recording.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
