//! Discretized frame timeline.
//!
//! The scheduler advances through fixed-interval boundaries rather than raw
//! record times. The literal end time is always appended as the final
//! boundary, so the penultimate and final entries may be equal; consumers
//! treat an equal pair as a single boundary.

use serde::Serialize;

/// Default spacing between frame boundaries.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 250;

/// Ordered frame boundaries over `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameTimeline {
    frames: Vec<u64>,
    interval_ms: u64,
}

impl FrameTimeline {
    /// Build boundaries starting at `start`, stepping by `interval_ms` while
    /// `t < end + interval_ms`, then appending `end` itself.
    #[must_use]
    pub fn build(start: u64, end: u64, interval_ms: u64) -> Self {
        let interval_ms = interval_ms.max(1);
        let end = end.max(start);
        let limit = end.saturating_add(interval_ms);

        let mut frames = Vec::with_capacity(((end - start) / interval_ms) as usize + 3);
        let mut t = start;
        while t < limit {
            frames.push(t);
            t = t.saturating_add(interval_ms);
            if t == u64::MAX {
                break;
            }
        }
        frames.push(end);

        Self {
            frames,
            interval_ms,
        }
    }

    /// Empty timeline for live sessions: nothing advances automatically.
    #[must_use]
    pub fn live(interval_ms: u64) -> Self {
        Self {
            frames: Vec::new(),
            interval_ms: interval_ms.max(1),
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u64> {
        self.frames.get(index).copied()
    }

    /// Index of the final boundary.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.frames.first().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.frames.last().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    #[must_use]
    pub fn frames(&self) -> &[u64] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_is_duplicated_when_aligned() {
        let timeline = FrameTimeline::build(0, 1000, 250);
        assert_eq!(timeline.frames(), &[0, 250, 500, 750, 1000, 1000]);
        assert_eq!(timeline.last_index(), 5);
    }

    #[test]
    fn unaligned_end_is_appended() {
        let timeline = FrameTimeline::build(100, 700, 250);
        assert_eq!(timeline.frames(), &[100, 350, 600, 850, 700]);
        assert_eq!(timeline.end(), 700);
    }

    #[test]
    fn zero_length_range() {
        let timeline = FrameTimeline::build(500, 500, 250);
        assert_eq!(timeline.frames(), &[500, 500]);
    }

    #[test]
    fn inverted_range_collapses_to_start() {
        let timeline = FrameTimeline::build(900, 100, 250);
        assert_eq!(timeline.frames(), &[900, 900]);
    }

    #[test]
    fn live_timeline_is_empty() {
        let timeline = FrameTimeline::live(250);
        assert!(timeline.is_live());
        assert_eq!(timeline.len(), 0);
        assert_eq!(timeline.get(0), None);
    }
}
