//! Active segment and segment-to-segment handoff.
//!
//! Segments are stitched into one continuous timeline by subtracting the
//! accumulated real-world gap (`view_diff_ms`) from every record time. A
//! handoff replaces the records immediately but defers the renderer's view
//! reset by a grace delay so the outgoing records can finish applying.

use std::time::Duration;

use tokio::time::Instant;

use crate::orderer::order_records;
use crate::record::{Record, Segment};
use crate::state::PlaybackState;

#[derive(Debug, Clone)]
pub struct ViewState {
    index: usize,
    segment: Segment,
    // Fixed when the segment is activated; pushed records do not change it.
    live: bool,
    reset_at: Option<Instant>,
}

impl ViewState {
    /// Activate the first segment.
    #[must_use]
    pub fn new(segment: Segment) -> Self {
        Self {
            index: 0,
            live: segment.is_live(),
            segment: ordered(segment),
            reset_at: None,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.segment.records
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// End of the active segment on the continuous timeline.
    #[must_use]
    pub fn adjusted_end(&self, view_diff_ms: u64) -> u64 {
        self.segment
            .end_time()
            .unwrap_or(0)
            .saturating_sub(view_diff_ms)
    }

    /// Milliseconds from the timeline start to the active segment's start.
    #[must_use]
    pub fn segment_offset_ms(&self, view_diff_ms: u64, timeline_start: u64) -> u64 {
        self.segment
            .start_time()
            .unwrap_or(timeline_start)
            .saturating_sub(view_diff_ms)
            .saturating_sub(timeline_start)
    }

    /// Hand off to `next`, returning the gap added to `view_diff_ms`.
    ///
    /// A next segment that starts before the current one ends contributes no
    /// gap, keeping the accumulated difference monotonic.
    pub fn switch_next_view(
        &mut self,
        next: Segment,
        state: &mut PlaybackState,
        now: Instant,
        grace: Duration,
    ) -> u64 {
        let gap = match (self.segment.end_time(), next.start_time()) {
            (Some(current_end), Some(next_start)) => {
                if next_start < current_end {
                    tracing::warn!(
                        view_index = self.index + 1,
                        current_end,
                        next_start,
                        "next segment starts before the current one ends; gap clamped to zero"
                    );
                }
                next_start.saturating_sub(current_end)
            }
            _ => 0,
        };

        state.view_diff_ms = state.view_diff_ms.saturating_add(gap);
        state.record_index = 0;
        state.view_index = self.index + 1;

        self.index = state.view_index;
        self.live = next.is_live();
        self.segment = ordered(next);
        self.reset_at = Some(now + grace);

        tracing::debug!(
            view_index = self.index,
            gap_ms = gap,
            view_diff_ms = state.view_diff_ms,
            "segment handoff"
        );
        gap
    }

    /// A view reset is scheduled but has not fired.
    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.reset_at.is_some()
    }

    /// The scheduled reset has reached its deadline.
    #[must_use]
    pub fn reset_due(&self, now: Instant) -> bool {
        self.reset_at.is_some_and(|at| now >= at)
    }

    /// Clear the scheduled reset, returning whether one was pending.
    pub fn take_reset(&mut self) -> bool {
        self.reset_at.take().is_some()
    }

    /// Replace the view with a fresh first segment, as for a restart.
    pub fn reset_to(&mut self, segment: Segment) {
        self.index = 0;
        self.live = segment.is_live();
        self.segment = ordered(segment);
        self.reset_at = None;
    }

    /// Append a pushed record in live mode.
    pub fn push(&mut self, record: Record) {
        self.segment.records.push(record);
    }
}

fn ordered(mut segment: Segment) -> Segment {
    segment.records = order_records(std::mem::take(&mut segment.records));
    segment
}
