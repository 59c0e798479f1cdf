//! Record dispatch against the frame timeline.

use crate::collaborators::Renderer;
use crate::record::Record;
use crate::state::PlaybackState;

/// Apply every undispatched record whose adjusted time has reached
/// `boundary`, in stored order. Returns how many were applied.
///
/// The adjusted time of a record is its capture time minus the accumulated
/// inter-segment gap.
pub fn dispatch_due(
    records: &[Record],
    state: &mut PlaybackState,
    boundary: u64,
    renderer: &mut dyn Renderer,
) -> usize {
    let start = state.record_index;
    while let Some(record) = records.get(state.record_index) {
        if record.time.saturating_sub(state.view_diff_ms) > boundary {
            break;
        }
        renderer.apply(record);
        state.record_index += 1;
    }
    state.record_index - start
}

/// Apply everything left in `records`.
pub fn flush_remaining(
    records: &[Record],
    state: &mut PlaybackState,
    renderer: &mut dyn Renderer,
) -> usize {
    let start = state.record_index;
    for record in records.iter().skip(state.record_index) {
        renderer.apply(record);
    }
    state.record_index = state.record_index.max(records.len());
    state.record_index - start
}
