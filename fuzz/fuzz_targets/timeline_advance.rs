#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use reelplay_core::collaborators::CollectorRenderer;
use reelplay_core::dispatch::dispatch_due;
use reelplay_core::orderer::order_records;
use reelplay_core::record::{Record, RecordKind};
use reelplay_core::state::{PlaybackState, advance_frames};
use reelplay_core::timeline::FrameTimeline;
use tokio::time::Instant;

fn read_u16(data: &[u8], at: usize) -> u64 {
    let lo = data.get(at).copied().unwrap_or(0);
    let hi = data.get(at + 1).copied().unwrap_or(0);
    u64::from(u16::from_le_bytes([lo, hi]))
}

fn kind_for(tag: u8) -> RecordKind {
    match tag % 4 {
        0 => RecordKind::Dom,
        1 => RecordKind::Font,
        2 => RecordKind::Mouse,
        _ => RecordKind::Scroll,
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let start = read_u16(data, 0) * 16;
    let span = read_u16(data, 2);
    let interval = (read_u16(data, 4) % 2_000).max(1);
    let speed = f64::from(data[6] % 32) / 4.0;
    let hold_at = (data[7] & 1 == 1).then(|| start + span / 2);

    let timeline = FrameTimeline::build(start, start + span, interval);
    assert_eq!(timeline.frames().last().copied(), Some(start + span));

    let body = &data[8..];
    let mut time = start;
    let records: Vec<Record> = body
        .chunks(2)
        .take(64)
        .map(|pair| {
            time += u64::from(pair.get(1).copied().unwrap_or(0)) * 8;
            Record::new(kind_for(pair[0]), time.min(start + span))
        })
        .collect();
    let records = order_records(records);

    let collector = CollectorRenderer::new();
    let mut renderer = collector.clone();

    let origin = Instant::now();
    let mut state = PlaybackState::at_start(&timeline);
    state.speed = speed;
    state.anchor(origin, start as f64);

    let mut now = origin;
    let mut previous = state.frame_index;
    for &delta in body.iter().take(256) {
        now += Duration::from_millis(u64::from(delta));
        let step = advance_frames(&mut state, &timeline, now, hold_at);

        assert_eq!(step.from, previous);
        assert!(step.to >= step.from);
        assert!(state.frame_index <= timeline.last_index());
        if let Some(limit) = hold_at {
            assert!(timeline.get(state.frame_index).unwrap_or(0) <= limit.max(start));
        }

        let boundary = timeline.get(state.frame_index).unwrap_or(start);
        let before = state.record_index;
        dispatch_due(&records, &mut state, boundary, &mut renderer);
        assert!(state.record_index >= before);
        assert!(state.record_index <= records.len());
        previous = state.frame_index;
    }

    assert_eq!(collector.applied().len(), state.record_index);
});
