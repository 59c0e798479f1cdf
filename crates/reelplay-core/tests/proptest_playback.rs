//! Property-based tests for the playback building blocks.
//!
//! Covers frame timeline shape, font-first ordering, heatmap bucket sums,
//! inter-segment gap accumulation, frame convergence under sustained speed
//! and exactly-once delivery across whole multi-segment recordings.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::watch;
use tokio::time::Instant;

use reelplay_core::collaborators::CollectorRenderer;
use reelplay_core::heatmap::{bucket_width, segment_heat_points};
use reelplay_core::orderer::order_records;
use reelplay_core::record::{Record, RecordKind, Segment};
use reelplay_core::state::{PlaybackState, advance_frames};
use reelplay_core::timeline::FrameTimeline;
use reelplay_core::view::ViewState;
use reelplay_core::{
    Collaborators, MemoryReplay, PlaybackScheduler, PlayerControl, PlayerState, ReplayConfig,
};

// =============================================================================
// Strategies
// =============================================================================

fn arb_kind() -> impl Strategy<Value = RecordKind> {
    prop_oneof![
        4 => Just(RecordKind::Dom),
        2 => Just(RecordKind::Mouse),
        2 => Just(RecordKind::Font),
        1 => Just(RecordKind::Scroll),
        1 => Just(RecordKind::Snapshot),
    ]
}

/// Non-decreasing record times starting at `base`.
fn arb_times(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    (0u64..100_000, prop::collection::vec(0u64..2_000, 1..max_len)).prop_map(|(base, deltas)| {
        deltas
            .iter()
            .scan(base, |t, d| {
                *t += d;
                Some(*t)
            })
            .collect()
    })
}

fn arb_segment() -> impl Strategy<Value = Segment> {
    arb_times(40).prop_map(|times| {
        Segment::new(
            times
                .into_iter()
                .map(|t| Record::new(RecordKind::Dom, t))
                .collect(),
        )
    })
}

fn arb_mixed_segment() -> impl Strategy<Value = Segment> {
    (arb_times(20), prop::collection::vec(arb_kind(), 20)).prop_map(|(times, kinds)| {
        Segment::new(
            times
                .into_iter()
                .zip(kinds)
                .map(|(time, kind)| Record::new(kind, time))
                .collect(),
        )
    })
}

/// Play `segments` to completion on a paused clock, returning the applied
/// record times and the final state.
fn play_to_completion(segments: Vec<Segment>, speed: f64) -> (Vec<u64>, PlayerState) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();
    runtime.block_on(async move {
        let replay = Arc::new(MemoryReplay::new(segments));
        let renderer = CollectorRenderer::new();
        let mut scheduler = PlaybackScheduler::load(
            ReplayConfig::default(),
            replay.clone(),
            replay,
            Collaborators::new(renderer.clone()),
        )
        .await
        .unwrap();
        let (_control, control_rx) = watch::channel(PlayerControl::SetSpeed(speed));
        scheduler.run(control_rx).await.unwrap();
        (renderer.applied_times(), scheduler.player_state())
    })
}

// =============================================================================
// Frame timeline
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn timeline_is_increasing_and_ends_at_end(
        start in 0u64..1_000_000,
        span in 0u64..50_000,
        interval in 1u64..2_000,
    ) {
        let end = start + span;
        let timeline = FrameTimeline::build(start, end, interval);
        let frames = timeline.frames();

        prop_assert!(frames.len() >= 2);
        prop_assert_eq!(frames[0], start);
        prop_assert_eq!(*frames.last().unwrap(), end);

        let body = &frames[..frames.len() - 1];
        for pair in body.windows(2) {
            prop_assert!(pair[0] < pair[1], "not strictly increasing: {:?}", pair);
            prop_assert_eq!(pair[1] - pair[0], interval);
        }
        // The stepped body covers the end.
        prop_assert!(*body.last().unwrap() >= end);
    }
}

// =============================================================================
// Font-first ordering
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fonts_move_behind_first_record(
        times in arb_times(30),
        kinds in prop::collection::vec(arb_kind(), 30),
    ) {
        let records: Vec<Record> = times
            .iter()
            .zip(kinds.iter().cycle())
            .enumerate()
            .map(|(i, (&t, &k))| Record::new(k, t).with_data(serde_json::json!(i)))
            .collect();
        let ordered = order_records(records.clone());

        prop_assert_eq!(ordered.len(), records.len());
        prop_assert_eq!(&ordered[0], &records[0]);

        let font_count = records[1..].iter().filter(|r| r.kind == RecordKind::Font).count();
        for record in &ordered[1..=font_count] {
            prop_assert_eq!(record.kind, RecordKind::Font);
        }
        for record in &ordered[font_count + 1..] {
            prop_assert_ne!(record.kind, RecordKind::Font);
        }

        // Fonts keep relative order and get start+1, start+2, ...
        let original_fonts: Vec<_> = records[1..]
            .iter()
            .filter(|r| r.kind == RecordKind::Font)
            .map(|r| r.data.clone())
            .collect();
        let moved_fonts: Vec<_> = ordered[1..=font_count].iter().map(|r| r.data.clone()).collect();
        prop_assert_eq!(original_fonts, moved_fonts);
        for (i, record) in ordered[1..=font_count].iter().enumerate() {
            prop_assert_eq!(record.time, records[0].time + i as u64 + 1);
        }

        // Non-font records are untouched, including their times.
        let original_rest: Vec<_> = records[1..]
            .iter()
            .filter(|r| r.kind != RecordKind::Font)
            .cloned()
            .collect();
        prop_assert_eq!(&ordered[font_count + 1..], original_rest.as_slice());
    }
}

// =============================================================================
// Heatmap
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn heat_buckets_sum_to_record_count(
        segment in arb_segment(),
        duration in 0u64..200_000,
        buckets in 1usize..400,
    ) {
        let points = segment_heat_points(&segment, bucket_width(duration, buckets));
        let total: u64 = points.iter().map(|&c| u64::from(c)).sum();
        prop_assert_eq!(total as usize, segment.records.len());
    }
}

// =============================================================================
// Segment switching
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn view_diff_never_decreases(segments in prop::collection::vec(arb_segment(), 2..8)) {
        let mut view = ViewState::new(segments[0].clone());
        let mut state = PlaybackState::default();
        let now = Instant::now();

        let mut expected = 0u64;
        let mut previous_end = segments[0].end_time().unwrap();
        for next in &segments[1..] {
            let before = state.view_diff_ms;
            let gap = view.switch_next_view(next.clone(), &mut state, now, Duration::ZERO);
            prop_assert!(state.view_diff_ms >= before);
            prop_assert_eq!(state.view_diff_ms - before, gap);
            prop_assert_eq!(state.record_index, 0);

            expected += next.start_time().unwrap().saturating_sub(previous_end);
            previous_end = next.end_time().unwrap();
        }
        prop_assert_eq!(state.view_diff_ms, expected);
        prop_assert_eq!(state.view_index, segments.len() - 1);
    }
}

// =============================================================================
// Frame convergence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn frame_index_tracks_speed_times_wall_time(
        start in 0u64..100_000,
        span in 1u64..20_000,
        interval in 50u64..1_000,
        speed_quarters in 1u32..32,
        wall_ms in 0u64..20_000,
    ) {
        let timeline = FrameTimeline::build(start, start + span, interval);
        let speed = f64::from(speed_quarters) / 4.0;
        let now = Instant::now();

        let mut state = PlaybackState::at_start(&timeline);
        state.speed = speed;
        state.anchor(now, start as f64);

        advance_frames(&mut state, &timeline, now + Duration::from_millis(wall_ms), None);

        let reached = timeline.get(state.frame_index).unwrap() as f64;
        prop_assert!(reached <= state.target + 1e-6);
        if let Some(next) = timeline.get(state.frame_index + 1) {
            prop_assert!(next as f64 > state.target);
            prop_assert!(state.target - reached < interval as f64 + 1e-6);
        }
    }

    #[test]
    fn split_ticks_match_single_tick(
        span in 1u64..10_000,
        interval in 50u64..500,
        ticks in prop::collection::vec(1u64..200, 1..60),
    ) {
        let timeline = FrameTimeline::build(0, span, interval);
        let now = Instant::now();

        let mut stepped = PlaybackState::at_start(&timeline);
        stepped.speed = 1.0;
        stepped.anchor(now, 0.0);
        let mut at = now;
        let mut crossed = 0;
        for delta in &ticks {
            at += Duration::from_millis(*delta);
            crossed += advance_frames(&mut stepped, &timeline, at, None).crossed();
        }

        let mut single = PlaybackState::at_start(&timeline);
        single.speed = 1.0;
        single.anchor(now, 0.0);
        advance_frames(&mut single, &timeline, at, None);

        prop_assert_eq!(stepped.frame_index, single.frame_index);
        prop_assert_eq!(crossed, single.frame_index);
    }
}

// =============================================================================
// Whole playback
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_record_is_applied_once_in_order(
        segments in prop::collection::vec(arb_mixed_segment(), 1..5),
        speed_steps in 4u32..17,
    ) {
        let expected: Vec<u64> = segments
            .iter()
            .flat_map(|segment| order_records(segment.records.clone()))
            .map(|record| record.time)
            .collect();

        let (applied, state) = play_to_completion(segments, f64::from(speed_steps) / 2.0);

        prop_assert_eq!(state, PlayerState::Stopped);
        prop_assert_eq!(applied, expected);
    }
}
