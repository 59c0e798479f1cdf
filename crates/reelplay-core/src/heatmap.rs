//! Record density across the recording, for the progress bar.

use crate::record::Segment;

/// Bucket count spread across the whole recording duration.
pub const DEFAULT_HEAT_BUCKETS: usize = 200;

/// Per-bucket record counts for every segment, concatenated in segment order.
///
/// The bucket width is `duration_ms / buckets`. Each segment is bucketed
/// independently from its own first record time.
#[must_use]
pub fn heat_points(segments: &[Segment], duration_ms: u64, buckets: usize) -> Vec<u32> {
    let width = bucket_width(duration_ms, buckets);
    segments
        .iter()
        .flat_map(|segment| segment_heat_points(segment, width))
        .collect()
}

/// Width in milliseconds of one bucket.
#[must_use]
pub fn bucket_width(duration_ms: u64, buckets: usize) -> f64 {
    if buckets == 0 {
        return 0.0;
    }
    duration_ms as f64 / buckets as f64
}

/// Counts for a single segment. The counts always sum to the record count.
#[must_use]
pub fn segment_heat_points(segment: &Segment, width: f64) -> Vec<u32> {
    let Some(start) = segment.start_time() else {
        return Vec::new();
    };
    if !width.is_finite() || width <= 0.0 {
        let total = u32::try_from(segment.records.len()).unwrap_or(u32::MAX);
        return vec![total];
    }

    let mut counts = Vec::new();
    let mut bucket_end = start as f64 + width;
    let mut current = 0u32;

    for record in &segment.records {
        let time = record.time as f64;
        while time >= bucket_end {
            counts.push(current);
            current = 0;
            bucket_end += width;
        }
        current = current.saturating_add(1);
    }
    counts.push(current);
    counts
}
