//! Font-first record ordering.
//!
//! Font records are moved up to sit right after the segment's first record so
//! font resources are requested before any record that renders styled content.

use crate::record::{Record, RecordKind};

/// Relocate every FONT record to immediately follow the first record.
///
/// Relocated records keep their relative order and receive synthetic times
/// `start + 1, start + 2, ...` where `start` is the first record's time.
/// Non-FONT records keep their original times and relative order.
#[must_use]
pub fn order_records(mut records: Vec<Record>) -> Vec<Record> {
    if records.len() < 2 {
        return records;
    }

    let start = records[0].time;
    let rest = records.split_off(1);
    let (mut fonts, others): (Vec<Record>, Vec<Record>) = rest
        .into_iter()
        .partition(|record| record.kind == RecordKind::Font);

    for (offset, font) in (1u64..).zip(fonts.iter_mut()) {
        font.time = start.saturating_add(offset);
    }

    records.reserve(fonts.len() + others.len());
    records.extend(fonts);
    records.extend(others);
    records
}

/// First and last record times `records` will have once ordered, without
/// reordering them.
#[must_use]
pub fn ordered_bounds(records: &[Record]) -> Option<(u64, u64)> {
    let (first, rest) = records.split_first()?;
    let fonts = rest
        .iter()
        .filter(|record| record.kind == RecordKind::Font)
        .count() as u64;
    let last = rest
        .iter()
        .rev()
        .find(|record| record.kind != RecordKind::Font)
        .map_or_else(|| first.time.saturating_add(fonts), |record| record.time);
    Some((first.time, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(kind: RecordKind, time: u64) -> Record {
        Record::new(kind, time)
    }

    #[test]
    fn fonts_follow_first_record() {
        let ordered = order_records(vec![
            rec(RecordKind::Snapshot, 1000),
            rec(RecordKind::Dom, 1200),
            rec(RecordKind::Font, 1500),
            rec(RecordKind::Mouse, 1600),
            rec(RecordKind::Font, 1900),
        ]);

        let kinds: Vec<_> = ordered.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Snapshot,
                RecordKind::Font,
                RecordKind::Font,
                RecordKind::Dom,
                RecordKind::Mouse,
            ]
        );
        let times: Vec<_> = ordered.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![1000, 1001, 1002, 1200, 1600]);
    }

    #[test]
    fn font_relative_order_is_preserved() {
        let ordered = order_records(vec![
            rec(RecordKind::Snapshot, 0),
            rec(RecordKind::Font, 50).with_data(serde_json::json!("a")),
            rec(RecordKind::Dom, 60),
            rec(RecordKind::Font, 70).with_data(serde_json::json!("b")),
        ]);
        assert_eq!(ordered[1].data, serde_json::json!("a"));
        assert_eq!(ordered[2].data, serde_json::json!("b"));
    }

    #[test]
    fn leading_font_stays_in_place() {
        let ordered = order_records(vec![
            rec(RecordKind::Font, 10),
            rec(RecordKind::Dom, 20),
            rec(RecordKind::Font, 30),
        ]);
        let times: Vec<_> = ordered.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![10, 11, 20]);
    }

    #[test]
    fn bounds_match_the_ordered_records() {
        let cases = vec![
            vec![rec(RecordKind::Dom, 0), rec(RecordKind::Font, 0), rec(RecordKind::Font, 0)],
            vec![rec(RecordKind::Snapshot, 100), rec(RecordKind::Dom, 300), rec(RecordKind::Font, 900)],
            vec![rec(RecordKind::Font, 7)],
        ];
        for records in cases {
            let ordered = order_records(records.clone());
            let expected = ordered.first().map(|first| first.time).zip(ordered.last().map(|last| last.time));
            assert_eq!(ordered_bounds(&records), expected, "{records:?}");
        }
        assert_eq!(ordered_bounds(&[rec(RecordKind::Dom, 0), rec(RecordKind::Font, 0)]), Some((0, 1)));
        assert_eq!(ordered_bounds(&[]), None);
    }

    #[test]
    fn short_lists_are_untouched() {
        assert!(order_records(Vec::new()).is_empty());
        let single = order_records(vec![rec(RecordKind::Font, 5)]);
        assert_eq!(single[0].time, 5);
    }
}
