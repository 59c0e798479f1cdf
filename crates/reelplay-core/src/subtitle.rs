//! Subtitle cue tracking.
//!
//! Exactly one cue is active at a time and the cursor only moves forward.

use crate::collaborators::SubtitleWidget;
use crate::record::SubtitleCue;

/// Parse a cue timestamp into seconds.
///
/// Accepts `HH:MM:SS,mmm`, `HH:MM:SS.mmm`, `MM:SS` and plain seconds
/// (`12` or `12.5`).
#[must_use]
pub fn parse_cue_time(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }

    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let (whole, last) = parts.split_at(parts.len() - 1);
    let seconds: f64 = last[0].parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let mut total = 0u64;
    for part in whole {
        let value: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total as f64 * 60.0 + seconds)
}

/// A parsed cue in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CueWindow {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CueWindow {
    fn parse(cue: &SubtitleCue) -> Option<Self> {
        let start = parse_cue_time(&cue.start)?;
        let end = parse_cue_time(&cue.end)?;
        (end >= start).then(|| Self {
            start,
            end,
            text: cue.text.clone(),
        })
    }
}

/// Cursor over a segment's subtitle cues.
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    cues: Vec<CueWindow>,
    index: usize,
    showing: bool,
}

impl SubtitleTrack {
    /// Parse cues, skipping malformed ones.
    #[must_use]
    pub fn from_cues(cues: &[SubtitleCue]) -> Self {
        let parsed = cues
            .iter()
            .filter_map(|cue| {
                let window = CueWindow::parse(cue);
                if window.is_none() {
                    tracing::warn!(
                        start = %cue.start,
                        end = %cue.end,
                        "skipping malformed subtitle cue"
                    );
                }
                window
            })
            .collect();
        Self {
            cues: parsed,
            index: 0,
            showing: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Index of the cue currently tracked.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn cues(&self) -> &[CueWindow] {
        &self.cues
    }

    /// Bring the widget in line with `elapsed` seconds.
    pub fn update(&mut self, elapsed: f64, widget: &mut dyn SubtitleWidget) {
        while let Some(cue) = self.cues.get(self.index) {
            if elapsed >= cue.end {
                if self.showing {
                    widget.clean_text();
                    self.showing = false;
                }
                self.index += 1;
                continue;
            }
            if elapsed >= cue.start && !self.showing {
                widget.update_text(&cue.text);
                self.showing = true;
            }
            return;
        }
    }

    /// Rewind to the first cue, clearing any displayed text.
    pub fn reset(&mut self, widget: &mut dyn SubtitleWidget) {
        if self.showing {
            widget.clean_text();
        }
        self.index = 0;
        self.showing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollectorSubtitles;

    fn cue(start: &str, end: &str, text: &str) -> SubtitleCue {
        SubtitleCue {
            start: start.into(),
            end: end.into(),
            text: text.into(),
        }
    }

    #[test]
    fn parses_cue_formats() {
        assert_eq!(parse_cue_time("00:00:01,500"), Some(1.5));
        assert_eq!(parse_cue_time("01:02:03.250"), Some(3723.25));
        assert_eq!(parse_cue_time("02:05"), Some(125.0));
        assert_eq!(parse_cue_time("7"), Some(7.0));
        assert_eq!(parse_cue_time(" 7.25 "), Some(7.25));
    }

    #[test]
    fn rejects_malformed_cue_times() {
        assert_eq!(parse_cue_time(""), None);
        assert_eq!(parse_cue_time("abc"), None);
        assert_eq!(parse_cue_time("1:2:3:4"), None);
        assert_eq!(parse_cue_time("-3"), None);
        assert_eq!(parse_cue_time("aa:10"), None);
    }

    #[test]
    fn malformed_cues_are_skipped() {
        let track = SubtitleTrack::from_cues(&[
            cue("0", "1", "ok"),
            cue("x", "2", "bad"),
            cue("5", "4", "backwards"),
        ]);
        assert_eq!(track.cues().len(), 1);
    }

    #[test]
    fn shows_and_clears_in_order() {
        let widget = CollectorSubtitles::new();
        let mut sink = widget.clone();
        let mut track =
            SubtitleTrack::from_cues(&[cue("1", "2", "first"), cue("3", "4", "second")]);

        track.update(0.5, &mut sink);
        assert!(widget.shown().is_empty());

        track.update(1.2, &mut sink);
        track.update(1.4, &mut sink);
        assert_eq!(widget.shown(), vec!["first".to_string()]);
        assert_eq!(widget.current(), Some("first".to_string()));

        track.update(2.5, &mut sink);
        assert_eq!(widget.current(), None);
        assert_eq!(track.active_index(), 1);

        track.update(3.0, &mut sink);
        assert_eq!(widget.current(), Some("second".to_string()));
    }

    #[test]
    fn never_regresses() {
        let widget = CollectorSubtitles::new();
        let mut sink = widget.clone();
        let mut track =
            SubtitleTrack::from_cues(&[cue("1", "2", "first"), cue("3", "4", "second")]);

        track.update(3.5, &mut sink);
        assert_eq!(track.active_index(), 1);
        track.update(1.5, &mut sink);
        assert_eq!(track.active_index(), 1);
        assert_eq!(widget.shown(), vec!["second".to_string()]);
    }

    #[test]
    fn jump_past_all_cues_clears_text() {
        let widget = CollectorSubtitles::new();
        let mut sink = widget.clone();
        let mut track = SubtitleTrack::from_cues(&[cue("0", "1", "a"), cue("1", "2", "b")]);
        track.update(0.1, &mut sink);
        track.update(10.0, &mut sink);
        assert_eq!(widget.current(), None);
        assert_eq!(track.active_index(), 2);
    }
}
