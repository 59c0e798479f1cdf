//! Recorded data model: records, segments and their audio assets.
//!
//! A recording is a sequence of segments ("packs"). Each segment holds the
//! timestamped UI-mutation records captured in one contiguous stretch, plus an
//! optional audio asset with subtitle cues. Timestamps are wall-clock
//! milliseconds, so consecutive segments can be separated by real-world gaps.

use serde::{Deserialize, Serialize};

/// Kind of a recorded UI mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    /// Full document snapshot.
    Snapshot,
    /// Document head changes.
    Head,
    /// Viewport resize.
    Window,
    /// Scroll position change.
    Scroll,
    /// Pointer movement or click.
    Mouse,
    /// DOM mutation batch.
    Dom,
    /// Form element value change.
    FormEl,
    /// Navigation.
    Location,
    /// Canvas drawing commands.
    Canvas,
    /// Font resource that styled content depends on.
    Font,
    /// Audio chunk marker.
    Audio,
    /// End of the captured session.
    Terminate,
}

/// One timestamped UI-mutation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Capture time in milliseconds.
    pub time: u64,
    /// Opaque mutation payload handed to the renderer.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Record {
    #[must_use]
    pub fn new(kind: RecordKind, time: u64) -> Self {
        Self {
            kind,
            time,
            data: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// How a segment's records reach the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Records are known up front and replayed on the frame timeline.
    #[default]
    Recorded,
    /// Records arrive while playing and are applied on arrival.
    Live,
}

/// A contiguous chunk of records plus optional audio, loaded as a unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub records: Vec<Record>,
    #[serde(default)]
    pub audio: Option<AudioAsset>,
    #[serde(default)]
    pub mode: SegmentMode,
}

impl Segment {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            audio: None,
            mode: SegmentMode::Recorded,
        }
    }

    #[must_use]
    pub fn live() -> Self {
        Self {
            records: Vec::new(),
            audio: None,
            mode: SegmentMode::Live,
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: AudioAsset) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Time of the first record.
    #[must_use]
    pub fn start_time(&self) -> Option<u64> {
        self.records.first().map(|r| r.time)
    }

    /// Time of the last record.
    #[must_use]
    pub fn end_time(&self) -> Option<u64> {
        self.records.last().map(|r| r.time)
    }

    /// An explicit live segment, or one with nothing to schedule.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.mode == SegmentMode::Live || self.records.is_empty()
    }
}

/// PCM encoding parameters for buffered audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioOptions {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels", alias = "numberOfChannels")]
    pub channels: u16,
    #[serde(default = "default_sample_bits")]
    pub sample_bits: u16,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            sample_bits: default_sample_bits(),
        }
    }
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_channels() -> u16 {
    1
}

fn default_sample_bits() -> u16 {
    16
}

/// One subtitle cue. Times use `HH:MM:SS,mmm`, `MM:SS` or plain seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start: String,
    pub end: String,
    pub text: String,
}

/// Audio attached to a segment.
///
/// Either a direct `src` reference, or base64-encoded little-endian `f32`
/// PCM buffers described by `opts`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAsset {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default, alias = "bufferStrList")]
    pub buffers: Vec<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleCue>,
    #[serde(default)]
    pub opts: AudioOptions,
}

impl AudioAsset {
    #[must_use]
    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    /// Nothing playable: no reference and no buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.src.as_deref().is_none_or(str::is_empty) && self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_kind_uses_wire_names() {
        let record: Record =
            serde_json::from_value(json!({"type": "FONT", "time": 12, "data": {"family": "x"}}))
                .unwrap();
        assert_eq!(record.kind, RecordKind::Font);
        assert_eq!(record.time, 12);
        assert_eq!(record.data["family"], "x");

        let form: Record = serde_json::from_value(json!({"type": "FORM_EL", "time": 1})).unwrap();
        assert_eq!(form.kind, RecordKind::FormEl);
        assert!(form.data.is_null());
    }

    #[test]
    fn segment_bounds() {
        let segment = Segment::new(vec![
            Record::new(RecordKind::Snapshot, 100),
            Record::new(RecordKind::Dom, 350),
        ]);
        assert_eq!(segment.start_time(), Some(100));
        assert_eq!(segment.end_time(), Some(350));
        assert!(!segment.is_live());
    }

    #[test]
    fn empty_or_explicit_live_segments_are_live() {
        assert!(Segment::new(Vec::new()).is_live());
        let mut live = Segment::live();
        live.records.push(Record::new(RecordKind::Dom, 1));
        assert!(live.is_live());
    }

    #[test]
    fn audio_asset_accepts_recorder_field_names() {
        let asset: AudioAsset = serde_json::from_value(json!({
            "bufferStrList": ["AAAAAA=="],
            "subtitles": [{"start": "00:00:01,000", "end": "00:00:02,500", "text": "hi"}],
            "opts": {"sampleRate": 8000, "numberOfChannels": 2, "sampleBits": 8}
        }))
        .unwrap();
        assert_eq!(asset.buffers.len(), 1);
        assert_eq!(asset.opts.sample_rate, 8000);
        assert_eq!(asset.opts.channels, 2);
        assert_eq!(asset.opts.sample_bits, 8);
        assert_eq!(asset.subtitles[0].text, "hi");
        assert!(!asset.is_empty());
    }

    #[test]
    fn audio_asset_without_src_or_buffers_is_empty() {
        assert!(AudioAsset::default().is_empty());
        assert!(AudioAsset::from_src("").is_empty());
        assert!(!AudioAsset::from_src("a.wav").is_empty());
    }
}
