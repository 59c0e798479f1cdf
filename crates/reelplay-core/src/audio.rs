//! Audio asset resolution and playback sync.
//!
//! A segment's audio is either a `src` reference, resolved against the
//! configured origin, or a list of base64 little-endian `f32` PCM buffers that
//! are re-encoded into one WAV container and exposed as a `data:` URL. The
//! [`AudioSyncController`] owns the audio element and keeps its position
//! aligned with scheduler time. At speeds above 1x audio is paused; no tempo
//! correction is attempted.

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::record::{AudioAsset, AudioOptions};

/// Media element the controller drives. Positions are in seconds.
pub trait AudioElement: Send {
    fn set_source(&mut self, url: &str);
    fn source(&self) -> Option<String>;
    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, secs: f64);
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
}

#[derive(Debug, Default)]
struct SimulatedState {
    source: Option<String>,
    base_secs: f64,
    started_at: Option<Instant>,
}

impl SimulatedState {
    fn position(&self) -> f64 {
        self.base_secs
            + self
                .started_at
                .map_or(0.0, |at| at.elapsed().as_secs_f64())
    }
}

/// Audio element whose position advances with the tokio clock while playing.
///
/// Clones share state, so a test can keep a handle after passing one to the
/// scheduler.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAudio {
    inner: Arc<Mutex<SimulatedState>>,
}

impl SimulatedAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioElement for SimulatedAudio {
    fn set_source(&mut self, url: &str) {
        let mut state = self.inner.lock();
        state.source = Some(url.to_string());
        state.base_secs = 0.0;
        state.started_at = None;
    }

    fn source(&self) -> Option<String> {
        self.inner.lock().source.clone()
    }

    fn play(&mut self) {
        let mut state = self.inner.lock();
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let mut state = self.inner.lock();
        state.base_secs = state.position();
        state.started_at = None;
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut state = self.inner.lock();
        state.base_secs = secs.max(0.0);
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().position()
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().started_at.is_some()
    }
}

/// Resolve an audio asset into a playable URL.
///
/// Returns `Ok(None)` when the asset has neither a reference nor buffers.
pub fn resolve_audio_url(asset: &AudioAsset, origin: &Url) -> Result<Option<String>, AudioError> {
    if let Some(src) = asset.src.as_deref().filter(|s| !s.is_empty()) {
        return Ok(Some(origin.join(src)?.to_string()));
    }
    if asset.buffers.is_empty() {
        return Ok(None);
    }

    let samples = decode_buffers(&asset.buffers)?;
    let wav = encode_wav(&samples, asset.opts)?;
    Ok(Some(format!(
        "data:audio/wav;base64,{}",
        STANDARD.encode(wav)
    )))
}

/// Decode and concatenate base64 `f32` LE buffers.
pub fn decode_buffers(buffers: &[String]) -> Result<Vec<f32>, AudioError> {
    let mut samples = Vec::new();
    for buffer in buffers {
        let bytes = STANDARD.decode(buffer.trim())?;
        if bytes.len() % 4 != 0 {
            return Err(AudioError::MisalignedBuffer { len: bytes.len() });
        }
        samples.extend(
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
        );
    }
    Ok(samples)
}

/// Encode interleaved float samples as integer PCM WAV.
pub fn encode_wav(samples: &[f32], opts: AudioOptions) -> Result<Vec<u8>, AudioError> {
    if opts.channels == 0 {
        return Err(AudioError::NoChannels);
    }
    if opts.sample_bits != 8 && opts.sample_bits != 16 {
        return Err(AudioError::UnsupportedSampleBits(opts.sample_bits));
    }

    let spec = hound::WavSpec {
        channels: opts.channels,
        sample_rate: opts.sample_rate,
        bits_per_sample: opts.sample_bits,
        sample_format: hound::SampleFormat::Int,
    };

    // hound refuses to finalize a partial frame; pad with silence.
    let channels = usize::from(opts.channels);
    let padding = (channels - samples.len() % channels) % channels;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples.iter().chain(std::iter::repeat_n(&0.0, padding)) {
            let clamped = if sample.is_finite() {
                sample.clamp(-1.0, 1.0)
            } else {
                0.0
            };
            if opts.sample_bits == 8 {
                writer.write_sample((clamped * f32::from(i8::MAX)) as i8)?;
            } else {
                writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Owns the audio element and keeps it aligned with scheduler time.
pub struct AudioSyncController {
    element: Box<dyn AudioElement>,
    origin: Url,
    offset_ms: u64,
    allowed_diff_ms: u64,
    url: Option<String>,
    assigned: bool,
}

impl AudioSyncController {
    pub fn new(element: Box<dyn AudioElement>, config: &AudioConfig) -> Result<Self, AudioError> {
        Ok(Self {
            element,
            origin: Url::parse(&config.origin)?,
            offset_ms: config.offset_ms,
            allowed_diff_ms: config.allowed_diff_ms,
            url: None,
            assigned: false,
        })
    }

    /// Prepare the audio of a newly active segment.
    ///
    /// Resolution failures disable audio for the segment; visual playback is
    /// unaffected.
    pub fn load(&mut self, asset: Option<&AudioAsset>) -> bool {
        if self.assigned {
            self.element.pause();
        }
        self.assigned = false;
        self.url = match asset.filter(|a| !a.is_empty()) {
            None => None,
            Some(asset) => match resolve_audio_url(asset, &self.origin) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(error = %err, "audio disabled for segment");
                    None
                }
            },
        };
        self.url.is_some()
    }

    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.url.is_some()
    }

    /// Resolved URL of the active segment's audio.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Start audio at `elapsed` seconds. Above 1x the element is paused.
    pub fn play_audio(&mut self, elapsed: f64, speed: f64) {
        let Some(url) = self.url.as_deref() else {
            return;
        };
        if !self.assigned {
            self.element.set_source(url);
            self.assigned = true;
        }
        if speed > 1.0 {
            self.element.pause();
            return;
        }
        self.sync_current_time(elapsed, None);
        self.element.play();
    }

    pub fn pause_audio(&mut self) {
        if self.assigned {
            self.element.pause();
        }
    }

    /// Force the position to `elapsed + offset`. The offset defaults to the
    /// configured audio lead.
    pub fn sync_current_time(&mut self, elapsed: f64, offset_ms: Option<u64>) {
        if !self.assigned {
            return;
        }
        let offset = offset_ms.unwrap_or(self.offset_ms) as f64 / 1000.0;
        self.element.set_current_time(elapsed + offset);
    }

    /// Resync when the element has drifted beyond offset plus tolerance.
    ///
    /// Returns the measured drift in milliseconds when a resync happened.
    pub fn correct_drift(&mut self, elapsed: f64) -> Option<f64> {
        if !self.assigned {
            return None;
        }
        let drift_ms = (elapsed - self.element.current_time()).abs() * 1000.0;
        if drift_ms > (self.offset_ms + self.allowed_diff_ms) as f64 {
            self.sync_current_time(elapsed, None);
            return Some(drift_ms);
        }
        None
    }

    /// Rewind to zero and pause.
    pub fn reset(&mut self) {
        if self.assigned {
            self.element.pause();
            self.element.set_current_time(0.0);
        }
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.element.current_time()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.element.is_playing()
    }
}

impl std::fmt::Debug for AudioSyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSyncController")
            .field("origin", &self.origin.as_str())
            .field("offset_ms", &self.offset_ms)
            .field("allowed_diff_ms", &self.allowed_diff_ms)
            .field("has_audio", &self.url.is_some())
            .field("assigned", &self.assigned)
            .finish_non_exhaustive()
    }
}
