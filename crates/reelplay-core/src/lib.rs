//! reelplay-core: Core library for reelplay
//!
//! This crate replays recorded UI sessions: timestamped mutation records,
//! split into segments with real-world gaps between them, played back on one
//! continuous timeline with optional audio and subtitles.
//!
//! # Architecture
//!
//! ```text
//! SegmentSource → ViewState (RecordOrderer) → FrameTimeline
//!                       ↓                          ↓
//!                 PlaybackScheduler ← TickSource (capped rate)
//!                   ↓        ↓            ↓
//!              Renderer  AudioSync   Progress / Subtitles / Events
//! ```
//!
//! # Modules
//!
//! - `record`: Records, segments and audio assets
//! - `orderer`: Font-first record ordering
//! - `timeline`: Discretized frame timeline
//! - `heatmap`: Record density buckets for the progress bar
//! - `subtitle`: Cue parsing and the forward-only cue cursor
//! - `audio`: Audio asset resolution and drift correction
//! - `view`: Active segment and segment handoff
//! - `state`: Playback state and the frame-advance step
//! - `dispatch`: Record dispatch against frame boundaries
//! - `tick`: Capped-rate tick source
//! - `scheduler`: The tick-driven playback scheduler
//! - `collaborators`: Renderer, widget, source, facade and event contracts
//! - `memory`: In-memory recording (source + facade)
//! - `config`: Configuration management
//! - `logging`: Structured logging setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod audio;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod heatmap;
pub mod logging;
pub mod memory;
pub mod orderer;
pub mod record;
pub mod scheduler;
pub mod state;
pub mod subtitle;
pub mod tick;
pub mod timeline;
pub mod view;

pub use collaborators::{Collaborators, PlayerEvent};
pub use config::ReplayConfig;
pub use error::{Error, Result};
pub use memory::MemoryReplay;
pub use record::{Record, RecordKind, Segment};
pub use scheduler::{PlaybackScheduler, PlayerControl};
pub use state::PlayerState;
pub use timeline::FrameTimeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
