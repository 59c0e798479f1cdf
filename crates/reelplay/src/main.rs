//! reelplay CLI
//!
//! Replays a recorded UI session from a JSON file. Applied records go to
//! stdout as JSON lines; events, subtitles and logs go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use reelplay_core::collaborators::{
    EventSink, NullProgress, PlayerEvent, Renderer, SubtitleWidget,
};
use reelplay_core::config::LogFormat;
use reelplay_core::heatmap::heat_points;
use reelplay_core::logging::init_logging;
use reelplay_core::memory::continuous_progress;
use reelplay_core::{
    Collaborators, FrameTimeline, MemoryReplay, PlaybackScheduler, PlayerControl, Record,
    ReplayConfig, Segment,
};

/// reelplay - deterministic playback for recorded UI sessions
#[derive(Parser, Debug)]
#[command(name = "reelplay")]
#[command(version)]
#[command(about = "Replay recorded UI sessions as JSON lines")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "REELPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (pretty or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a recording until it stops
    Play {
        /// Recording file: a JSON array of segments
        recording: PathBuf,

        /// Playback speed multiplier
        #[arg(long, allow_negative_numbers = true)]
        speed: Option<f64>,
    },

    /// Print the record-density heatmap
    Heatmap {
        recording: PathBuf,

        /// Bucket count across the whole recording
        #[arg(long)]
        buckets: Option<usize>,
    },

    /// Print the frame timeline
    Timeline {
        recording: PathBuf,

        /// Frame spacing in milliseconds
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ReplayConfig::load_from(path).map_err(reelplay_core::Error::from)?,
        None => ReplayConfig::default(),
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging).context("failed to initialize logging")?;

    match cli.command {
        Commands::Play { recording, speed } => play(config, &recording, speed).await,
        Commands::Heatmap { recording, buckets } => {
            let replay = load_recording(&recording)?;
            let segments = replay.segments();
            let buckets = buckets.unwrap_or(config.playback.heat_buckets).max(1);
            let points = heat_points(segments, continuous_progress(segments).duration, buckets);
            print_json(&points)
        }
        Commands::Timeline {
            recording,
            interval,
        } => {
            let replay = load_recording(&recording)?;
            let interval = interval.unwrap_or(config.playback.frame_interval_ms);
            print_json(&timeline_report(replay.segments(), interval))
        }
    }
}

fn load_recording(path: &Path) -> anyhow::Result<MemoryReplay> {
    MemoryReplay::load(path).with_context(|| format!("failed to load recording {}", path.display()))
}

async fn play(config: ReplayConfig, recording: &Path, speed: Option<f64>) -> anyhow::Result<()> {
    // Nothing on the command line can resume a session that starts paused.
    if speed == Some(0.0) {
        anyhow::bail!("--speed 0 would start paused with no way to resume; pass a positive speed");
    }
    let replay = Arc::new(load_recording(recording)?);
    tracing::info!(
        recording = %recording.display(),
        segments = replay.segments().len(),
        "loaded recording"
    );

    let collaborators = Collaborators::new(StdoutRenderer)
        .with_progress(NullProgress)
        .with_subtitles(StderrSubtitles)
        .with_events(StderrEvents);
    let mut scheduler =
        PlaybackScheduler::load(config, replay.clone(), replay, collaborators).await?;

    let initial = speed.map_or(PlayerControl::Play, PlayerControl::SetSpeed);
    let (control_tx, control_rx) = watch::channel(initial);

    let feed = if scheduler.is_live() {
        let (tx, rx) = mpsc::unbounded_channel();
        scheduler.attach_live_feed(rx);
        Some(tokio::spawn(read_live_records(tx)))
    } else {
        None
    };

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted; stopping playback");
            let _ = control_tx.send(PlayerControl::Stop);
        }
        // Keep the control channel open until playback ends on its own.
        std::future::pending::<()>().await;
    });

    let outcome = scheduler.run(control_rx).await;
    interrupt.abort();
    if let Some(feed) = feed {
        feed.abort();
    }
    outcome?;
    Ok(())
}

/// Forward JSON-line records from stdin into a live session.
async fn read_live_records(tx: mpsc::UnboundedSender<Record>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<Record>(&line) {
                Ok(record) => {
                    if tx.send(record).is_err() {
                        return;
                    }
                }
                Err(err) => tracing::warn!(error = %err, "skipping malformed record line"),
            },
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "stdin closed with an error");
                return;
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TimelineReport {
    live: bool,
    interval_ms: u64,
    frames: Vec<u64>,
}

fn timeline_report(segments: &[Segment], interval_ms: u64) -> TimelineReport {
    let live = segments.first().is_none_or(Segment::is_live);
    let timeline = if live {
        FrameTimeline::live(interval_ms)
    } else {
        let progress = continuous_progress(segments);
        FrameTimeline::build(progress.start_time, progress.end_time, interval_ms)
    };
    TimelineReport {
        live,
        interval_ms: timeline.interval_ms(),
        frames: timeline.frames().to_vec(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn report(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");
    if let Some(remediation) = err
        .downcast_ref::<reelplay_core::Error>()
        .and_then(reelplay_core::Error::remediation)
    {
        eprint!("{}", remediation.render_plain());
    }
}

// ---------------------------------------------------------------------------
// Terminal collaborators
// ---------------------------------------------------------------------------

struct StdoutRenderer;

impl Renderer for StdoutRenderer {
    fn apply(&mut self, record: &Record) {
        let mut stdout = std::io::stdout().lock();
        let written = serde_json::to_writer(&mut stdout, record)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(stdout));
        if let Err(err) = written {
            tracing::warn!(error = %err, record_time = record.time, "failed to write record");
        }
    }

    fn reset_view(&mut self, view_index: usize, segment: &Segment) {
        tracing::debug!(
            view_index,
            records = segment.records.len(),
            "renderer view reset"
        );
    }
}

struct StderrSubtitles;

impl SubtitleWidget for StderrSubtitles {
    fn update_text(&mut self, text: &str) {
        eprintln!("subtitle: {text}");
    }

    fn clean_text(&mut self) {}
}

struct StderrEvents;

impl EventSink for StderrEvents {
    fn emit(&mut self, event: PlayerEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => eprintln!("event: {line}"),
            Err(err) => tracing::warn!(error = %err, "failed to encode event"),
        }
    }
}
