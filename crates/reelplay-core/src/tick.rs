//! Capped-rate tick source.
//!
//! The scheduler holds at most one active [`TickHandle`]. Starting a new
//! subscription cancels the previous one, so two loops can never advance the
//! same playback concurrently.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Upper bound on ticks delivered per second.
pub const MAX_TICKS_PER_SEC: u32 = 30;

/// Identifies one tick subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

#[async_trait]
pub trait TickSource: Send {
    /// Begin ticking every `period`, replacing any active subscription.
    fn start(&mut self, period: Duration) -> TickHandle;

    /// Cancel `handle`. Returns false if it was not the active subscription.
    fn stop(&mut self, handle: TickHandle) -> bool;

    fn active(&self) -> Option<TickHandle>;

    /// Wait for the next tick of the active subscription.
    ///
    /// Never resolves while no subscription is active.
    async fn next_tick(&mut self) -> Instant;
}

/// Tick source backed by a tokio interval. Missed ticks are skipped rather
/// than bursted.
#[derive(Debug, Default)]
pub struct IntervalTicks {
    next_id: u64,
    active: Option<(TickHandle, Duration)>,
    // Built lazily so subscriptions can be managed outside a runtime.
    interval: Option<Interval>,
}

impl IntervalTicks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    fn start(&mut self, period: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.active = Some((handle, period.max(Duration::from_millis(1))));
        self.interval = None;
        tracing::trace!(handle = handle.0, period_ms = period.as_millis() as u64, "tick source started");
        handle
    }

    fn stop(&mut self, handle: TickHandle) -> bool {
        match self.active {
            Some((active, _)) if active == handle => {
                self.active = None;
                self.interval = None;
                tracing::trace!(handle = handle.0, "tick source stopped");
                true
            }
            _ => false,
        }
    }

    fn active(&self) -> Option<TickHandle> {
        self.active.map(|(handle, _)| handle)
    }

    async fn next_tick(&mut self) -> Instant {
        let Some((_, period)) = self.active else {
            return std::future::pending().await;
        };
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await
    }
}
