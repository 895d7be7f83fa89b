//! Step-aligned periodic flush loop.
//!
//! State machine: `Idle -> Aligning -> Ticking -> Draining -> Stopped`.
//!
//! The first flush waits for the next wall-clock step boundary so samples
//! land on the store's native resolution; later flushes tick every step on
//! the same grid. A flush that overruns a boundary gets one late tick, then
//! the schedule returns to the grid instead of shifting.
//! Cancelling the token from any state runs exactly one final flush.
//! Flushes are strictly sequential: the loop awaits each one before it looks
//! at the timer or the token again.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use rrdpulse_core::error::Result;

/// Wall clock used for step alignment.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Something that can be flushed; returns the number of sources written.
#[async_trait]
pub trait FlushTarget: Send + Sync {
    async fn flush(&self) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Aligning,
    Ticking,
    Draining,
    Stopped,
}

/// Time left until the next multiple of `step` since the epoch. On an exact
/// boundary this is a full step.
pub fn delay_until_next_step(now: SystemTime, step: Duration) -> Duration {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let step_nanos = step.as_nanos().max(1);
    let into_step = since_epoch.as_nanos() % step_nanos;
    Duration::from_nanos((step_nanos - into_step) as u64)
}

pub struct FlushScheduler {
    step: Duration,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SchedulerState>,
}

impl FlushScheduler {
    pub fn new(step_seconds: u64) -> Self {
        Self::with_clock(step_seconds, Arc::new(SystemClock))
    }

    pub fn with_clock(step_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            step: Duration::from_secs(step_seconds.max(1)),
            clock,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    fn enter(&self, next: SchedulerState) {
        self.state.send_replace(next);
    }

    /// Run until `cancel` fires, then flush once more and stop.
    ///
    /// Periodic failures are logged and the loop keeps going. The returned
    /// error, if any, is the final flush's.
    pub async fn run(self, target: Arc<dyn FlushTarget>, cancel: CancellationToken) -> Result<()> {
        self.enter(SchedulerState::Aligning);
        let wait = delay_until_next_step(self.clock.now(), self.step);
        tracing::debug!(
            wait_ms = wait.as_millis() as u64,
            step_s = self.step.as_secs(),
            "aligning first flush to step boundary"
        );

        let boundary = Instant::now() + wait;

        tokio::select! {
            _ = cancel.cancelled() => return self.drain(target.as_ref()).await,
            _ = tokio::time::sleep_until(boundary) => {}
        }

        self.enter(SchedulerState::Ticking);
        flush_logged(target.as_ref()).await;

        // anchored on the boundary, not on when the first flush returned
        let mut ticker = tokio::time::interval_at(boundary + self.step, self.step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => flush_logged(target.as_ref()).await,
            }
        }

        self.drain(target.as_ref()).await
    }

    async fn drain(&self, target: &dyn FlushTarget) -> Result<()> {
        self.enter(SchedulerState::Draining);
        let res = match target.flush().await {
            Ok(sources) => {
                tracing::info!(sources, "stored metrics before shutdown");
                Ok(())
            }
            Err(e) => {
                let e = e.into_shutdown();
                tracing::error!(code = e.code().as_str(), error = %e, "final flush failed; samples dropped");
                Err(e)
            }
        };
        self.enter(SchedulerState::Stopped);
        res
    }
}

async fn flush_logged(target: &dyn FlushTarget) {
    match target.flush().await {
        Ok(sources) => tracing::debug!(sources, "flushed metrics"),
        Err(e) => tracing::warn!(code = e.code().as_str(), error = %e, "flush failed; interval dropped"),
    }
}
