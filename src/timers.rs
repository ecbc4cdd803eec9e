//! Dialog timers
//!
//! Three independent timers, each optional:
//!
//! - countdown: ticks every second while the countdown runs
//! - expiry: fires once after the configured interval
//! - persist: fires repeatedly to pull the window back into place
//!
//! Timer tasks never touch session state. Each fire is posted to the
//! session mailbox as a `Trigger` and handled on the session's own thread.
//! Countdown ticks are display refreshes, so at most one is queued at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::session::Trigger;

/// Countdown refresh period
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct TimerSubsystem {
    countdown: Option<JoinHandle<()>>,
    expiry: Option<JoinHandle<()>>,
    persist: Option<JoinHandle<()>>,
    tick_pending: Arc<AtomicBool>,
}

impl TimerSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the 1 s countdown ticker. Must be called inside a tokio runtime.
    pub fn start_countdown(&mut self, tx: UnboundedSender<Trigger>) {
        if self.countdown.is_some() {
            return;
        }
        let pending = self.tick_pending.clone();
        self.countdown = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // Coalesce: skip if the previous tick has not been handled yet
                if pending.swap(true, Ordering::AcqRel) {
                    continue;
                }
                if tx.send(Trigger::CountdownTick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Fire `ExternalExpiry` once after `after`
    pub fn start_expiry(&mut self, after: Duration, tx: UnboundedSender<Trigger>) {
        if self.expiry.is_some() {
            return;
        }
        self.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Trigger::ExternalExpiry);
        }));
    }

    /// Fire `PersistPosition` every `every`
    pub fn start_persist(&mut self, every: Duration, tx: UnboundedSender<Trigger>) {
        if self.persist.is_some() {
            return;
        }
        self.persist = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Trigger::PersistPosition).is_err() {
                    break;
                }
            }
        }));
    }

    /// Called by the session once it has handled a countdown tick
    pub fn acknowledge_tick(&self) {
        self.tick_pending.store(false, Ordering::Release);
    }

    /// Number of timers currently owned
    pub fn active_count(&self) -> usize {
        [&self.countdown, &self.expiry, &self.persist]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }

    /// Stop every timer. Safe to call repeatedly.
    pub fn stop(&mut self) {
        for (name, timer) in [
            ("countdown", self.countdown.take()),
            ("expiry", self.expiry.take()),
            ("persist", self.persist.take()),
        ] {
            if let Some(handle) = timer {
                handle.abort();
                debug!("Stopped {} timer", name);
            }
        }
    }
}

impl Drop for TimerSubsystem {
    fn drop(&mut self) {
        self.stop();
    }
}
