//! Scheduled upcoming-window alerts.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use doublexp_core::AlertConfig;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::dispatcher::NotificationDispatcher;

/// Fires a broadcast shortly after every window boundary.
///
/// Boundaries are multiples of the window length since the Unix epoch, in
/// UTC. With a 30 minute window that is every :00 and :30, so each tick
/// announces the window starting at the following boundary.
#[derive(Debug, Clone)]
pub struct AlertScheduler {
    window: TimeDelta,
    offset: TimeDelta,
}

impl AlertScheduler {
    /// Creates a scheduler. Windows shorter than a minute are raised to one.
    pub fn new(window_minutes: u32, offset: std::time::Duration) -> Self {
        let offset = TimeDelta::from_std(offset).unwrap_or_else(|_| TimeDelta::zero());
        Self {
            window: TimeDelta::minutes(i64::from(window_minutes.max(1))),
            offset,
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.window_minutes, config.tick_offset)
    }

    /// First fire time strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window_ms = self.window.num_milliseconds();
        let offset_ms = self.offset.num_milliseconds();

        let slot = (now.timestamp_millis() - offset_ms).div_euclid(window_ms) + 1;
        DateTime::<Utc>::from_timestamp_millis(slot * window_ms + offset_ms)
            .unwrap_or(now + self.window)
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    ///
    /// Each tick's broadcast runs in its own task, so a slow fetch never
    /// delays the next tick.
    pub async fn run(self, dispatcher: Arc<NotificationDispatcher>, mut shutdown: watch::Receiver<bool>) {
        info!(
            window_minutes = self.window.num_minutes(),
            offset_secs = self.offset.num_seconds(),
            "Starting alert scheduler"
        );

        let mut last_fire: Option<DateTime<Utc>> = None;
        loop {
            // Never schedule the same slot twice if the sleep ends early
            let now = match last_fire {
                Some(last) => Utc::now().max(last),
                None => Utc::now(),
            };
            let fire_at = self.next_fire(now);
            let wait = (fire_at - now).to_std().unwrap_or_default();
            debug!(fire_at = %fire_at, "Next scheduled alert");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(fire_at);
                    let dispatcher = Arc::clone(&dispatcher);
                    tokio::spawn(async move {
                        let report = dispatcher.broadcast().await;
                        debug!(attempted = report.attempted(), "Scheduled alert done");
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("scheduler received shutdown signal");
                        break;
                    }
                }
            }
        }

        info!("Alert scheduler stopped");
    }
}
