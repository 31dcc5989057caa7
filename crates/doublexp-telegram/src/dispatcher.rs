//! Notification dispatcher.
//!
//! Ties the pipeline together: fetch, filter, time offset, format, deliver.
//! All collaborators are injected, so the dispatcher runs against fakes in
//! tests and against doublexp.net, the subscriber file and Telegram in
//! production.
//!
//! Nothing here returns an error to the caller. A failed fetch aborts the
//! invocation before anything is sent; a failed send affects only its own
//! recipient. Every failure is logged.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use doublexp_core::{fetch_batch, minutes_remaining, minutes_until, AlertConfig, MissionSource};
use doublexp_models::{Selector, SubscriberId};
use doublexp_persistence::{AddOutcome, SubscriberStore};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::format::{AlertFormatter, AlertKind};
use crate::gateway::{Markup, MessageGateway};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients whose send succeeded.
    pub delivered: Vec<SubscriberId>,
    /// Recipients whose send failed.
    pub failed: Vec<SubscriberId>,
}

impl DeliveryReport {
    /// Number of sends issued.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Runs the on-demand, broadcast and subscription flows.
pub struct NotificationDispatcher {
    source: Arc<dyn MissionSource>,
    store: Arc<dyn SubscriberStore>,
    gateway: Arc<dyn MessageGateway>,
    config: AlertConfig,
    formatter: AlertFormatter,
    clock: Clock,
}

impl NotificationDispatcher {
    pub fn new(
        source: Arc<dyn MissionSource>,
        store: Arc<dyn SubscriberStore>,
        gateway: Arc<dyn MessageGateway>,
        config: AlertConfig,
    ) -> Self {
        let formatter = AlertFormatter::from_config(&config);
        Self {
            source,
            store,
            gateway,
            config,
            formatter,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock (for tests).
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Alert for the running window, or `None` if it has no target missions.
    pub async fn current_alert(&self) -> Result<Option<String>> {
        let batch = fetch_batch(self.source.as_ref(), Selector::Current, &self.config.mutator).await?;
        if batch.is_empty() {
            return Ok(None);
        }

        let minutes = minutes_remaining(batch.timestamp, self.now(), self.config.window_minutes);
        Ok(Some(self.formatter.format_alert(
            &batch.missions,
            minutes,
            AlertKind::Current,
        )))
    }

    /// Alert for the next window, or `None` if it has no target missions.
    pub async fn upcoming_alert(&self) -> Result<Option<String>> {
        let batch = fetch_batch(self.source.as_ref(), Selector::Next, &self.config.mutator).await?;
        if batch.is_empty() {
            return Ok(None);
        }

        let minutes = minutes_until(self.now(), batch.timestamp);
        Ok(Some(self.formatter.format_alert(
            &batch.missions,
            minutes,
            AlertKind::Upcoming,
        )))
    }

    /// Answers an on-demand request with the running window's missions.
    pub async fn current(&self, chat: SubscriberId) {
        let (text, markup) = match self.current_alert().await {
            Ok(Some(alert)) => (alert, Markup::MarkdownV2),
            Ok(None) => (self.formatter.no_missions(), Markup::Plain),
            Err(e) => {
                error!(chat_id = %chat, error = %e, "Failed to build current alert");
                (self.formatter.fetch_failed(), Markup::Plain)
            }
        };
        self.deliver(chat, &text, markup).await;
    }

    /// Sends the next window's alert to every subscriber.
    ///
    /// One fetch and one rendering, then one send per subscriber. Returns an
    /// empty report when there is nothing to send or the cycle was aborted.
    pub async fn broadcast(&self) -> DeliveryReport {
        let alert = match self.upcoming_alert().await {
            Ok(Some(alert)) => alert,
            Ok(None) => {
                debug!("No upcoming missions, nothing to broadcast");
                return DeliveryReport::default();
            }
            Err(e) => {
                error!(error = %e, "Upcoming alert aborted");
                return DeliveryReport::default();
            }
        };

        let recipients = match self.store.list_all().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Failed to load subscribers, broadcast aborted");
                return DeliveryReport::default();
            }
        };

        let report = self.send_to_many(&recipients, &alert).await;
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Broadcast finished"
        );
        report
    }

    /// Registers `chat` and welcomes it.
    ///
    /// A newly added chat triggers a full broadcast of the upcoming alert,
    /// so every subscriber (the new one included) hears about the next
    /// window. Re-subscribing an existing chat only repeats the welcome.
    pub async fn subscribe(&self, chat: SubscriberId) -> DeliveryReport {
        let outcome = match self.store.add(chat).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(chat_id = %chat, error = %e, "Chat registration error");
                self.deliver(chat, &self.formatter.registration_failed(), Markup::Plain)
                    .await;
                return DeliveryReport::default();
            }
        };

        self.deliver(chat, &self.formatter.welcome(), Markup::Plain).await;
        match outcome {
            AddOutcome::Added => {
                info!(chat_id = %chat, "Chat is registered");
                self.broadcast().await
            }
            AddOutcome::AlreadyPresent => {
                debug!(chat_id = %chat, "Chat was already registered");
                DeliveryReport::default()
            }
        }
    }

    /// Removes `chat` and confirms.
    pub async fn unsubscribe(&self, chat: SubscriberId) {
        let reply = match self.store.remove(chat).await {
            Ok(removed) => {
                info!(chat_id = %chat, removed, "Chat unsubscribed");
                self.formatter.unsubscribed()
            }
            Err(e) => {
                error!(chat_id = %chat, error = %e, "Chat unsubscribe error");
                self.formatter.unsubscribe_failed()
            }
        };
        self.deliver(chat, &reply, Markup::Plain).await;
    }

    /// Sends `text` to each recipient concurrently.
    async fn send_to_many(&self, recipients: &BTreeSet<SubscriberId>, text: &str) -> DeliveryReport {
        let sends = recipients.iter().map(|&chat| async move {
            let result = self.gateway.send(chat, text, Markup::MarkdownV2).await;
            (chat, result)
        });

        let mut report = DeliveryReport::default();
        for (chat, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered.push(chat),
                Err(e) => {
                    warn!(chat_id = %chat, error = %e, "Failed to send alert");
                    report.failed.push(chat);
                }
            }
        }
        report
    }

    async fn deliver(&self, chat: SubscriberId, text: &str, markup: Markup) {
        if let Err(e) = self.gateway.send(chat, text, markup).await {
            warn!(chat_id = %chat, error = %e, "Failed to reply");
        }
    }
}
