//! Monitor
//!
//! Routes incoming watchdogs to every expected entry, runs the periodic expiry
//! sweep, and escalates to PagerDuty when alertmanager cannot be reached or no
//! webhook has arrived for too long.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use super::escalation::{Escalator, PUSH_FAILURE_KEY, PUSH_FAILURE_SUMMARY, WEBHOOK_EXPIRY_KEY};
use super::watchdog::{AlertAction, EntrySnapshot, WatchdogEntry};
use crate::adapters::AlertBackend;
use crate::config::AppConfig;
use crate::domain::WebhookAlert;

/// Read-only view of the monitor for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub last_webhook_secs_ago: Option<u64>,
    pub webhook_expired: bool,
    pub watchdogs: Vec<EntrySnapshot>,
}

impl MonitorStatus {
    /// True when no webhook or watchdog is currently overdue
    pub fn is_healthy(&self) -> bool {
        !self.webhook_expired && self.watchdogs.iter().all(|w| !w.expired)
    }
}

/// Dead man's switch over a fixed set of expected watchdogs
pub struct Monitor {
    entries: Vec<WatchdogEntry>,
    backend: Arc<dyn AlertBackend>,
    escalator: Escalator,
    /// Silence allowed before `WEBHOOK_EXPIRY_KEY` is raised
    expiry: Duration,
    last_webhook: RwLock<Option<Instant>>,
    started_at: DateTime<Utc>,
}

impl Monitor {
    pub fn new(
        entries: Vec<WatchdogEntry>,
        backend: Arc<dyn AlertBackend>,
        escalator: Escalator,
        expiry: Duration,
    ) -> Self {
        Self {
            entries,
            backend,
            escalator,
            expiry,
            last_webhook: RwLock::new(None),
            started_at: Utc::now(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        backend: Arc<dyn AlertBackend>,
        escalator: Escalator,
    ) -> Self {
        let entries = config.expected.iter().map(WatchdogEntry::from_config).collect();
        Self::new(entries, backend, escalator, config.expiry())
    }

    /// Handle one watchdog from a webhook
    pub async fn process_event(&self, watchdog: &WebhookAlert) {
        self.record_webhook().await;

        for entry in &self.entries {
            let action = entry.check_in(watchdog).await;
            self.apply(entry, action).await;
        }
    }

    /// Expiry sweep: alert on every expired entry, then page if webhooks
    /// have stopped altogether (or resolve that page once they resume)
    pub async fn sweep(&self) {
        for entry in &self.entries {
            let action = entry.check().await;
            self.apply(entry, action).await;
        }

        if self.webhook_expired().await {
            let summary = format!(
                "Alertdog: didn't receive webhook from alert manager for over {}",
                format_duration(self.expiry)
            );
            self.escalator.trigger(WEBHOOK_EXPIRY_KEY, &summary).await;
        } else {
            self.escalator.resolve(WEBHOOK_EXPIRY_KEY).await;
        }
    }

    /// Sweep every `check_interval` until `shutdown` flips.
    ///
    /// Each sweep finishes before the next tick is awaited, so sweeps never overlap.
    pub async fn run(&self, check_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        interval.tick().await;

        info!(
            "Expiry sweep started (interval {}, {} watchdogs)",
            format_duration(check_interval),
            self.entries.len()
        );

        loop {
            tokio::select! {
                _ = interval.tick() => self.sweep().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweep stopped");
    }

    /// Mark a webhook as received now; the clock never moves backwards
    pub async fn record_webhook(&self) {
        let now = Instant::now();
        let mut last = self.last_webhook.write().await;
        if last.map_or(true, |t| now > t) {
            *last = Some(now);
        }
    }

    /// True when no webhook arrived within the expiry (or none ever did)
    pub async fn webhook_expired(&self) -> bool {
        match *self.last_webhook.read().await {
            Some(last) => Instant::now().duration_since(last) > self.expiry,
            None => true,
        }
    }

    pub async fn status(&self) -> MonitorStatus {
        let last_webhook = *self.last_webhook.read().await;

        let mut watchdogs = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            watchdogs.push(entry.snapshot().await);
        }

        MonitorStatus {
            started_at: self.started_at,
            uptime_seconds: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            last_webhook_secs_ago: last_webhook.map(|t| t.elapsed().as_secs()),
            webhook_expired: self.webhook_expired().await,
            watchdogs,
        }
    }

    async fn apply(&self, entry: &WatchdogEntry, action: AlertAction) {
        let alert = entry.alert();
        let result = match action {
            AlertAction::None => return,
            AlertAction::Alert => self.backend.alert(alert).await,
            AlertAction::Resolve => self.backend.resolve(alert).await,
        };

        match result {
            Ok(outcome) => {
                info!(
                    alert = %alert.display_name(),
                    %action,
                    succeeded = outcome.succeeded,
                    attempted = outcome.attempted,
                    "Pushed to alertmanager"
                );
            }
            Err(e) => {
                error!(alert = %alert.display_name(), %action, "Alertmanager push failed: {}", e);
                self.escalator
                    .trigger(PUSH_FAILURE_KEY, PUSH_FAILURE_SUMMARY)
                    .await;
            }
        }
    }
}

/// Compact duration for messages, e.g. `5m`, `2m30s`, `45s`
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}
