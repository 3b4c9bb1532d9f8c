//! Watchdog Entries
//!
//! One entry per expected watchdog source. An entry tracks when its source last
//! sent a firing watchdog and decides when the matching alert in alertmanager
//! must be raised or resolved.
//!
//! For a watchdog the usual meaning of status is inverted: `firing` means the
//! source is alive, `resolved` means it stopped evaluating the watchdog rule.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::WatchdogConfig;
use crate::domain::{Alert, AlertStatus, WebhookAlert};

/// Firing check-ins needed before the alert is resolved again
const RESOLVE_STREAK: u32 = 2;

/// Action to take on an entry's alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    /// Leave the alert as it is
    None,
    /// Raise (or refresh) the alert
    Alert,
    /// Resolve the alert
    Resolve,
}

impl std::fmt::Display for AlertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertAction::None => write!(f, "none"),
            AlertAction::Alert => write!(f, "alert"),
            AlertAction::Resolve => write!(f, "resolve"),
        }
    }
}

/// Mutable check-in state, only touched under the entry's lock
#[derive(Debug, Default)]
struct EntryState {
    last_checked_in: Option<Instant>,
    firing_streak: u32,
}

/// Point-in-time view of an entry for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    pub alert: String,
    pub match_labels: HashMap<String, String>,
    pub expiry_secs: u64,
    pub firing_streak: u32,
    pub last_checked_in_secs_ago: Option<u64>,
    pub expired: bool,
}

/// An expected watchdog source
#[derive(Debug)]
pub struct WatchdogEntry {
    match_labels: HashMap<String, String>,
    expiry: Duration,
    alert: Alert,
    state: Mutex<EntryState>,
}

impl WatchdogEntry {
    pub fn new(match_labels: HashMap<String, String>, expiry: Duration, alert: Alert) -> Self {
        Self {
            match_labels,
            expiry,
            alert,
            state: Mutex::new(EntryState::default()),
        }
    }

    pub fn from_config(config: &WatchdogConfig) -> Self {
        Self::new(
            config.match_labels.clone(),
            config.expiry(),
            config.alert.clone(),
        )
    }

    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    /// True when every match label is present with the same value
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(name, value)| labels.get(name) == Some(value))
    }

    /// Record an incoming watchdog.
    ///
    /// A resolved watchdog raises the alert straight away. A firing watchdog
    /// only resolves it on the second consecutive check-in, so a single flap
    /// does not clear the alert.
    pub async fn check_in(&self, watchdog: &WebhookAlert) -> AlertAction {
        let mut state = self.state.lock().await;

        if !self.matches(&watchdog.labels) {
            return AlertAction::None;
        }

        let action = match watchdog.status {
            AlertStatus::Firing => {
                state.last_checked_in = Some(Instant::now());
                state.firing_streak = state.firing_streak.saturating_add(1);
                if state.firing_streak == RESOLVE_STREAK {
                    AlertAction::Resolve
                } else {
                    AlertAction::None
                }
            }
            AlertStatus::Resolved => {
                state.firing_streak = 0;
                AlertAction::Alert
            }
        };

        debug!(
            alert = %self.alert.display_name(),
            status = %watchdog.status,
            streak = state.firing_streak,
            %action,
            "Watchdog checked in"
        );
        action
    }

    /// Expiry check run on every sweep
    pub async fn check(&self) -> AlertAction {
        let mut state = self.state.lock().await;

        if self.is_expired(&state) {
            state.firing_streak = 0;
            debug!(alert = %self.alert.display_name(), "Watchdog expired");
            AlertAction::Alert
        } else {
            AlertAction::None
        }
    }

    pub async fn firing_streak(&self) -> u32 {
        self.state.lock().await.firing_streak
    }

    pub async fn last_checked_in(&self) -> Option<Instant> {
        self.state.lock().await.last_checked_in
    }

    pub async fn snapshot(&self) -> EntrySnapshot {
        let state = self.state.lock().await;
        EntrySnapshot {
            alert: self.alert.display_name().to_string(),
            match_labels: self.match_labels.clone(),
            expiry_secs: self.expiry.as_secs(),
            firing_streak: state.firing_streak,
            last_checked_in_secs_ago: state.last_checked_in.map(|t| t.elapsed().as_secs()),
            expired: self.is_expired(&state),
        }
    }

    // Never checked in counts as expired
    fn is_expired(&self, state: &EntryState) -> bool {
        match state.last_checked_in {
            Some(last) => Instant::now().duration_since(last) > self.expiry,
            None => true,
        }
    }
}
