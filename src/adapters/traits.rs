//! Seams between the monitor and the systems it talks to

use async_trait::async_trait;

use super::pagerduty::PagerEvent;
use crate::domain::Alert;
use crate::error::Result;

/// Result of a push that reached at least one alertmanager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    pub succeeded: usize,
    pub attempted: usize,
}

impl PushOutcome {
    pub fn is_partial(&self) -> bool {
        self.succeeded < self.attempted
    }
}

/// Where watchdog alerts are raised and resolved
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertBackend: Send + Sync {
    /// Raise the alert for one backend expiry window
    async fn alert(&self, alert: &Alert) -> Result<PushOutcome>;

    /// Resolve the alert
    async fn resolve(&self, alert: &Alert) -> Result<PushOutcome>;
}

/// Paging backend that accepts incident events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send_event(&self, event: &PagerEvent) -> Result<()>;
}
