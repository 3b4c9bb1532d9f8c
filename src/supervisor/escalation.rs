//! Escalation to PagerDuty
//!
//! Last line of escalation when alertmanager cannot be reached or webhooks stop
//! arriving. Failures are logged and never returned to the caller.

use std::sync::Arc;
use tracing::{error, warn};

use crate::adapters::{EventAction, EventSink, PagerEvent, PagerImage, PagerLink, PagerPayload};
use crate::config::PagerDutyConfig;

/// Raised when an alert could not be pushed to any alertmanager
pub const PUSH_FAILURE_KEY: &str = "alertdog:alertmanager-push";
pub const PUSH_FAILURE_SUMMARY: &str = "Alertdog cannot push alerts to alertmanager";

/// Raised when no webhook arrived within the configured expiry
pub const WEBHOOK_EXPIRY_KEY: &str = "alertdog:webhook-expiry";

const SEVERITY: &str = "critical";

/// Sends keyed trigger/resolve events to the paging backend
pub struct Escalator {
    sink: Arc<dyn EventSink>,
    routing_key: String,
    runbook_url: Option<String>,
    image_url: Option<String>,
}

impl Escalator {
    pub fn new(sink: Arc<dyn EventSink>, routing_key: &str) -> Self {
        Self {
            sink,
            routing_key: routing_key.to_string(),
            runbook_url: None,
            image_url: None,
        }
    }

    pub fn from_config(sink: Arc<dyn EventSink>, config: &PagerDutyConfig) -> Self {
        Self::new(sink, &config.routing_key)
            .with_runbook_url(config.runbook_url.clone())
            .with_image_url(config.image_url.clone())
    }

    pub fn with_runbook_url(mut self, url: Option<String>) -> Self {
        self.runbook_url = url.filter(|u| !u.is_empty());
        self
    }

    pub fn with_image_url(mut self, url: Option<String>) -> Self {
        self.image_url = url.filter(|u| !u.is_empty());
        self
    }

    /// Build a trigger event; the dedup key doubles as the event source
    pub fn trigger_event(&self, dedup_key: &str, summary: &str) -> PagerEvent {
        PagerEvent {
            routing_key: self.routing_key.clone(),
            event_action: EventAction::Trigger,
            dedup_key: dedup_key.to_string(),
            payload: Some(PagerPayload {
                summary: summary.to_string(),
                source: dedup_key.to_string(),
                severity: SEVERITY.to_string(),
            }),
            images: self
                .image_url
                .iter()
                .map(|src| PagerImage { src: src.clone() })
                .collect(),
            links: self
                .runbook_url
                .iter()
                .map(|href| PagerLink {
                    href: href.clone(),
                    text: "Runbook 📕".to_string(),
                })
                .collect(),
        }
    }

    pub fn resolve_event(&self, dedup_key: &str) -> PagerEvent {
        PagerEvent {
            routing_key: self.routing_key.clone(),
            event_action: EventAction::Resolve,
            dedup_key: dedup_key.to_string(),
            payload: None,
            images: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Open (or update) the incident for `dedup_key`
    pub async fn trigger(&self, dedup_key: &str, summary: &str) {
        warn!(dedup_key, "PagerDuty: {}", summary);
        let event = self.trigger_event(dedup_key, summary);
        if let Err(e) = self.sink.send_event(&event).await {
            error!(dedup_key, "Error raising alert on PagerDuty: {}", e);
        }
    }

    /// Close the incident for `dedup_key`; a no-op when none is open
    pub async fn resolve(&self, dedup_key: &str) {
        let event = self.resolve_event(dedup_key);
        if let Err(e) = self.sink.send_event(&event).await {
            error!(dedup_key, "Error resolving alert on PagerDuty: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::traits::MockEventSink;
    use crate::error::AlertdogError;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_trigger_sends_full_event() {
        let expected = PagerEvent {
            routing_key: "pagerduty-key".to_string(),
            event_action: EventAction::Trigger,
            dedup_key: PUSH_FAILURE_KEY.to_string(),
            payload: Some(PagerPayload {
                summary: PUSH_FAILURE_SUMMARY.to_string(),
                source: PUSH_FAILURE_KEY.to_string(),
                severity: "critical".to_string(),
            }),
            images: vec![PagerImage {
                src: "https://example.org/dog.jpg".to_string(),
            }],
            links: vec![PagerLink {
                href: "https://example.org/runbook-url".to_string(),
                text: "Runbook 📕".to_string(),
            }],
        };

        let mut sink = MockEventSink::new();
        sink.expect_send_event()
            .with(eq(expected))
            .times(1)
            .returning(|_| Ok(()));

        let escalator = Escalator::new(Arc::new(sink), "pagerduty-key")
            .with_runbook_url(Some("https://example.org/runbook-url".to_string()))
            .with_image_url(Some("https://example.org/dog.jpg".to_string()));

        escalator.trigger(PUSH_FAILURE_KEY, PUSH_FAILURE_SUMMARY).await;
    }

    #[tokio::test]
    async fn test_trigger_without_runbook_has_no_links() {
        let mut sink = MockEventSink::new();
        sink.expect_send_event()
            .withf(|event| event.links.is_empty() && event.images.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let escalator =
            Escalator::new(Arc::new(sink), "key").with_runbook_url(Some(String::new()));
        escalator.trigger(WEBHOOK_EXPIRY_KEY, "no webhooks").await;
    }

    #[tokio::test]
    async fn test_resolve_sends_bare_event() {
        let mut sink = MockEventSink::new();
        sink.expect_send_event()
            .with(eq(PagerEvent {
                routing_key: "this-is-a-key".to_string(),
                event_action: EventAction::Resolve,
                dedup_key: WEBHOOK_EXPIRY_KEY.to_string(),
                payload: None,
                images: Vec::new(),
                links: Vec::new(),
            }))
            .times(1)
            .returning(|_| Ok(()));

        let escalator = Escalator::new(Arc::new(sink), "this-is-a-key")
            .with_runbook_url(Some("https://example.org/runbook-url".to_string()));
        escalator.resolve(WEBHOOK_EXPIRY_KEY).await;
    }

    #[tokio::test]
    async fn test_sink_failures_are_swallowed() {
        let mut sink = MockEventSink::new();
        sink.expect_send_event()
            .times(2)
            .returning(|_| Err(AlertdogError::PagerDuty("HTTP 500".to_string())));

        let escalator = Escalator::new(Arc::new(sink), "key");
        escalator.trigger(PUSH_FAILURE_KEY, PUSH_FAILURE_SUMMARY).await;
        escalator.resolve(PUSH_FAILURE_KEY).await;
    }
}
