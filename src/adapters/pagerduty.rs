//! PagerDuty Events API v2 client
//!
//! Sends trigger and resolve events keyed by a dedup key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::traits::EventSink;
use crate::config::PagerDutyConfig;
use crate::error::{AlertdogError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Trigger,
    Resolve,
}

/// Event accepted by the Events API v2 enqueue endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerEvent {
    pub routing_key: String,
    pub event_action: EventAction,
    pub dedup_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PagerPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PagerImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<PagerLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerPayload {
    pub summary: String,
    pub source: String,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerImage {
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerLink {
    pub href: String,
    pub text: String,
}

/// PagerDuty notification client
#[derive(Clone)]
pub struct PagerDutyClient {
    client: Client,
    events_url: String,
}

impl PagerDutyClient {
    pub fn new(events_url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, events_url })
    }

    pub fn from_config(config: &PagerDutyConfig) -> Result<Self> {
        Self::new(config.events_url.clone())
    }
}

#[async_trait]
impl EventSink for PagerDutyClient {
    async fn send_event(&self, event: &PagerEvent) -> Result<()> {
        let resp = self.client.post(&self.events_url).json(event).send().await?;

        if resp.status().is_success() {
            debug!(dedup_key = %event.dedup_key, "PagerDuty event accepted");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(AlertdogError::PagerDuty(format!("HTTP {}: {}", status, body)))
        }
    }
}
