//! Alertmanager push client
//!
//! Pushes a single alert to every configured alertmanager concurrently. A push
//! succeeds when at least one alertmanager accepted it, so one replica being
//! down does not stop alerts from getting through.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{AlertBackend, PushOutcome};
use crate::config::AppConfig;
use crate::domain::{Alert, PostableAlert};
use crate::error::{AlertdogError, Result};

/// Per-endpoint timeout when none is configured
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one or more alertmanager replicas
#[derive(Clone)]
pub struct AlertmanagerClient {
    client: Client,
    endpoints: Vec<String>,
    /// How long a raised alert stays active without being refreshed
    expiry: Duration,
    timeout: Duration,
}

impl AlertmanagerClient {
    pub fn new(endpoints: Vec<String>, expiry: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoints,
            expiry,
            timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.alertmanager_endpoints.clone(), config.alert_expiry())
            .with_timeout(config.push_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the alert to every endpoint, each with its own timeout.
    ///
    /// Waits for all endpoints before deciding; fails only if none accepted.
    async fn push(&self, alert: PostableAlert) -> Result<PushOutcome> {
        let body = Arc::new(vec![alert]);

        let handles: Vec<_> = self
            .endpoints
            .iter()
            .map(|endpoint| {
                let client = self.client.clone();
                let endpoint = endpoint.clone();
                let body = Arc::clone(&body);
                let timeout = self.timeout;
                tokio::spawn(async move {
                    let result = push_to_endpoint(&client, &endpoint, &body, timeout).await;
                    (endpoint, result)
                })
            })
            .collect();

        let attempted = handles.len();
        let mut succeeded = 0;

        for result in join_all(handles).await {
            match result {
                Ok((endpoint, Ok(()))) => {
                    debug!(%endpoint, "Pushed alert to alertmanager");
                    succeeded += 1;
                }
                Ok((endpoint, Err(e))) => {
                    warn!(%endpoint, "Error pushing alert to alertmanager: {}", e);
                }
                Err(e) => {
                    error!("Alertmanager push task failed: {}", e);
                }
            }
        }

        if succeeded == 0 {
            return Err(AlertdogError::PushFailed { attempted });
        }

        Ok(PushOutcome {
            succeeded,
            attempted,
        })
    }
}

#[async_trait]
impl AlertBackend for AlertmanagerClient {
    async fn alert(&self, alert: &Alert) -> Result<PushOutcome> {
        let expiry = chrono::Duration::from_std(self.expiry)
            .map_err(|e| AlertdogError::Internal(format!("Alert expiry out of range: {}", e)))?;
        let now = Utc::now();
        self.push(alert.to_postable(now, now + expiry)).await
    }

    async fn resolve(&self, alert: &Alert) -> Result<PushOutcome> {
        let now = Utc::now();
        self.push(alert.to_postable(now, now)).await
    }
}

fn alerts_url(endpoint: &str) -> String {
    format!("{}/api/v2/alerts", endpoint.trim_end_matches('/'))
}

async fn push_to_endpoint(
    client: &Client,
    endpoint: &str,
    body: &[PostableAlert],
    timeout: Duration,
) -> Result<()> {
    // The whole exchange, body included, counts against the timeout
    tokio::time::timeout(timeout, exchange(client, endpoint, body))
        .await
        .map_err(|_| AlertdogError::EndpointTimeout {
            endpoint: endpoint.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })?
}

async fn exchange(client: &Client, endpoint: &str, body: &[PostableAlert]) -> Result<()> {
    let response = client.post(alerts_url(endpoint)).json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        Ok(())
    } else {
        debug!(%endpoint, %status, body = %text, "Alertmanager rejected push");
        Err(AlertdogError::EndpointRejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}
