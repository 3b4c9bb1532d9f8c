use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status of an alert as reported by alertmanager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// For a watchdog this means the source is alive
    Firing,
    /// For a watchdog this means the source stopped evaluating it
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One alert carried in an alertmanager webhook notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAlert {
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl WebhookAlert {
    pub fn new(status: AlertStatus, labels: &[(&str, &str)]) -> Self {
        Self {
            status,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            annotations: HashMap::new(),
        }
    }

    pub fn firing(labels: &[(&str, &str)]) -> Self {
        Self::new(AlertStatus::Firing, labels)
    }

    pub fn resolved(labels: &[(&str, &str)]) -> Self {
        Self::new(AlertStatus::Resolved, labels)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Alertmanager webhook body. Only `alerts` is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub alerts: Vec<WebhookAlert>,
}
