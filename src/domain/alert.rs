use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label alertmanager uses to identify an alert
pub const ALERTNAME_LABEL: &str = "alertname";

/// Alert raised in alertmanager when an expected watchdog goes missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Becomes the `alertname` label
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl Alert {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_annotation(mut self, name: &str, value: &str) -> Self {
        self.annotations.insert(name.to_string(), value.to_string());
        self
    }

    /// Name used in logs
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }

    /// Build the assertion pushed to alertmanager for the given active window.
    ///
    /// `starts_at == ends_at` marks the alert as resolved.
    pub fn to_postable(&self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> PostableAlert {
        let mut labels = self.labels.clone();
        if !self.name.is_empty() {
            labels.insert(ALERTNAME_LABEL.to_string(), self.name.clone());
        }

        PostableAlert {
            labels,
            annotations: self.annotations.clone(),
            starts_at,
            ends_at,
        }
    }
}

/// Alert body accepted by `POST /api/v2/alerts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostableAlert {
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl PostableAlert {
    pub fn is_resolved(&self) -> bool {
        self.ends_at <= self.starts_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_becomes_alertname_label() {
        let alert = Alert::new("PrometheusAlertFailure").with_label("foo", "bar");
        let now = Utc::now();

        let postable = alert.to_postable(now, now);
        assert_eq!(
            postable.labels.get(ALERTNAME_LABEL).map(String::as_str),
            Some("PrometheusAlertFailure")
        );
        assert_eq!(postable.labels.get("foo").map(String::as_str), Some("bar"));
        assert!(postable.is_resolved());
    }

    #[test]
    fn test_unnamed_alert_has_no_alertname() {
        let alert = Alert::default().with_label("alert", "one");
        let now = Utc::now();

        let postable = alert.to_postable(now, now + chrono::Duration::minutes(1));
        assert!(!postable.labels.contains_key(ALERTNAME_LABEL));
        assert!(!postable.is_resolved());
        assert_eq!(alert.display_name(), "<unnamed>");
    }

    #[test]
    fn test_postable_wire_format() {
        let alert = Alert::new("Missing").with_annotation("summary", "gone");
        let starts = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let ends = "2024-01-01T00:04:00Z".parse::<DateTime<Utc>>().unwrap();

        let json = serde_json::to_value(alert.to_postable(starts, ends)).unwrap();
        assert_eq!(json["labels"]["alertname"], "Missing");
        assert_eq!(json["annotations"]["summary"], "gone");
        assert_eq!(json["startsAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["endsAt"], "2024-01-01T00:04:00Z");
    }
}
