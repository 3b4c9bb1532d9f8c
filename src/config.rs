use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::domain::Alert;

/// PagerDuty Events API v2 enqueue endpoint
pub const DEFAULT_PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Alertmanager base URLs, e.g. `http://alertmanager-0:9093`
    pub alertmanager_endpoints: Vec<String>,
    /// Watchdogs we expect to receive
    pub expected: Vec<WatchdogConfig>,
    /// Seconds between expiry sweeps (default: 120)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Seconds without any webhook before paging (default: 300)
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,
    /// Lifetime of an alert pushed to alertmanager (default: 240)
    #[serde(default = "default_alert_expiry")]
    pub alert_expiry_secs: u64,
    /// Per-endpoint push timeout (default: 10)
    #[serde(default = "default_push_timeout")]
    pub push_timeout_secs: u64,
    /// Listen port for the webhook and health endpoints (default: 9796)
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub pager_duty: PagerDutyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One expected watchdog source
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    /// Labels an incoming watchdog must carry; extra labels are ignored
    pub match_labels: HashMap<String, String>,
    /// Seconds without a firing watchdog before alerting (default: 240)
    #[serde(default = "default_watchdog_expiry")]
    pub expiry_secs: u64,
    /// Alert raised in alertmanager while this watchdog is missing
    pub alert: Alert,
}

impl WatchdogConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagerDutyConfig {
    /// Events API v2 integration key
    #[serde(default)]
    pub routing_key: String,
    /// Linked from every triggered incident when set
    #[serde(default)]
    pub runbook_url: Option<String>,
    /// Image attached to every triggered incident when set
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_events_url")]
    pub events_url: String,
}

impl Default for PagerDutyConfig {
    fn default() -> Self {
        Self {
            routing_key: String::new(),
            runbook_url: None,
            image_url: None,
            events_url: default_events_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_check_interval() -> u64 {
    120
}

fn default_expiry() -> u64 {
    300
}

fn default_alert_expiry() -> u64 {
    240
}

fn default_push_timeout() -> u64 {
    10
}

// https://github.com/prometheus/prometheus/wiki/Default-port-allocations
fn default_port() -> u16 {
    9796
}

fn default_watchdog_expiry() -> u64 {
    240
}

fn default_events_url() -> String {
    DEFAULT_PAGERDUTY_EVENTS_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific file (format picked by extension)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(path.as_ref()).required(true))
            // Override with environment variables (ALERTDOG_PORT, ALERTDOG_PAGER_DUTY__ROUTING_KEY, etc.)
            .add_source(
                Environment::with_prefix("ALERTDOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("alertmanager_endpoints"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    pub fn alert_expiry(&self) -> Duration {
        Duration::from_secs(self.alert_expiry_secs)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    /// Validate configuration values.
    ///
    /// Hard errors are returned; tuning hazards are only logged.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.alertmanager_endpoints.is_empty() {
            errors.push("alertmanager_endpoints must not be empty".to_string());
        }
        for endpoint in &self.alertmanager_endpoints {
            if let Err(e) = url::Url::parse(endpoint) {
                errors.push(format!("invalid alertmanager endpoint {endpoint}: {e}"));
            }
        }

        if self.expected.is_empty() {
            errors.push("expected must list at least one watchdog".to_string());
        }

        for (name, value) in [
            ("check_interval_secs", self.check_interval_secs),
            ("expiry_secs", self.expiry_secs),
            ("alert_expiry_secs", self.alert_expiry_secs),
            ("push_timeout_secs", self.push_timeout_secs),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be positive"));
            }
        }

        for (i, watchdog) in self.expected.iter().enumerate() {
            if watchdog.expiry_secs == 0 {
                errors.push(format!("expected[{i}].expiry_secs must be positive"));
            }
            if watchdog.match_labels.is_empty() {
                warn!("expected[{i}] has no match_labels and will match every watchdog");
            }
            if watchdog.expiry_secs <= self.check_interval_secs {
                warn!(
                    "expected[{i}].expiry_secs ({}) is not longer than check_interval_secs ({}), \
                     missing watchdogs will be detected late",
                    watchdog.expiry_secs, self.check_interval_secs
                );
            }
        }

        if self.alert_expiry_secs <= self.check_interval_secs {
            warn!(
                "alert_expiry_secs ({}) is not longer than check_interval_secs ({}), \
                 alerts may auto-resolve between sweeps",
                self.alert_expiry_secs, self.check_interval_secs
            );
        }

        if self.pager_duty.routing_key.is_empty() {
            warn!("pager_duty.routing_key is empty, escalations will be rejected");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
