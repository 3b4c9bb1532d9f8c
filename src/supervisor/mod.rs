//! Supervision of expected watchdogs
//!
//! - Watchdog entries track check-ins per expected source
//! - The monitor routes webhooks and runs the expiry sweep
//! - Escalation pages when alertmanager itself is unreachable or silent

pub mod escalation;
pub mod monitor;
pub mod watchdog;

pub use escalation::{Escalator, PUSH_FAILURE_KEY, PUSH_FAILURE_SUMMARY, WEBHOOK_EXPIRY_KEY};
pub use monitor::{Monitor, MonitorStatus};
pub use watchdog::{AlertAction, EntrySnapshot, WatchdogEntry};
