pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod supervisor;

pub use adapters::{AlertBackend, AlertmanagerClient, EventSink, PagerDutyClient, PushOutcome};
pub use config::AppConfig;
pub use error::{AlertdogError, Result};
pub use services::HttpServer;
pub use supervisor::{AlertAction, Escalator, Monitor, WatchdogEntry};
