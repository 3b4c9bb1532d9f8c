pub mod alertmanager;
pub mod pagerduty;
pub mod traits;

pub use alertmanager::AlertmanagerClient;
pub use pagerduty::{EventAction, PagerDutyClient, PagerEvent, PagerImage, PagerLink, PagerPayload};
pub use traits::{AlertBackend, EventSink, PushOutcome};
