use alertdog::adapters::{AlertBackend, EventSink, PagerEvent, PushOutcome};
use alertdog::domain::Alert;
use alertdog::error::Result;
use alertdog::services::router;
use alertdog::supervisor::{Escalator, Monitor, WatchdogEntry};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Records every push instead of talking to alertmanager
#[derive(Default)]
struct RecordingBackend {
    pushes: Mutex<Vec<(String, &'static str)>>,
}

impl RecordingBackend {
    fn pushes(&self) -> Vec<(String, &'static str)> {
        self.pushes.lock().unwrap().clone()
    }

    fn record(&self, alert: &Alert, action: &'static str) -> Result<PushOutcome> {
        self.pushes
            .lock()
            .unwrap()
            .push((alert.name.clone(), action));
        Ok(PushOutcome {
            succeeded: 1,
            attempted: 1,
        })
    }
}

#[async_trait]
impl AlertBackend for RecordingBackend {
    async fn alert(&self, alert: &Alert) -> Result<PushOutcome> {
        self.record(alert, "alert")
    }

    async fn resolve(&self, alert: &Alert) -> Result<PushOutcome> {
        self.record(alert, "resolve")
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<PagerEvent>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send_event(&self, event: &PagerEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn setup() -> (Arc<Monitor>, Arc<RecordingBackend>, Arc<RecordingSink>) {
    let backend = Arc::new(RecordingBackend::default());
    let sink = Arc::new(RecordingSink::default());

    let entries = ["prom1", "prom2"]
        .into_iter()
        .map(|prometheus| {
            WatchdogEntry::new(
                HashMap::from([
                    ("alertname".to_string(), "Watchdog".to_string()),
                    ("prometheus".to_string(), prometheus.to_string()),
                ]),
                Duration::from_secs(240),
                Alert::new(&format!("{prometheus}-missing")),
            )
        })
        .collect();

    let monitor = Monitor::new(
        entries,
        backend.clone(),
        Escalator::new(sink.clone(), "routing-key"),
        Duration::from_secs(300),
    );

    (Arc::new(monitor), backend, sink)
}

fn webhook(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn watchdog_payload(status: &str, prometheus: &str) -> String {
    format!(
        r#"{{
            "version": "4",
            "status": "{status}",
            "receiver": "alertdog",
            "groupLabels": {{}},
            "commonLabels": {{}},
            "alerts": [{{
                "status": "{status}",
                "labels": {{"alertname": "Watchdog", "prometheus": "{prometheus}", "severity": "none"}},
                "annotations": {{"summary": "Always firing"}},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z"
            }}]
        }}"#
    )
}

#[tokio::test]
async fn firing_watchdogs_resolve_the_matching_alert() {
    let (monitor, backend, _) = setup();
    let app = router(monitor);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(webhook(&watchdog_payload("firing", "prom1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(
        backend.pushes(),
        vec![("prom1-missing".to_string(), "resolve")]
    );
}

#[tokio::test]
async fn resolved_watchdog_raises_the_matching_alert() {
    let (monitor, backend, _) = setup();

    let response = router(monitor)
        .oneshot(webhook(&watchdog_payload("resolved", "prom2")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.pushes(), vec![("prom2-missing".to_string(), "alert")]);
}

#[tokio::test]
async fn malformed_webhook_is_rejected() {
    let (monitor, backend, sink) = setup();
    let app = router(Arc::clone(&monitor));

    for body in ["not json", r#"{"alerts": [{"status": "pending", "labels": {}}]}"#] {
        let response = app.clone().oneshot(webhook(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    assert!(backend.pushes().is_empty());
    assert!(sink.events.lock().unwrap().is_empty());
    // Rejected payloads do not count as webhooks
    assert!(monitor.webhook_expired().await);
}

#[tokio::test]
async fn health_reports_monitor_state() {
    let (monitor, _, _) = setup();
    let app = router(Arc::clone(&monitor));

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["webhook_expired"], true);
    assert_eq!(health["watchdogs"].as_array().map(Vec::len), Some(2));

    for prometheus in ["prom1", "prom2"] {
        app.clone()
            .oneshot(webhook(&watchdog_payload("firing", prometheus)))
            .await
            .unwrap();
    }

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["webhook_expired"], false);
}

#[tokio::test]
async fn liveness_probe_is_ok() {
    let (monitor, _, _) = setup();

    let response = router(monitor)
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
