//! Delivery of the evaluation callback.

use events::{Event, EventBus};
use reqwest::{Client, StatusCode};
use sitesmith_core::NotificationPayload;
use tracing::{error, info, warn};

use crate::config::NotifierConfig;
use crate::error::{OrchestratorError, Result};

/// Posts [`NotificationPayload`]s to the evaluator, retrying with exponential
/// backoff. Only an HTTP 200 counts as delivered.
pub struct EvaluationNotifier {
    client: Client,
    config: NotifierConfig,
    event_bus: Option<EventBus>,
}

impl EvaluationNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            event_bus: None,
        })
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Makes up to `max_attempts` deliveries and reports whether one was
    /// accepted. There is no pause after the last attempt.
    pub async fn notify(
        &self,
        callback_url: &str,
        payload: &NotificationPayload,
        max_attempts: u32,
    ) -> bool {
        for attempt in 1..=max_attempts {
            let status = self.attempt(callback_url, payload, attempt).await;
            let success = status == Some(StatusCode::OK);

            self.emit(Event::NotificationAttempted {
                task_id: payload.task.clone(),
                attempt,
                status: status.map(|s| s.as_u16()),
                success,
            });

            if success {
                info!(task_id = %payload.task, attempt, "Evaluator notified");
                return true;
            }

            if attempt < max_attempts {
                let delay = self.config.backoff(attempt);
                info!(
                    task_id = %payload.task,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying notification"
                );
                tokio::time::sleep(delay).await;
            }
        }

        error!(
            task_id = %payload.task,
            attempts = max_attempts,
            "Failed to notify evaluator"
        );
        false
    }

    /// One POST. Returns the response status, or `None` on transport failure.
    async fn attempt(
        &self,
        callback_url: &str,
        payload: &NotificationPayload,
        attempt: u32,
    ) -> Option<StatusCode> {
        info!(task_id = %payload.task, attempt, url = callback_url, "Notifying evaluator");

        match self.client.post(callback_url).json(payload).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if status == StatusCode::OK {
                    info!(status = status.as_u16(), body = %body, "Evaluator response");
                } else {
                    warn!(
                        status = status.as_u16(),
                        body = %body,
                        "Evaluator rejected notification"
                    );
                }
                Some(status)
            }
            Err(e) => {
                warn!(attempt, error = %e, "Notification request failed");
                None
            }
        }
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Answers 500 and remembers when each request arrived.
    #[derive(Clone, Default)]
    struct ArrivalLog(Arc<Mutex<Vec<Instant>>>);

    impl ArrivalLog {
        fn arrivals(&self) -> Vec<Instant> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Respond for ArrivalLog {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.0.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(500)
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            email: "me@example.com".to_string(),
            task: "demo-1".to_string(),
            round: 1,
            nonce: "n-1".to_string(),
            repo_url: "https://github.com/acct/demo-1".to_string(),
            commit_sha: "abc123".to_string(),
            pages_url: "https://acct.github.io/demo-1/".to_string(),
        }
    }

    fn notifier() -> EvaluationNotifier {
        EvaluationNotifier::new(
            NotifierConfig::default().with_base_delay(Duration::from_millis(10)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::to_value(payload()).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(&format!("{}/notify", server.uri()), &payload(), 5)
            .await;

        assert!(delivered);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(&format!("{}/notify", server.uri()), &payload(), 5)
            .await;

        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_backoff_doubles_between_attempts() {
        let base = Duration::from_millis(50);
        let slack = Duration::from_millis(250);
        let log = ArrivalLog::default();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(log.clone())
            .expect(5)
            .mount(&server)
            .await;

        let notifier =
            EvaluationNotifier::new(NotifierConfig::default().with_base_delay(base)).unwrap();
        let start = Instant::now();
        let delivered = notifier
            .notify(&format!("{}/notify", server.uri()), &payload(), 5)
            .await;
        let finished = Instant::now();

        assert!(!delivered);
        let arrivals = log.arrivals();
        assert_eq!(arrivals.len(), 5);

        // 1, 2, 4 and 8 base delays between the five attempts.
        for (i, pair) in arrivals.windows(2).enumerate() {
            let expected = base * 2u32.pow(i as u32);
            let gap = pair[1] - pair[0];
            assert!(gap >= expected, "gap {i} was {gap:?}, expected {expected:?}");
            assert!(gap < expected + slack, "gap {i} was {gap:?}, expected {expected:?}");
        }

        // No pause after the final attempt.
        assert!(finished - arrivals[4] < slack);
        assert!(finished - start < base * 15 + slack);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let delivered = notifier()
            .with_event_bus(bus)
            .notify(&format!("{}/notify", server.uri()), &payload(), 5)
            .await;

        assert!(delivered);

        let mut attempts = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            if let Event::NotificationAttempted {
                attempt, success, ..
            } = envelope.event
            {
                attempts.push((attempt, success));
            }
        }
        assert_eq!(attempts, vec![(1, false), (2, false), (3, true)]);
    }

    #[tokio::test]
    async fn test_non_200_success_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(2)
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(&format!("{}/notify", server.uri()), &payload(), 2)
            .await;

        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let notifier = EvaluationNotifier::new(
            NotifierConfig::default()
                .with_base_delay(Duration::from_millis(1))
                .with_request_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        assert!(!notifier.notify("http://127.0.0.1:1/notify", &payload(), 2).await);
    }
}
