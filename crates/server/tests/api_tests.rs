use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use events::Event;
use github::Publisher;
use llm::{CompletionModel, LlmResult};
use serde_json::{json, Value};
use server::config::AppConfig;
use server::{create_router, state::AppState};
use sitesmith_core::{GeneratedFileSet, PublishResult};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANSWER: &str = "### index.html\n```html\n<h1>Demo</h1>\n```\n### README.md\n```markdown\n# Demo\n```";

struct CannedModel;

#[async_trait]
impl CompletionModel for CannedModel {
    async fn complete(&self, _prompt: &str) -> LlmResult<String> {
        Ok(ANSWER.to_string())
    }
}

struct StaticPublisher;

#[async_trait]
impl Publisher for StaticPublisher {
    async fn create_project(
        &self,
        name: &str,
        _files: GeneratedFileSet,
    ) -> github::Result<PublishResult> {
        Ok(PublishResult {
            project_url: format!("https://github.com/acct/{}", name),
            revision_id: "abc123".to_string(),
            public_url: format!("https://acct.github.io/{}/", name),
        })
    }

    async fn update_project(
        &self,
        name: &str,
        files: GeneratedFileSet,
    ) -> github::Result<PublishResult> {
        self.create_project(name, files).await
    }

    async fn wait_until_live(&self, _public_url: &str, _timeout: Duration) -> bool {
        true
    }
}

fn test_config() -> AppConfig {
    let env: HashMap<&str, &str> = HashMap::from([
        ("MY_EMAIL", "me@example.com"),
        ("MY_SECRET", "s3cret"),
        ("GITHUB_TOKEN", "token"),
        ("GITHUB_USERNAME", "acct"),
        ("LLM_API_KEY", "key"),
    ]);
    AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).expect("valid test config")
}

fn setup_test_server() -> (TestServer, AppState) {
    let state = AppState::with_collaborators(
        test_config(),
        Arc::new(CannedModel),
        Arc::new(StaticPublisher),
    )
    .expect("Failed to build state");
    let server =
        TestServer::new(create_router(state.clone())).expect("Failed to create test server");
    (server, state)
}

fn build_request(evaluation_url: &str) -> Value {
    json!({
        "secret": "s3cret",
        "email": "me@example.com",
        "task": "demo-1",
        "round": 1,
        "nonce": "n-1",
        "brief": "Build a page titled Demo",
        "checks": ["has title"],
        "attachments": [],
        "evaluation_url": evaluation_url
    })
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_root_endpoint() {
        let (server, _state) = setup_test_server();

        let response = server.get("/").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "online");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _state) = setup_test_server();

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}

mod build_app {
    use super::*;

    #[tokio::test]
    async fn test_wrong_secret_is_forbidden() {
        let (server, _state) = setup_test_server();
        let mut request = build_request("http://127.0.0.1:1/notify");
        request["secret"] = json!("nope");
        request["email"] = json!("other@example.com");

        let response = server.post("/build-app").json(&request).await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "Invalid secret");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_forbidden_before_body_validation() {
        let (server, state) = setup_test_server();
        let mut rx = state.event_bus.subscribe();

        let response = server
            .post("/build-app")
            .json(&json!({"secret": "nope", "email": "me@example.com", "task": "demo-1"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid secret");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wrong_email_is_forbidden_before_body_validation() {
        let (server, _state) = setup_test_server();

        let response = server
            .post("/build-app")
            .json(&json!({"secret": "s3cret", "email": "other@example.com", "round": "one"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["message"], "Wrong email");
    }

    #[tokio::test]
    async fn test_wrong_email_is_forbidden() {
        let (server, _state) = setup_test_server();
        let mut request = build_request("http://127.0.0.1:1/notify");
        request["email"] = json!("other@example.com");

        let response = server.post("/build-app").json(&request).await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["message"], "Wrong email");
    }

    #[tokio::test]
    async fn test_round_zero_is_rejected() {
        let (server, state) = setup_test_server();
        let mut rx = state.event_bus.subscribe();
        let mut request = build_request("http://127.0.0.1:1/notify");
        request["round"] = json!(0);

        let response = server.post("/build-app").json(&request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "bad_request");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let (server, _state) = setup_test_server();
        let mut request = build_request("http://127.0.0.1:1/notify");
        request.as_object_mut().unwrap().remove("evaluation_url");

        let response = server.post("/build-app").json(&request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (server, _state) = setup_test_server();

        let response = server
            .post("/build-app")
            .text("{not json")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_accepted_task_runs_in_background() {
        let evaluator = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_partial_json(json!({
                "email": "me@example.com",
                "task": "demo-1",
                "round": 1,
                "nonce": "n-1",
                "repo_url": "https://github.com/acct/demo-1",
                "commit_sha": "abc123",
                "pages_url": "https://acct.github.io/demo-1/"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&evaluator)
            .await;

        let (server, state) = setup_test_server();
        let mut rx = state.event_bus.subscribe();

        let response = server
            .post("/build-app")
            .json(&build_request(&format!("{}/notify", evaluator.uri())))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "received");
        assert_eq!(body["message"], "Processing your request");

        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if let Event::TaskFinished {
                            stage, notified, ..
                        } = envelope.event
                        {
                            return (stage, notified);
                        }
                    }
                    Err(e) => panic!("event bus closed: {e}"),
                }
            }
        })
        .await
        .expect("task did not finish in time");

        assert_eq!(finished, ("done".to_string(), true));
    }
}
