use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use events::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitesmith_core::{Attachment, CoreError, Round, Task};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

/// Inbound build request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BuildRequest {
    pub secret: String,
    pub email: String,
    pub task: String,
    pub round: i64,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub evaluation_url: String,
}

impl BuildRequest {
    fn into_task(self) -> Result<Task, CoreError> {
        let round = u32::try_from(self.round)
            .map_err(|_| CoreError::Validation(format!("Round out of range: {}", self.round)))
            .and_then(Round::new)?;

        Ok(Task::new(self.task, round, self.evaluation_url)?
            .with_nonce(self.nonce)
            .with_brief(self.brief)
            .with_checks(self.checks)
            .with_attachments(self.attachments))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildAck {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/build-app",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Task accepted for background processing", body = BuildAck),
        (status = 400, description = "Malformed or invalid request", body = ErrorResponse),
        (status = 403, description = "Secret or email mismatch", body = ErrorResponse),
        (status = 500, description = "Request body could not be read", body = ErrorResponse)
    ),
    tag = "build"
)]
pub async fn build_app(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BuildAck>, AppError> {
    let Json(body) = payload?;

    // Credentials are checked before the rest of the body is validated.
    let task_name = body.get("task").and_then(Value::as_str).unwrap_or_default();
    if body.get("secret").and_then(Value::as_str) != Some(state.config.secret.as_str()) {
        warn!(task = %task_name, "Rejected build request: invalid secret");
        return Err(AppError::Forbidden("Invalid secret".to_string()));
    }
    if body.get("email").and_then(Value::as_str) != Some(state.config.email.as_str()) {
        warn!(task = %task_name, "Rejected build request: wrong email");
        return Err(AppError::Forbidden("Wrong email".to_string()));
    }

    let request: BuildRequest =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let task = request.into_task()?;

    info!(
        task_id = %task.task_id,
        round = task.round.get(),
        checks = task.checks.len(),
        attachments = task.attachments.len(),
        "Accepted build request"
    );
    state.event_bus.emit(Event::TaskAccepted {
        task_id: task.task_id.clone(),
        round: task.round.get(),
    });

    // Completion is reported only through the evaluation callback.
    drop(state.dispatcher.submit(task));

    Ok(Json(BuildAck {
        status: "received".to_string(),
        message: "Processing your request".to_string(),
    }))
}
