use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::task::Task;

/// Which publish path a round takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOperation {
    Create,
    Update,
}

impl PublishOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Outcome of a single create or update call against the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub project_url: String,
    /// Identifies the exact content snapshot that was published.
    pub revision_id: String,
    pub public_url: String,
}

/// Body posted to the evaluation callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl NotificationPayload {
    pub fn new(email: impl Into<String>, task: &Task, published: &PublishResult) -> Self {
        Self {
            email: email.into(),
            task: task.task_id.clone(),
            round: task.round.get(),
            nonce: task.nonce.clone(),
            repo_url: published.project_url.clone(),
            commit_sha: published.revision_id.clone(),
            pages_url: published.public_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Round;

    #[test]
    fn test_payload_from_task_and_publish() {
        let task = Task::new("demo-1", Round::new(2).unwrap(), "https://eval.example")
            .unwrap()
            .with_nonce("abc");
        let published = PublishResult {
            project_url: "https://github.com/acct/demo-1".to_string(),
            revision_id: "deadbeef".to_string(),
            public_url: "https://acct.github.io/demo-1/".to_string(),
        };

        let payload = NotificationPayload::new("me@example.com", &task, &published);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["email"], "me@example.com");
        assert_eq!(json["task"], "demo-1");
        assert_eq!(json["round"], 2);
        assert_eq!(json["nonce"], "abc");
        assert_eq!(json["repo_url"], "https://github.com/acct/demo-1");
        assert_eq!(json["commit_sha"], "deadbeef");
        assert_eq!(json["pages_url"], "https://acct.github.io/demo-1/");
        assert_eq!(json.as_object().unwrap().len(), 7);
    }
}
