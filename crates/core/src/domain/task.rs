use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::publish::PublishOperation;
use crate::error::{CoreError, Result};

/// Evaluation round of a task. Round 1 publishes a fresh project, later rounds
/// update the existing one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Round(u32);

impl Round {
    pub const FIRST: Round = Round(1);

    pub fn new(value: u32) -> Result<Self> {
        if value == 0 {
            return Err(CoreError::InvalidRound(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_first(&self) -> bool {
        self.0 == 1
    }

    pub fn operation(&self) -> PublishOperation {
        if self.is_first() {
            PublishOperation::Create
        } else {
            PublishOperation::Update
        }
    }
}

impl TryFrom<u32> for Round {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Round> for u32 {
    fn from(round: Round) -> Self {
        round.0
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file handed over with the task. `url` is either a `data:` URI carrying the
/// content inline or a plain URL pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn is_data_uri(&self) -> bool {
        self.url.starts_with("data:")
    }
}

/// One invocation of the build pipeline. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Also used as the published project name.
    pub task_id: String,
    pub round: Round,
    pub nonce: String,
    pub brief: String,
    pub checks: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub evaluation_url: String,
    pub received_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        round: Round,
        evaluation_url: impl Into<String>,
    ) -> Result<Self> {
        let task_id = task_id.into();
        let evaluation_url = evaluation_url.into();

        if task_id.trim().is_empty() {
            return Err(CoreError::MissingField("task"));
        }
        if task_id.contains('/') || task_id.chars().any(char::is_whitespace) {
            return Err(CoreError::Validation(format!(
                "Task id is not a valid project name: {}",
                task_id
            )));
        }
        if evaluation_url.trim().is_empty() {
            return Err(CoreError::MissingField("evaluation_url"));
        }

        Ok(Self {
            task_id,
            round,
            nonce: String::new(),
            brief: String::new(),
            checks: Vec::new(),
            attachments: Vec::new(),
            evaluation_url,
            received_at: Utc::now(),
        })
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }

    pub fn with_checks(mut self, checks: Vec<String>) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn operation(&self) -> PublishOperation {
        self.round.operation()
    }
}
