use sitesmith_core::TaskStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: TaskStage, to: TaskStage },

    #[error("Generation failed: {0}")]
    Generation(#[from] llm::LlmError),

    #[error("Publish failed: {0}")]
    Publish(#[from] github::GitHubError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl OrchestratorError {
    /// Stage in which this error stops a task.
    pub fn failed_stage(&self) -> Option<TaskStage> {
        match self {
            Self::Generation(_) => Some(TaskStage::Generating),
            Self::Publish(_) => Some(TaskStage::Publishing),
            Self::InvalidTransition { .. } | Self::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
