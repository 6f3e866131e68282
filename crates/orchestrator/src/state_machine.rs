use sitesmith_core::TaskStage;

use crate::error::{OrchestratorError, Result};

pub struct StageMachine;

impl StageMachine {
    pub fn validate_transition(from: TaskStage, to: TaskStage) -> Result<()> {
        if Self::allowed_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition { from, to })
        }
    }

    fn allowed_transitions(from: TaskStage) -> &'static [TaskStage] {
        match from {
            TaskStage::Received => &[TaskStage::Generating],
            TaskStage::Generating => &[TaskStage::Publishing, TaskStage::Failed],
            TaskStage::Publishing => &[TaskStage::AwaitingLive, TaskStage::Failed],
            // A site that never comes up is still reported.
            TaskStage::AwaitingLive => &[TaskStage::Notifying],
            TaskStage::Notifying => &[TaskStage::Done],
            TaskStage::Done | TaskStage::Failed => &[],
        }
    }

    pub fn can_transition(from: TaskStage, to: TaskStage) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_stage(current: TaskStage) -> Option<TaskStage> {
        match current {
            TaskStage::Received => Some(TaskStage::Generating),
            TaskStage::Generating => Some(TaskStage::Publishing),
            TaskStage::Publishing => Some(TaskStage::AwaitingLive),
            TaskStage::AwaitingLive => Some(TaskStage::Notifying),
            TaskStage::Notifying => Some(TaskStage::Done),
            TaskStage::Done | TaskStage::Failed => None,
        }
    }
}
