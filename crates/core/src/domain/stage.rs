use serde::{Deserialize, Serialize};

/// Position of a task in the build pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    #[default]
    Received,
    Generating,
    Publishing,
    AwaitingLive,
    Notifying,
    Done,
    Failed,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Generating => "generating",
            Self::Publishing => "publishing",
            Self::AwaitingLive => "awaiting_live",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received" => Some(Self::Received),
            "generating" => Some(Self::Generating),
            "publishing" => Some(Self::Publishing),
            "awaiting_live" => Some(Self::AwaitingLive),
            "notifying" => Some(Self::Notifying),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for TaskStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
