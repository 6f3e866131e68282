//! Event types for the sitesmith event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A build request passed validation and was queued
    #[serde(rename = "task.accepted")]
    TaskAccepted { task_id: String, round: u32 },

    /// The pipeline moved a task to another stage
    #[serde(rename = "task.stage_changed")]
    StageChanged {
        task_id: String,
        round: u32,
        from: String,
        to: String,
    },

    /// One delivery attempt to the evaluation callback
    #[serde(rename = "notification.attempted")]
    NotificationAttempted {
        task_id: String,
        attempt: u32,
        status: Option<u16>,
        success: bool,
    },

    /// The pipeline reached a terminal stage
    #[serde(rename = "task.finished")]
    TaskFinished {
        task_id: String,
        round: u32,
        stage: String,
        live: bool,
        notified: bool,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the task ID associated with this event, if any
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Event::TaskAccepted { task_id, .. }
            | Event::StageChanged { task_id, .. }
            | Event::NotificationAttempted { task_id, .. }
            | Event::TaskFinished { task_id, .. } => Some(task_id),
            Event::Error { .. } => None,
        }
    }
}
