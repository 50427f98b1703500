use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outcome::OutcomeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Capture,
    Recognition,
    Enrollment,
    Moderation,
}

/// Immutable record of one user-triggered action, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    pub payload: ActivityPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActivityPayload {
    FramesCaptured { count: usize, elapsed_ms: u64 },
    Recognized { outcome: OutcomeKind, name: Option<String> },
    EnrollmentSubmitted { name: String, accepted: bool },
    Command { action: String, target: i64, success: bool },
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, payload: ActivityPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }
}
