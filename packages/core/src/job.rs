//! Intake jobs: registrations whose immediate insert failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Registration;

/// Unique identifier for an intake job.
///
/// Ids are issued by a process-local monotonic counter, so they are never
/// reused within a process lifetime but do not survive a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registration waiting in the fallback queue for a retry insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationJob {
    /// Id shared with the submission's immediate insert attempt.
    pub id: JobId,
    /// When the submission was originally received, not when it is retried.
    pub received_at: DateTime<Utc>,
    /// The validated registration payload.
    pub payload: Registration,
}

impl RegistrationJob {
    /// Create a job for a submission received now.
    pub fn new(id: JobId, payload: Registration) -> Self {
        Self {
            id,
            received_at: Utc::now(),
            payload,
        }
    }

    /// Admin-facing view of this job.
    pub fn preview(&self) -> JobPreview {
        JobPreview {
            id: self.id,
            received_at: self.received_at,
            email: self.payload.email.clone(),
        }
    }
}

/// Bounded admin-facing view of a queued job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPreview {
    pub id: JobId,
    pub received_at: DateTime<Utc>,
    pub email: String,
}
