//! Registration domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registration submission as received from the public enrollment form.
///
/// Required-field and email-shape validation happens at the HTTP boundary;
/// by the time a payload reaches the intake path it is well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Academic program applied for.
    pub program: String,
    /// Grade level applied for.
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_info: Option<String>,
    /// Whether the applicant opted into the newsletter.
    #[serde(default)]
    pub newsletter: bool,
}

/// Review status of a committed registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Awaiting admin review.
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid registration status: {0}")]
pub struct InvalidStatus(pub String);

impl std::str::FromStr for RegistrationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// A committed registration row, as stored, listed, and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Monotonically increasing integer id issued by the database.
    pub id: i64,
    #[serde(flatten)]
    pub registration: Registration,
    pub status: RegistrationStatus,
    /// When the row was committed.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}
