//! Event types for real-time updates.

use serde::{Deserialize, Serialize};

use crate::RegistrationRecord;

/// Events fanned out to connected admin dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchoolEvent {
    /// A registration was committed to the database.
    Registration { registration: RegistrationRecord },
}

impl SchoolEvent {
    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            SchoolEvent::Registration { registration } => format!(
                "Registration {} committed ({})",
                registration.id, registration.registration.email
            ),
        }
    }
}
