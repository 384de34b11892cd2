//! Public endpoints: registration intake and the contact form.

use axum::Json;
use axum::extract::State;
use school_core::{JobId, Registration};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use actors::SubmitOutcome;
use db::repositories::MessageRepository;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for a registration submission.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResponse {
    /// The row was committed synchronously.
    #[serde(rename_all = "camelCase")]
    Inserted { id: i64, duration_ms: u64 },
    /// The submission waits in the fallback queue.
    #[serde(rename_all = "camelCase")]
    Queued { job_id: JobId, queue_position: usize },
}

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> Result<Json<SubmitResponse>, ApiError> {
    validate_registration(&payload)?;

    let response = match state.intake.submit(payload).await? {
        SubmitOutcome::Inserted { id, duration_ms } => SubmitResponse::Inserted { id, duration_ms },
        SubmitOutcome::Queued {
            job_id,
            queue_position,
        } => SubmitResponse::Queued {
            job_id,
            queue_position,
        },
    };

    Ok(Json(response))
}

fn validate_registration(payload: &Registration) -> Result<(), ApiError> {
    let required = [
        ("firstName", &payload.first_name),
        ("lastName", &payload.last_name),
        ("dateOfBirth", &payload.date_of_birth),
        ("gender", &payload.gender),
        ("email", &payload.email),
        ("phone", &payload.phone),
        ("address", &payload.address),
        ("program", &payload.program),
        ("grade", &payload.grade),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Missing required field: {field}"
            )));
        }
    }

    if !is_valid_email(&payload.email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    Ok(())
}

/// Shape check only: non-empty local part, one '@', dotted domain,
/// no whitespace. Real verification belongs to an email round-trip.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Contact form payload.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// `POST /api/contact`
pub async fn contact(
    State(_state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<Value>, ApiError> {
    if form.name.trim().is_empty()
        || form.email.trim().is_empty()
        || form.message.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Name, email, and message are required".to_string(),
        ));
    }

    let message =
        MessageRepository::create(&form.name, &form.email, form.phone.as_deref(), &form.message)
            .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Message sent successfully",
        "id": message.id,
    })))
}
