//! Admin endpoints: login, registration review, messages, reports,
//! dashboard stats, queue and metrics inspection, settings.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use school_core::{MessageStatus, RegistrationRecord, RegistrationStatus};
use serde::Deserialize;
use serde_json::{Value, json};

use db::repositories::{
    MessageRepository, RegistrationFilter, RegistrationRepository, SettingsRepository,
    UserRepository,
};

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// Most queued jobs shown by queue inspection.
const QUEUE_PREVIEW_LIMIT: usize = 50;

/// Default number of metrics returned when the caller does not ask
/// for a specific count.
const DEFAULT_METRICS_COUNT: usize = 50;

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/admin/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = UserRepository::verify_credentials(&request.email, &request.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = auth::issue_token(&state.config.jwt_secret, &user)?;
    tracing::info!("Admin login: {}", user.email);

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}

/// Listing query for registrations.
#[derive(Debug, Deserialize)]
pub struct RegistrationQuery {
    pub status: Option<String>,
    pub program: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `GET /api/admin/registrations`
pub async fn list_registrations(
    State(_state): State<AppState>,
    Query(query): Query<RegistrationQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = RegistrationFilter {
        status: normalize_filter(query.status),
        program: normalize_filter(query.program),
        page: query.page.max(1),
        limit: query.limit,
        ..Default::default()
    };

    let (registrations, total) = RegistrationRepository::list(&filter).await?;

    Ok(Json(json!({
        "registrations": registrations,
        "total": total,
        "page": filter.page,
        "totalPages": total_pages(total, filter.limit),
    })))
}

/// Status update payload.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// `PUT /api/admin/registrations/{id}`
pub async fn update_registration(
    State(_state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    let status = RegistrationStatus::from_str(&update.status)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = RegistrationRepository::update_status(id, status).await?;
    tracing::info!("Registration {id} set to {status}");

    Ok(Json(json!({
        "message": "Registration updated successfully",
        "registration": record,
    })))
}

/// `DELETE /api/admin/registrations/{id}`
pub async fn delete_registration(
    State(_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    RegistrationRepository::delete(id).await?;
    tracing::info!("Registration {id} deleted");

    Ok(Json(json!({ "message": "Registration deleted successfully" })))
}

/// Listing query for contact messages.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `GET /api/admin/messages`
pub async fn list_messages(
    State(_state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = normalize_filter(query.status);
    let messages =
        MessageRepository::list(status.as_deref(), query.page.max(1), query.limit).await?;

    Ok(Json(json!({ "messages": messages })))
}

/// `PUT /api/admin/messages/{id}`
pub async fn update_message(
    State(_state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    let status = match update.status.as_str() {
        "unread" => MessageStatus::Unread,
        "read" => MessageStatus::Read,
        other => {
            return Err(ApiError::BadRequest(format!(
                "invalid message status: {other}"
            )));
        }
    };

    let message = MessageRepository::update_status(id, status).await?;

    Ok(Json(json!({
        "message": "Message updated successfully",
        "contactMessage": message,
    })))
}

/// Report query: registration filters plus an output format.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub status: Option<String>,
    pub program: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// "json" (default) or "csv".
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_report_limit")]
    pub limit: usize,
}

fn default_report_limit() -> usize {
    50
}

/// `GET /api/admin/reports`
pub async fn reports(
    State(_state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let csv_format = query.format.as_deref() == Some("csv");

    let filter = RegistrationFilter {
        status: normalize_filter(query.status),
        program: normalize_filter(query.program),
        grade: normalize_filter(query.grade),
        start_date: query.start_date,
        end_date: query.end_date,
        page: query.page.max(1),
        // CSV downloads always cover the full filtered set.
        limit: if csv_format { 0 } else { query.limit },
    };

    let (registrations, total) = RegistrationRepository::list(&filter).await?;

    if csv_format {
        let body = registrations_csv(&registrations);
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"registrations_report.csv\"",
                ),
            ],
            body,
        )
            .into_response());
    }

    Ok(Json(json!({
        "registrations": registrations,
        "total": total,
        "page": filter.page,
        "totalPages": total_pages(total, filter.limit),
    }))
    .into_response())
}

/// `GET /api/admin/stats`
pub async fn stats(State(_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let by_status = RegistrationRepository::count_by_status().await?;
    let total = RegistrationRepository::total().await?;
    let by_program = RegistrationRepository::count_by_program().await?;
    let unread_messages = MessageRepository::count_unread().await?;

    Ok(Json(json!({
        "totalRegistrations": total,
        "registrationsByStatus": by_status,
        "programDistribution": by_program,
        "unreadMessages": unread_messages,
    })))
}

/// `GET /api/admin/queue`
pub async fn queue_state(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let queue_length = state.intake.queue_len().await?;
    let preview = state.intake.queue_preview(QUEUE_PREVIEW_LIMIT).await?;

    Ok(Json(json!({
        "queueLength": queue_length,
        "preview": preview,
    })))
}

/// Metrics query.
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub count: Option<usize>,
}

/// `GET /api/admin/metrics`
pub async fn recent_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Value>, ApiError> {
    let ring = state.intake.metrics();
    let count = query
        .count
        .unwrap_or(DEFAULT_METRICS_COUNT)
        .min(ring.capacity());

    Ok(Json(json!({ "metrics": ring.snapshot(count) })))
}

/// `GET /api/admin/settings`
pub async fn get_settings(State(_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let settings = SettingsRepository::get_all().await?;
    Ok(Json(Value::Object(settings)))
}

/// `PUT /api/admin/settings`
pub async fn put_settings(
    State(_state): State<AppState>,
    Json(settings): Json<serde_json::Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    SettingsRepository::upsert_many(&settings).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Settings updated successfully",
    })))
}

/// Treat missing, empty, and "all" filter values alike.
fn normalize_filter(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "all")
}

fn total_pages(total: usize, limit: usize) -> usize {
    if limit == 0 { 1 } else { total.div_ceil(limit) }
}

fn registrations_csv(rows: &[RegistrationRecord]) -> String {
    let mut csv = String::from(
        "ID,First Name,Last Name,Date of Birth,Gender,Email,Phone,Address,\
         Program,Grade,Parent Name,Parent Phone,Previous School,Status,Created At\n",
    );

    for row in rows {
        let r = &row.registration;
        let fields = [
            row.id.to_string(),
            r.first_name.clone(),
            r.last_name.clone(),
            r.date_of_birth.clone(),
            r.gender.clone(),
            r.email.clone(),
            r.phone.clone(),
            r.address.clone(),
            r.program.clone(),
            r.grade.clone(),
            r.parent_name.clone().unwrap_or_default(),
            r.parent_phone.clone().unwrap_or_default(),
            r.previous_school.clone().unwrap_or_default(),
            row.status.to_string(),
            row.created_at.to_rfc3339(),
        ];

        let line: Vec<String> = fields.iter().map(|f| csv_quote(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }

    csv
}

fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_core::Registration;

    #[test]
    fn csv_escapes_quotes_and_commas() {
        let now = chrono::Utc::now();
        let rows = vec![RegistrationRecord {
            id: 7,
            registration: Registration {
                first_name: "Anna \"Ann\"".to_string(),
                last_name: "Doe, Jr.".to_string(),
                date_of_birth: "2010-05-05".to_string(),
                gender: "female".to_string(),
                email: "anna@example.com".to_string(),
                phone: "123".to_string(),
                address: "1 Main St".to_string(),
                program: "primary".to_string(),
                grade: "3".to_string(),
                parent_name: None,
                parent_phone: None,
                previous_school: None,
                medical_info: None,
                newsletter: false,
            },
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        }];

        let csv = registrations_csv(&rows);
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("ID,First Name"));

        let line = lines.next().unwrap();
        assert!(line.contains("\"Anna \"\"Ann\"\"\""));
        assert!(line.contains("\"Doe, Jr.\""));
        assert!(line.contains("\"pending\""));
    }

    #[test]
    fn filter_normalization() {
        assert_eq!(normalize_filter(None), None);
        assert_eq!(normalize_filter(Some("".to_string())), None);
        assert_eq!(normalize_filter(Some("all".to_string())), None);
        assert_eq!(
            normalize_filter(Some("pending".to_string())),
            Some("pending".to_string())
        );
    }

    #[test]
    fn page_math() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 10), 1);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(100, 0), 1);
    }
}
