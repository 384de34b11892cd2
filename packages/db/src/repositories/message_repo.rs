//! Contact message repository.

use school_core::{ContactMessage, MessageStatus};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

use super::{next_id, numeric_id};

/// Repository for contact message persistence operations.
pub struct MessageRepository;

#[derive(Debug, Serialize)]
struct MessageCreate {
    name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    message: String,
    status: MessageStatus,
}

#[derive(Debug, Deserialize)]
struct MessageRow {
    id: Thing,
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    message: String,
    status: MessageStatus,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl MessageRow {
    fn into_message(self) -> ContactMessage {
        ContactMessage {
            id: numeric_id(&self.id),
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

impl MessageRepository {
    /// Store a new contact message with status `unread`.
    pub async fn create(
        name: &str,
        email: &str,
        phone: Option<&str>,
        message: &str,
    ) -> Result<ContactMessage, DbError> {
        let db = get_db()?;
        let id = next_id(db, "contact_message").await?;

        let record: Option<MessageRow> = db
            .create(("contact_message", id))
            .content(MessageCreate {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.map(str::to_string),
                message: message.to_string(),
                status: MessageStatus::Unread,
            })
            .await?;

        record
            .map(MessageRow::into_message)
            .ok_or_else(|| DbError::Query("Failed to create contact message".into()))
    }

    /// List messages, newest first, optionally filtered by status.
    pub async fn list(
        status: Option<&str>,
        page: usize,
        limit: usize,
    ) -> Result<Vec<ContactMessage>, DbError> {
        let db = get_db()?;

        let where_clause = if status.is_some() {
            "WHERE status = $status"
        } else {
            ""
        };

        let page_clause = if limit > 0 {
            // Clamped so an absurd page number cannot overflow the offset
            // or exceed the database's integer range.
            let start = page
                .saturating_sub(1)
                .saturating_mul(limit)
                .min(i64::MAX as usize);
            format!("LIMIT {limit} START {start}")
        } else {
            String::new()
        };

        let query = format!(
            "SELECT * FROM contact_message {where_clause} ORDER BY created_at DESC {page_clause}"
        );

        let mut request = db.query(&query);
        if let Some(status) = status {
            request = request.bind(("status", status.to_string()));
        }

        let mut response = request.await?;
        let rows: Vec<MessageRow> = response.take(0)?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    /// Update a message's read status.
    pub async fn update_status(id: i64, status: MessageStatus) -> Result<ContactMessage, DbError> {
        let db = get_db()?;

        let mut result = db
            .query("UPDATE type::thing('contact_message', $id) SET status = $status RETURN AFTER")
            .bind(("id", id))
            .bind(("status", status.as_str()))
            .await?;

        let record: Option<MessageRow> = result.take(0)?;
        record
            .map(MessageRow::into_message)
            .ok_or_else(|| DbError::NotFound(format!("Message not found: {id}")))
    }

    /// Number of unread messages.
    pub async fn count_unread() -> Result<usize, DbError> {
        let db = get_db()?;

        #[derive(Deserialize)]
        struct CountRow {
            count: i64,
        }

        let mut result = db
            .query(
                "SELECT count() AS count FROM contact_message \
                 WHERE status = 'unread' GROUP ALL",
            )
            .await?;

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count as usize).unwrap_or(0))
    }
}
