//! Registration repository for CRUD operations.

use school_core::{Registration, RegistrationRecord, RegistrationStatus};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

use super::{next_id, numeric_id};

/// Repository for registration persistence operations.
pub struct RegistrationRepository;

/// Write shape for new rows.
///
/// Timestamps are left to the schema defaults so the database clock is the
/// single source of truth for created_at/updated_at.
#[derive(Debug, Serialize)]
struct RegistrationCreate {
    #[serde(flatten)]
    registration: Registration,
    status: RegistrationStatus,
}

/// Read shape for stored rows.
#[derive(Debug, Deserialize)]
struct RegistrationRow {
    id: Thing,
    #[serde(flatten)]
    registration: Registration,
    status: RegistrationStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl RegistrationRow {
    fn into_record(self) -> RegistrationRecord {
        RegistrationRecord {
            id: numeric_id(&self.id),
            registration: self.registration,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Filter options for listing registrations.
#[derive(Debug, Default, Clone)]
pub struct RegistrationFilter {
    pub status: Option<String>,
    pub program: Option<String>,
    pub grade: Option<String>,
    /// Inclusive lower bound, "YYYY-MM-DD".
    pub start_date: Option<String>,
    /// Inclusive upper bound, "YYYY-MM-DD".
    pub end_date: Option<String>,
    /// 1-based page number.
    pub page: usize,
    /// Page size; 0 disables pagination.
    pub limit: usize,
}

impl RegistrationFilter {
    fn conditions(&self) -> (String, Vec<(&'static str, String)>) {
        let mut conditions = Vec::new();
        let mut bindings: Vec<(&'static str, String)> = Vec::new();

        if let Some(status) = &self.status {
            conditions.push("status = $status");
            bindings.push(("status", status.clone()));
        }

        if let Some(program) = &self.program {
            conditions.push("program = $program");
            bindings.push(("program", program.clone()));
        }

        if let Some(grade) = &self.grade {
            conditions.push("grade = $grade");
            bindings.push(("grade", grade.clone()));
        }

        if let Some(start) = &self.start_date {
            conditions.push("created_at >= type::datetime($start_date)");
            bindings.push(("start_date", format!("{start}T00:00:00Z")));
        }

        if let Some(end) = &self.end_date {
            conditions.push("created_at <= type::datetime($end_date)");
            bindings.push(("end_date", format!("{end}T23:59:59Z")));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, bindings)
    }
}

/// Per-program registration count for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramCount {
    pub program: String,
    pub count: u64,
}

impl RegistrationRepository {
    /// Insert a new registration with a counter-issued integer id.
    ///
    /// Fails if another row already holds this email (unique index).
    pub async fn create(registration: &Registration) -> Result<RegistrationRecord, DbError> {
        let db = get_db()?;
        let id = next_id(db, "registration").await?;

        let record: Option<RegistrationRow> = db
            .create(("registration", id))
            .content(RegistrationCreate {
                registration: registration.clone(),
                status: RegistrationStatus::Pending,
            })
            .await?;

        record
            .map(RegistrationRow::into_record)
            .ok_or_else(|| DbError::Query("Failed to create registration".into()))
    }

    /// Get a registration by id.
    pub async fn get(id: i64) -> Result<RegistrationRecord, DbError> {
        let db = get_db()?;

        let record: Option<RegistrationRow> = db.select(("registration", id)).await?;

        record
            .map(RegistrationRow::into_record)
            .ok_or_else(|| DbError::NotFound(format!("Registration not found: {id}")))
    }

    /// Look up the id of a registration with this email, if one exists.
    pub async fn find_by_email(email: &str) -> Result<Option<i64>, DbError> {
        let db = get_db()?;

        #[derive(Deserialize)]
        struct IdRow {
            id: Thing,
        }

        let mut result = db
            .query("SELECT id FROM registration WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;

        let rows: Vec<IdRow> = result.take(0)?;
        Ok(rows.first().map(|r| numeric_id(&r.id)))
    }

    /// List registrations with filtering and pagination, newest first.
    ///
    /// Returns the page of rows plus the total row count for the filter.
    pub async fn list(
        filter: &RegistrationFilter,
    ) -> Result<(Vec<RegistrationRecord>, usize), DbError> {
        let db = get_db()?;
        let (where_clause, bindings) = filter.conditions();

        let page_clause = if filter.limit > 0 {
            // Clamped so an absurd page number cannot overflow the offset
            // or exceed the database's integer range.
            let start = filter
                .page
                .saturating_sub(1)
                .saturating_mul(filter.limit)
                .min(i64::MAX as usize);
            format!("LIMIT {} START {}", filter.limit, start)
        } else {
            String::new()
        };

        let query = format!(
            "SELECT * FROM registration {where_clause} ORDER BY created_at DESC {page_clause}"
        );

        let mut request = db.query(&query);
        for (name, value) in bindings.clone() {
            request = request.bind((name, value));
        }

        let mut response = request.await?;
        let rows: Vec<RegistrationRow> = response.take(0)?;
        let records = rows.into_iter().map(RegistrationRow::into_record).collect();

        let total = Self::count_where(&where_clause, bindings).await?;

        Ok((records, total))
    }

    /// Count registrations matching a where clause.
    async fn count_where(
        where_clause: &str,
        bindings: Vec<(&'static str, String)>,
    ) -> Result<usize, DbError> {
        let db = get_db()?;

        #[derive(Deserialize)]
        struct CountRow {
            count: i64,
        }

        let query = format!("SELECT count() AS count FROM registration {where_clause} GROUP ALL");

        let mut request = db.query(&query);
        for (name, value) in bindings {
            request = request.bind((name, value));
        }

        let mut response = request.await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map(|r| r.count as usize).unwrap_or(0))
    }

    /// Total number of registrations.
    pub async fn total() -> Result<usize, DbError> {
        Self::count_where("", Vec::new()).await
    }

    /// Update a registration's review status.
    pub async fn update_status(
        id: i64,
        status: RegistrationStatus,
    ) -> Result<RegistrationRecord, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE type::thing('registration', $id) \
                 SET status = $status, updated_at = time::now() RETURN AFTER",
            )
            .bind(("id", id))
            .bind(("status", status.as_str()))
            .await?;

        let record: Option<RegistrationRow> = result.take(0)?;
        record
            .map(RegistrationRow::into_record)
            .ok_or_else(|| DbError::NotFound(format!("Registration not found: {id}")))
    }

    /// Delete a registration.
    pub async fn delete(id: i64) -> Result<(), DbError> {
        let db = get_db()?;

        let deleted: Option<RegistrationRow> = db.delete(("registration", id)).await?;
        deleted
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("Registration not found: {id}")))
    }

    /// Count registrations grouped by status.
    pub async fn count_by_status() -> Result<std::collections::HashMap<String, u64>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query("SELECT status, count() AS count FROM registration GROUP BY status")
            .await?;

        #[derive(Deserialize)]
        struct StatusCount {
            status: Option<String>,
            count: i64,
        }

        let counts: Vec<StatusCount> = result.take(0)?;

        let mut map = std::collections::HashMap::new();
        for count in counts {
            if let Some(status) = count.status {
                map.insert(status, count.count as u64);
            }
        }

        Ok(map)
    }

    /// Count registrations grouped by program, for the dashboard.
    pub async fn count_by_program() -> Result<Vec<ProgramCount>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT program, count() AS count FROM registration \
                 GROUP BY program ORDER BY count DESC",
            )
            .await?;

        let counts: Vec<ProgramCount> = result.take(0)?;
        Ok(counts)
    }
}
