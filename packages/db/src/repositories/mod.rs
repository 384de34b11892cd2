//! Repositories for database operations.

mod message_repo;
mod registration_repo;
mod settings_repo;
mod user_repo;

pub use message_repo::MessageRepository;
pub use registration_repo::{ProgramCount, RegistrationFilter, RegistrationRepository};
pub use settings_repo::SettingsRepository;
pub use user_repo::{AdminUser, UserRepository};

use surrealdb::sql::{Id, Thing};

use crate::{Database, DbError};

/// Extract the integer part of a numeric record id.
fn numeric_id(thing: &Thing) -> i64 {
    match &thing.id {
        Id::Number(n) => *n,
        // Counter-issued ids are always numeric; anything else is a
        // hand-crafted record and maps to 0.
        _ => 0,
    }
}

/// Issue the next integer id for `table` from its counter record.
async fn next_id(db: &Database, table: &str) -> Result<i64, DbError> {
    #[derive(serde::Deserialize)]
    struct Counter {
        value: i64,
    }

    let mut result = db
        .query("UPSERT type::thing('counter', $table) SET value += 1 RETURN AFTER")
        .bind(("table", table.to_string()))
        .await?;

    let counter: Option<Counter> = result.take(0)?;
    counter
        .map(|c| c.value)
        .ok_or_else(|| DbError::Query(format!("Failed to bump counter for {table}")))
}
