//! SurrealDB persistence layer for the school administration backend.
//!
//! Provides connection management, schema setup, and repositories for
//! registrations, contact messages, admin users, and settings.

mod connection;
mod schema;

pub mod repositories;

pub use connection::{Database, DbConfig, DbError, get_db, init_db};
pub use schema::init_schema;

/// Initialize the database connection and schema in one step.
pub async fn init(config: DbConfig) -> Result<(), DbError> {
    init_db(config).await?;
    init_schema().await?;
    Ok(())
}
