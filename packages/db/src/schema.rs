//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    db.query(REGISTRATION_SCHEMA).await?;
    db.query(CONTACT_MESSAGE_SCHEMA).await?;
    db.query(ADMIN_USER_SCHEMA).await?;
    db.query(SETTING_SCHEMA).await?;
    db.query(COUNTER_SCHEMA).await?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Registration table schema.
///
/// Form fields keep their camelCase wire names; bookkeeping columns are
/// snake_case. The unique email index backs the duplicate check.
const REGISTRATION_SCHEMA: &str = r#"
-- Registration table for enrollment submissions
DEFINE TABLE IF NOT EXISTS registration SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS firstName ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS lastName ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS dateOfBirth ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS gender ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS email ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS phone ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS address ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS program ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS grade ON registration TYPE string;
DEFINE FIELD IF NOT EXISTS parentName ON registration TYPE option<string>;
DEFINE FIELD IF NOT EXISTS parentPhone ON registration TYPE option<string>;
DEFINE FIELD IF NOT EXISTS previousSchool ON registration TYPE option<string>;
DEFINE FIELD IF NOT EXISTS medicalInfo ON registration TYPE option<string>;
DEFINE FIELD IF NOT EXISTS newsletter ON registration TYPE bool DEFAULT false;
DEFINE FIELD IF NOT EXISTS status ON registration TYPE string DEFAULT "pending";
DEFINE FIELD IF NOT EXISTS created_at ON registration TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON registration TYPE datetime DEFAULT time::now();

-- Indexes for efficient lookups
DEFINE INDEX IF NOT EXISTS registration_email ON registration FIELDS email UNIQUE;
DEFINE INDEX IF NOT EXISTS registration_status ON registration FIELDS status;
DEFINE INDEX IF NOT EXISTS registration_program ON registration FIELDS program;
DEFINE INDEX IF NOT EXISTS registration_created ON registration FIELDS created_at;
"#;

/// Contact message table schema.
const CONTACT_MESSAGE_SCHEMA: &str = r#"
-- Contact messages from the public contact form
DEFINE TABLE IF NOT EXISTS contact_message SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS name ON contact_message TYPE string;
DEFINE FIELD IF NOT EXISTS email ON contact_message TYPE string;
DEFINE FIELD IF NOT EXISTS phone ON contact_message TYPE option<string>;
DEFINE FIELD IF NOT EXISTS message ON contact_message TYPE string;
DEFINE FIELD IF NOT EXISTS status ON contact_message TYPE string DEFAULT "unread";
DEFINE FIELD IF NOT EXISTS created_at ON contact_message TYPE datetime DEFAULT time::now();

DEFINE INDEX IF NOT EXISTS message_status ON contact_message FIELDS status;
DEFINE INDEX IF NOT EXISTS message_created ON contact_message FIELDS created_at;
"#;

/// Admin user table schema.
const ADMIN_USER_SCHEMA: &str = r#"
-- Admin accounts for the dashboard
DEFINE TABLE IF NOT EXISTS admin_user SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS username ON admin_user TYPE string;
DEFINE FIELD IF NOT EXISTS email ON admin_user TYPE string;
DEFINE FIELD IF NOT EXISTS password ON admin_user TYPE string;
DEFINE FIELD IF NOT EXISTS role ON admin_user TYPE string DEFAULT "admin";
DEFINE FIELD IF NOT EXISTS created_at ON admin_user TYPE datetime DEFAULT time::now();

DEFINE INDEX IF NOT EXISTS admin_user_email ON admin_user FIELDS email UNIQUE;
DEFINE INDEX IF NOT EXISTS admin_user_username ON admin_user FIELDS username UNIQUE;
"#;

/// Settings table schema.
///
/// Values are arbitrary JSON managed through the admin panel, so the table
/// stays schemaless.
const SETTING_SCHEMA: &str = r#"
-- Key/value website settings
DEFINE TABLE IF NOT EXISTS setting SCHEMALESS;
"#;

/// Counter table schema, used to issue integer record ids.
const COUNTER_SCHEMA: &str = r#"
-- Per-table monotonic id counters
DEFINE TABLE IF NOT EXISTS counter SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS value ON counter TYPE int DEFAULT 0;
"#;
