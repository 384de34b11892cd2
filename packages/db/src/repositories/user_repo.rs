//! Admin user repository.
//!
//! Passwords are hashed and verified inside SurrealQL via `crypto::argon2`,
//! so plaintext never leaves the query and hashes never reach Rust.

use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

use super::{next_id, numeric_id};

/// An admin account, without its password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: Thing,
    username: String,
    email: String,
    role: String,
}

impl UserRow {
    fn into_user(self) -> AdminUser {
        AdminUser {
            id: numeric_id(&self.id),
            username: self.username,
            email: self.email,
            role: self.role,
        }
    }
}

/// Repository for admin account operations.
pub struct UserRepository;

impl UserRepository {
    /// Create an admin account with an argon2-hashed password.
    pub async fn create(
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<AdminUser, DbError> {
        let db = get_db()?;
        let id = next_id(db, "admin_user").await?;

        let mut result = db
            .query(
                "CREATE type::thing('admin_user', $id) SET \
                 username = $username, \
                 email = $email, \
                 password = crypto::argon2::generate($password), \
                 role = $role",
            )
            .bind(("id", id))
            .bind(("username", username.to_string()))
            .bind(("email", email.to_string()))
            .bind(("password", password.to_string()))
            .bind(("role", role.to_string()))
            .await?;

        let record: Option<UserRow> = result.take(0)?;
        record
            .map(UserRow::into_user)
            .ok_or_else(|| DbError::Query("Failed to create admin user".into()))
    }

    /// Look up an admin account by email.
    pub async fn find_by_email(email: &str) -> Result<Option<AdminUser>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query("SELECT * FROM admin_user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;

        let rows: Vec<UserRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(UserRow::into_user))
    }

    /// Verify a login attempt. Returns the account on a password match.
    pub async fn verify_credentials(
        email: &str,
        password: &str,
    ) -> Result<Option<AdminUser>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM admin_user \
                 WHERE email = $email AND crypto::argon2::compare(password, $password) \
                 LIMIT 1",
            )
            .bind(("email", email.to_string()))
            .bind(("password", password.to_string()))
            .await?;

        let rows: Vec<UserRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(UserRow::into_user))
    }

    /// Seed the default admin account if no account holds this email yet.
    pub async fn ensure_default_admin(email: &str, password: &str) -> Result<(), DbError> {
        if Self::find_by_email(email).await?.is_some() {
            return Ok(());
        }

        Self::create("admin", email, password, "admin").await?;
        tracing::info!("Seeded default admin account: {email}");

        Ok(())
    }
}
