//! Persistence gateway trait and the SurrealDB-backed implementation.

use std::future::Future;
use std::pin::Pin;

use school_core::{Registration, RegistrationRecord};

use db::repositories::RegistrationRepository;

/// Errors surfaced by gateway operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// A uniqueness or schema constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The storage backend failed or was unreachable.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<db::DbError> for GatewayError {
    fn from(err: db::DbError) -> Self {
        match &err {
            db::DbError::Connection(inner) if inner.to_string().contains("already contains") => {
                GatewayError::Constraint(inner.to_string())
            }
            _ => GatewayError::Storage(err.to_string()),
        }
    }
}

/// Future type for async gateway calls.
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send>>;

/// Storage operations the intake core needs from the persistence layer.
///
/// Implement this trait to back the intake path with a different store;
/// tests substitute a scriptable in-memory implementation.
pub trait RegistrationGateway: Send + Sync + 'static {
    /// Insert a registration, returning the committed record.
    fn insert(&self, registration: Registration) -> GatewayFuture<RegistrationRecord>;

    /// Look up the id of an existing registration with this email.
    fn find_by_email(&self, email: String) -> GatewayFuture<Option<i64>>;
}

/// SurrealDB-backed gateway.
pub struct SurrealGateway;

impl RegistrationGateway for SurrealGateway {
    fn insert(&self, registration: Registration) -> GatewayFuture<RegistrationRecord> {
        Box::pin(async move {
            RegistrationRepository::create(&registration)
                .await
                .map_err(GatewayError::from)
        })
    }

    fn find_by_email(&self, email: String) -> GatewayFuture<Option<i64>> {
        Box::pin(async move {
            RegistrationRepository::find_by_email(&email)
                .await
                .map_err(GatewayError::from)
        })
    }
}
