//! Bearer-token authentication for the admin surface.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use db::repositories::AdminUser;

use crate::error::ApiError;
use crate::state::AppState;

/// Token lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried in admin tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin account id.
    pub sub: i64,
    pub email: String,
    pub role: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Issue a signed HS256 token for an admin account.
pub fn issue_token(secret: &str, user: &AdminUser) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify a bearer token and return its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::InvalidToken)
}

/// Extract the bearer token from an Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware guarding admin routes. Verified claims are stored as a
/// request extension for handlers that need the caller's identity.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or(ApiError::MissingToken)?
        .to_string();

    let claims = verify_token(&state.config.jwt_secret, &token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
