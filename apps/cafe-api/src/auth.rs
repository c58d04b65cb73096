//! JWT authentication module.
//!
//! Verifies HS256 bearer tokens issued by the external auth service and
//! guards `/api/*` routes. Token issuance lives elsewhere.
//!
//! ```text
//! request ──► require_auth ──► /api/* ? ──► Authorization: Bearer <jwt>
//!                  │                              │
//!                  │ no secret configured         ▼
//!                  │ or not /api/*        JwtManager::validate_token
//!                  ▼                              │
//!                handler ◄──── Claims in request extensions
//! ```

use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff id)
    pub sub: String,

    /// Role granted by the auth service (e.g. "owner", "manager")
    pub role: String,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token verifier.
pub struct JwtManager {
    secret: String,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: impl Into<String>) -> Self {
        JwtManager {
            secret: secret.into(),
        }
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager").finish_non_exhaustive()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware.
///
/// Runs only when a JWT secret is configured. Skips non-API paths and CORS
/// preflight requests.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(jwt) = state.jwt.as_deref() else {
        return Ok(next.run(req).await);
    };

    if req.method() == Method::OPTIONS || !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| {
            warn!(path = %req.uri().path(), "Missing bearer token");
            ApiError::unauthorized("Missing bearer token")
        })?;

    let claims = jwt.validate_token(token)?;
    debug!(sub = %claims.sub, role = %claims.role, "Request authenticated");

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp_offset: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: "lan".to_string(),
            role: "manager".to_string(),
            exp: (now + exp_offset).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_token() {
        let jwt = JwtManager::new("secret");

        let claims = jwt
            .validate_token(&token("secret", Duration::hours(1)))
            .unwrap();
        assert_eq!(claims.sub, "lan");
        assert_eq!(claims.role, "manager");

        assert!(jwt.validate_token(&token("other", Duration::hours(1))).is_err());
        assert!(jwt.validate_token(&token("secret", -Duration::hours(1))).is_err());
        assert!(jwt.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic dXNlcg=="), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }
}
