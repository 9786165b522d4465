//! Authenticated identity extraction
//!
//! The auth service in front of this backend verifies credentials and
//! installs `x-user-id` / `x-user-role` headers on every proxied request.
//! This backend trusts those headers without re-verification; it must never
//! be exposed without the gateway in front of it.

use crate::error::{AppError, AppErrorKind, AuthError};
use axum::extract::FromRequestParts;
use http::request::Parts;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Identity of the caller, as asserted by the auth gateway
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject non-admin callers
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::new(AppErrorKind::Auth(AuthError::Forbidden {
                required_role: "admin".to_string(),
            })))
        }
    }

    pub fn from_headers(headers: &http::HeaderMap) -> Result<Self, AppError> {
        let id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("missing x-user-id header"))?;
        let id = Uuid::parse_str(id).map_err(|_| unauthorized("x-user-id is not a valid UUID"))?;

        let role = match headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("user")
        {
            "admin" => Role::Admin,
            _ => Role::User,
        };

        Ok(Self { id, role })
    }
}

fn unauthorized(reason: &str) -> AppError {
    AppError::new(AppErrorKind::Auth(AuthError::Unauthorized {
        reason: reason.to_string(),
    }))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};

    #[test]
    fn identity_parses_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_static("6f0e6a30-0e65-4b72-9f2e-3f4f7b1f2f10"),
        );
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("admin"));

        let user = AuthUser::from_headers(&headers).expect("identity should parse");
        assert!(user.is_admin());
        assert!(user.require_admin().is_ok());
    }

    #[test]
    fn missing_user_id_is_unauthorized() {
        let headers = HeaderMap::new();
        let err = AuthUser::from_headers(&headers).expect_err("should reject");
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn malformed_user_id_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let err = AuthUser::from_headers(&headers).expect_err("should reject");
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn unknown_role_defaults_to_user() {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_static("6f0e6a30-0e65-4b72-9f2e-3f4f7b1f2f10"),
        );
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("superuser"));
        let user = AuthUser::from_headers(&headers).expect("identity should parse");
        assert_eq!(user.role, Role::User);
        assert!(user.require_admin().is_err());
    }
}
