//! Admin authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, matches it against the
//! configured admin and staff tokens and injects an [`AdminIdentity`] into
//! the request extensions. Tokens are compared as SHA-256 digests in
//! constant time; the plaintext tokens are not kept after startup.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Who is calling an admin route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub name: &'static str,
    /// Whether the caller may read leads.
    pub privileged: bool,
}

/// SHA-256 digests of the accepted bearer tokens.
#[derive(Clone, Default)]
pub struct AdminTokens {
    admin: Option<[u8; 32]>,
    staff: Option<[u8; 32]>,
}

impl std::fmt::Debug for AdminTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminTokens")
            .field("admin", &self.admin.is_some())
            .field("staff", &self.staff.is_some())
            .finish()
    }
}

/// Hex SHA-256 of a token, for log correlation without leaking it.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(digest(token))
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

impl AdminTokens {
    #[must_use]
    pub fn new(admin: Option<&str>, staff: Option<&str>) -> Self {
        Self {
            admin: admin.map(digest),
            staff: staff.map(digest),
        }
    }

    /// Whether an admin token is configured at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.admin.is_some()
    }

    /// Identity for a presented token. With no admin token configured every
    /// token is rejected, the staff token included.
    #[must_use]
    pub fn identify(&self, token: &str) -> Option<AdminIdentity> {
        let admin = self.admin?;
        let presented = digest(token);
        if bool::from(presented[..].ct_eq(&admin[..])) {
            return Some(AdminIdentity {
                name: "admin",
                privileged: true,
            });
        }
        let staff = self.staff?;
        bool::from(presented[..].ct_eq(&staff[..])).then_some(AdminIdentity {
            name: "staff",
            privileged: false,
        })
    }
}

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticate admin routes. Missing or unknown tokens get `401`.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer(&req) else {
        return AppError::Unauthorized("missing bearer token".to_owned()).into_response();
    };

    match state.admin_tokens.identify(token) {
        Some(identity) => {
            tracing::debug!(admin = identity.name, "admin request authenticated");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => {
            tracing::warn!(token_hash = %hash_token(token), "rejected admin token");
            AppError::Unauthorized("invalid token".to_owned()).into_response()
        }
    }
}

/// Refuse authenticated but unprivileged callers with `403`.
pub async fn require_privileged(req: Request, next: Next) -> Response {
    match req.extensions().get::<AdminIdentity>() {
        Some(identity) if identity.privileged => next.run(req).await,
        Some(identity) => {
            tracing::info!(admin = identity.name, "access denied to lead data");
            AppError::Forbidden("access denied: admin privileges required".to_owned())
                .into_response()
        }
        None => AppError::Unauthorized("missing bearer token".to_owned()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_admin_and_staff() {
        let tokens = AdminTokens::new(Some("adm-secret"), Some("staff-secret"));
        assert_eq!(
            tokens.identify("adm-secret"),
            Some(AdminIdentity {
                name: "admin",
                privileged: true
            })
        );
        assert_eq!(
            tokens.identify("staff-secret").map(|i| i.privileged),
            Some(false)
        );
        assert_eq!(tokens.identify("guess"), None);
    }

    #[test]
    fn no_admin_token_rejects_everyone() {
        let tokens = AdminTokens::new(None, Some("staff-secret"));
        assert!(!tokens.is_enabled());
        assert_eq!(tokens.identify("staff-secret"), None);
        assert_eq!(tokens.identify(""), None);
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(hash_token("abc").len(), 64);
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
