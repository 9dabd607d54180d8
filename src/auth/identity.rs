//! Per-request identity resolution.
//!
//! Each request resolves to exactly one principal: an authenticated user or
//! anonymous. There is no intermediate state. Resolution is read-only apart
//! from the token and session lookups themselves.

use anyhow::Result;
use axum::http::{HeaderMap, header};
use tower_sessions::Session;

use crate::db::{Store, User};

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// How the current principal authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Session,
    Token,
}

/// The resolved identity associated with one request.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Authenticated { user: User, mode: AuthMode },
}

impl Principal {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Resolve the request's credentials to a principal.
///
/// Order is fixed: a bearer token wins over a session, and a bearer header
/// that fails to resolve is explicitly failed authentication. It never falls
/// through to session auth; the request proceeds as anonymous and downstream
/// access checks reject it.
pub async fn resolve(store: &Store, headers: &HeaderMap, session: &Session) -> Result<Principal> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let Ok(header_str) = value.to_str() else {
            return Ok(Principal::Anonymous);
        };
        let Some(token) = header_str.strip_prefix("Bearer ") else {
            return Ok(Principal::Anonymous);
        };

        return Ok(match store.resolve_token(token.trim()).await? {
            Some(user) => Principal::Authenticated {
                user,
                mode: AuthMode::Token,
            },
            None => Principal::Anonymous,
        });
    }

    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("Session load failed: {e}"))?;

    if let Some(user_id) = user_id {
        return Ok(match store.get_user(user_id).await? {
            Some(user) => Principal::Authenticated {
                user,
                mode: AuthMode::Session,
            },
            None => Principal::Anonymous,
        });
    }

    Ok(Principal::Anonymous)
}
