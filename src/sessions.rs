use std::sync::Arc;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use uuid::Uuid;

use crate::error::ApiError;

/// Resolved request identity. Every operation that needs a user receives
/// this explicitly; there is no ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User(Uuid),
    Anonymous,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

/// SessionStore
///
/// Server-side table of opaque session tokens. A token is 32 random bytes,
/// hex-encoded, bound to a user id at login and valid until logout or
/// until it outlives `max_age`. Tokens are the only cross-request shared
/// state besides the entities themselves.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    max_age: Duration,
}

impl SessionStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_age,
        }
    }

    /// Issues a fresh token for `user_id`. The token carries no structure;
    /// all meaning lives in this table.
    pub fn start_session(&self, user_id: Uuid) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                created_at: Utc::now(),
            },
        );
        token
    }

    /// Invalidates `token`. Idempotent: ending an unknown or already-ended
    /// session is a no-op, not an error.
    pub fn end_session(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Total resolution: unknown, expired, or absent tokens all come back
    /// as `Anonymous`. Expired entries are dropped on the way.
    pub fn resolve(&self, token: Option<&str>) -> Identity {
        let Some(token) = token else {
            return Identity::Anonymous;
        };

        let user_id = match self.sessions.get(token) {
            Some(session) if Utc::now() - session.created_at <= self.max_age => {
                Some(session.user_id)
            }
            Some(_) => None,
            None => return Identity::Anonymous,
        };

        match user_id {
            Some(id) => Identity::User(id),
            None => {
                self.sessions.remove(token);
                Identity::Anonymous
            }
        }
    }
}

/// The single gate in front of every mutating operation.
pub fn require_authenticated(identity: Identity) -> Result<Uuid, ApiError> {
    match identity {
        Identity::User(id) => Ok(id),
        Identity::Anonymous => Err(ApiError::Unauthenticated),
    }
}

/// Pulls the opaque token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Shared handle stored in the application state.
pub type SessionState = Arc<SessionStore>;
