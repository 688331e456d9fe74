use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    repository::RepositoryState,
    sessions::{self, SessionState},
};

/// AuthUser
///
/// The resolved identity of an authenticated request, handed to handlers
/// as a plain argument. Carrying it explicitly keeps the ownership checks
/// free of any ambient "current user" state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. Pull the opaque token from the `Authorization: Bearer` header.
/// 2. Resolve it through the session store; anything short of a live
///    session is `Anonymous` and gets rejected here.
/// 3. Confirm the user still exists in the repository, so a session
///    cannot outlive its account.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let store = SessionState::from_ref(state);

        let token = sessions::bearer_token(&parts.headers);
        let identity = store.resolve(token);
        let user_id = sessions::require_authenticated(identity)?;

        let user = repo
            .get_user(user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
