use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// ApiError
///
/// The full error taxonomy surfaced by the application. Every variant is a
/// caller-caused, recoverable outcome except `Internal`, which wraps
/// storage or hashing faults and is never shown verbatim to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Empty or malformed field; the caller corrects and resubmits.
    InvalidInput(String),
    DuplicateUsername,
    DuplicateEmail,
    /// Deliberately generic: does not reveal whether the username or the
    /// password was wrong.
    InvalidCredentials,
    /// No valid session; the caller must log in first.
    Unauthenticated,
    /// Authenticated but not the owner of the target entity.
    Forbidden,
    NotFound,
    /// Infrastructure fault (connection loss, unexpected constraint hit).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": msg })),
                )
                    .into_response();
            }
            ApiError::DuplicateUsername => (StatusCode::CONFLICT, "Username already taken"),
            ApiError::DuplicateEmail => (StatusCode::CONFLICT, "Email already registered"),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::Internal(msg) => {
                // Log the underlying fault but return a generic body.
                error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(format!("database error: {err}"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        let cases = [
            (
                ApiError::InvalidInput("x".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::DuplicateUsername, StatusCode::CONFLICT),
            (ApiError::DuplicateEmail, StatusCode::CONFLICT),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ApiError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = ApiError::Internal("connection refused to db-host:5432".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The body carries only the generic message; the detail goes to the log.
    }
}
