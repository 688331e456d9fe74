use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record stored in the `users` table. The password is
/// kept only as a bcrypt hash and is excluded from every serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    // Globally unique, enforced by the users_username_key constraint.
    pub username: String,
    // Globally unique, enforced by the users_email_key constraint.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// A blog post from the `posts` table. `user_id` is the owning user and is
/// immutable after creation; `updated_at` advances on every successful edit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Author's username, loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author: Option<String>,
}

/// Comment
///
/// A flat comment on a post. Both owning references are immutable; a
/// comment never outlives its post.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: Uuid,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Author's username, loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for the public registration endpoint (POST /register).
/// The password is hashed before it ever reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Input payload for submitting a new post (POST /posts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

/// Full-replacement payload for editing a post (PUT /posts/{id}).
/// Both fields are required; blank values are rejected, not skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

/// Input payload for posting a new comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

// --- Response Schemas (Output) ---

/// Public view of a user: everything except the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Output of a successful login: the opaque session token plus the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Detail view for GET /posts/{id}: the post and its comments, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

// --- Input Validation ---

/// Rejects empty or whitespace-only text fields and returns the trimmed
/// value that gets persisted.
pub fn require_non_blank(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
