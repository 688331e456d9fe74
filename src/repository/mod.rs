use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Comment, Post, User},
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::{PostgresRepository, ensure_schema};

/// Repository
///
/// Abstract contract for all persistence. Handlers and the identity layer
/// speak only to this trait, so the Postgres implementation and the
/// in-memory one are interchangeable.
///
/// Every mutating method is a single atomic read-modify-write: a
/// transaction in Postgres, one write-lock critical section in memory.
/// Ownership is checked inside that boundary, so a concurrent edit/delete
/// race on the same post resolves deterministically, and `NotFound` vs
/// `Forbidden` stay distinguishable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity ---

    /// Inserts a new user. Uniqueness of username and email is decided
    /// atomically with the insert; violations surface as
    /// `DuplicateUsername` / `DuplicateEmail`.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;

    // --- Posts ---

    /// Creates a post owned by `owner_id`. Blank title or content is
    /// rejected with `InvalidInput` and nothing is persisted.
    async fn create_post(
        &self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError>;

    async fn get_post(&self, id: i64) -> Result<Option<Post>, ApiError>;

    /// All posts, newest first: created_at descending, ties broken by id
    /// descending.
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// Owner-only full replacement of title and content; advances
    /// `updated_at`, never touches `created_at`.
    async fn edit_post(
        &self,
        actor_id: Uuid,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError>;

    /// Owner-only delete. Removes the post and every comment referencing
    /// it in the same atomic step; no orphan comments survive.
    async fn delete_post(&self, actor_id: Uuid, id: i64) -> Result<(), ApiError>;

    // --- Comments ---

    /// Adds a comment by `actor_id` to an existing post. `NotFound` for an
    /// unknown post, `InvalidInput` for blank content.
    async fn create_comment(
        &self,
        actor_id: Uuid,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, ApiError>;

    /// Comments on a post, newest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError>;

    /// Owner-only delete. The post's author gets no moderation rights over
    /// other people's comments.
    async fn delete_comment(&self, actor_id: Uuid, comment_id: i64) -> Result<(), ApiError>;
}

/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;
