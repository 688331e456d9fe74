use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Comment, Post, User, require_non_blank},
    policy,
    repository::Repository,
};

/// Startup schema bootstrap. `IF NOT EXISTS` keeps it idempotent, so it is
/// safe to run on every boot.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS posts (
    id BIGSERIAL PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS comments (
    id BIGSERIAL PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    post_id BIGINT NOT NULL REFERENCES posts(id),
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS comments_post_id_idx ON comments (post_id);
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

const POST_COLUMNS: &str =
    "p.id, p.user_id, p.title, p.content, p.created_at, p.updated_at, u.username AS author";

const COMMENT_COLUMNS: &str =
    "c.id, c.user_id, c.post_id, c.content, c.created_at, u.username AS author";

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL.
/// Uniqueness is delegated to the unique constraints and every
/// check-then-mutate sequence runs inside a transaction with the target
/// row locked, which is what makes the ownership checks race-free.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the post row and returns its owner, or `NotFound`.
    async fn lock_post_owner(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Uuid, ApiError> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ApiError::NotFound)
    }
}

/// Maps a unique-constraint violation on the users table to the matching
/// duplicate error; anything else is an infrastructure fault.
fn registration_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return match db.constraint() {
                Some("users_email_key") => ApiError::DuplicateEmail,
                _ => ApiError::DuplicateUsername,
            };
        }
    }
    err.into()
}

/// A comment insert can lose a race against the post's deletion; the
/// foreign key then reports what the existence check already meant.
fn comment_insert_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) {
            return ApiError::NotFound;
        }
    }
    err.into()
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(registration_error)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_post(
        &self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        let title = require_non_blank("title", title)?;
        let content = require_non_blank("content", content)?;

        // CTE so the insert and the author join happen in one round trip.
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH inserted AS (
                INSERT INTO posts (user_id, title, content, created_at, updated_at)
                VALUES ($1, $2, $3, NOW(), NOW())
                RETURNING id, user_id, title, content, created_at, updated_at
            )
            SELECT {POST_COLUMNS}
            FROM inserted p JOIN users u ON u.id = p.user_id
            "#
        ))
        .bind(owner_id)
        .bind(&title)
        .bind(&content)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC, p.id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn edit_post(
        &self,
        actor_id: Uuid,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        let title = require_non_blank("title", title)?;
        let content = require_non_blank("content", content)?;

        let mut tx = self.pool.begin().await?;

        let owner_id = Self::lock_post_owner(&mut tx, id).await?;
        policy::ensure_owner(actor_id, owner_id)?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $2, content = $3, updated_at = NOW()
            FROM users u
            WHERE posts.id = $1 AND u.id = posts.user_id
            RETURNING posts.id, posts.user_id, posts.title, posts.content,
                      posts.created_at, posts.updated_at, u.username AS author
            "#,
        )
        .bind(id)
        .bind(&title)
        .bind(&content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(post)
    }

    async fn delete_post(&self, actor_id: Uuid, id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let owner_id = Self::lock_post_owner(&mut tx, id).await?;
        policy::ensure_owner(actor_id, owner_id)?;

        // Explicit two-step cascade: comments first, then the post, both
        // inside the same transaction. Either both are gone or neither is.
        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_comment(
        &self,
        actor_id: Uuid,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let content = require_non_blank("content", content)?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound);
        }

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH inserted AS (
                INSERT INTO comments (user_id, post_id, content, created_at)
                VALUES ($1, $2, $3, NOW())
                RETURNING id, user_id, post_id, content, created_at
            )
            SELECT {COMMENT_COLUMNS}
            FROM inserted c JOIN users u ON u.id = c.user_id
            "#
        ))
        .bind(actor_id)
        .bind(post_id)
        .bind(&content)
        .fetch_one(&self.pool)
        .await
        .map_err(comment_insert_error)?;
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn delete_comment(&self, actor_id: Uuid, comment_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let owner_id =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM comments WHERE id = $1 FOR UPDATE")
                .bind(comment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ApiError::NotFound)?;
        policy::ensure_owner(actor_id, owner_id)?;

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
