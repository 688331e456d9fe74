use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Comment, Post, User, require_non_blank},
    policy,
    repository::Repository,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    next_post_id: i64,
    next_comment_id: i64,
}

impl MemoryState {
    fn author_of(&self, user_id: Uuid) -> Option<String> {
        self.users.get(&user_id).map(|u| u.username.clone())
    }
}

/// MemoryRepository
///
/// In-memory implementation of `Repository`. It backs the test suite and
/// any storage-free instance of the app. A single RwLock over the whole
/// state makes every read-modify-write sequence atomic, the same guarantee
/// the Postgres implementation gets from transactions.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, ApiError> {
        self.inner
            .read()
            .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, ApiError> {
        self.inner
            .write()
            .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        // Uniqueness check and insert under one write lock, so two
        // concurrent registrations with the same name admit one winner.
        let mut state = self.write()?;

        if state.users.values().any(|u| u.username == username) {
            return Err(ApiError::DuplicateUsername);
        }
        if state.users.values().any(|u| u.email == email) {
            return Err(ApiError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_post(
        &self,
        owner_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        let title = require_non_blank("title", title)?;
        let content = require_non_blank("content", content)?;

        let mut state = self.write()?;
        if !state.users.contains_key(&owner_id) {
            // Matches the foreign-key failure mode of the SQL backend.
            return Err(ApiError::Internal(format!("unknown owner {owner_id}")));
        }

        state.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: state.next_post_id,
            user_id: owner_id,
            title,
            content,
            created_at: now,
            updated_at: now,
            author: state.author_of(owner_id),
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, ApiError> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let state = self.read()?;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));
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

        let mut state = self.write()?;
        let post = state.posts.get_mut(&id).ok_or(ApiError::NotFound)?;
        policy::ensure_owner(actor_id, post.user_id)?;

        post.title = title;
        post.content = content;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_post(&self, actor_id: Uuid, id: i64) -> Result<(), ApiError> {
        let mut state = self.write()?;
        let post = state.posts.get(&id).ok_or(ApiError::NotFound)?;
        policy::ensure_can_modify(actor_id, post)?;

        // Cascade: drop the comments and the post in the same critical
        // section; no partial state is ever observable.
        state.comments.retain(|_, c| c.post_id != id);
        state.posts.remove(&id);
        Ok(())
    }

    async fn create_comment(
        &self,
        actor_id: Uuid,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let content = require_non_blank("content", content)?;

        let mut state = self.write()?;
        if !state.posts.contains_key(&post_id) {
            return Err(ApiError::NotFound);
        }

        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            user_id: actor_id,
            post_id,
            content,
            created_at: Utc::now(),
            author: state.author_of(actor_id),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        let state = self.read()?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| Reverse((c.created_at, c.id)));
        Ok(comments)
    }

    async fn delete_comment(&self, actor_id: Uuid, comment_id: i64) -> Result<(), ApiError> {
        let mut state = self.write()?;
        let comment = state.comments.get(&comment_id).ok_or(ApiError::NotFound)?;
        policy::ensure_can_modify(actor_id, comment)?;

        state.comments.remove(&comment_id);
        Ok(())
    }
}
