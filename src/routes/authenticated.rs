use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `AuthUser` extractor middleware, so
/// handlers always receive a resolved identity. Ownership checks (edit and
/// delete of posts, delete of comments) happen one layer down, inside the
/// repository's atomic sections.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /logout
        // Ends the presented session; repeat logouts are no-ops.
        .route("/logout", post(handlers::logout))
        // GET /me
        // The authenticated user's own profile.
        .route("/me", get(handlers::get_me))
        // --- Posts ---
        // POST /posts
        // Submits a new post owned by the requesting user.
        .route("/posts", post(handlers::create_post))
        // PUT/DELETE /posts/{id}
        // Owner-only edit and delete. Delete cascades to the post's comments.
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // --- Comments ---
        // POST /posts/{id}/comments
        // Any authenticated user may comment on any existing post.
        .route("/posts/{id}/comments", post(handlers::add_comment))
        // DELETE /comments/{id}
        // Comment-owner-only; the post's author gets no moderation rights.
        .route("/comments/{id}", delete(handlers::delete_comment))
}
