use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the identity gateway
/// (register/login) and all read-only content access. Anonymous users may
/// only read; every mutation lives behind the authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New account creation. Duplicate username/email come back as 409.
        .route("/register", post(handlers::register))
        // POST /login
        // Credential check; success opens a session and returns its token.
        .route("/login", post(handlers::login))
        // GET /posts
        // Lists every post, newest first.
        .route("/posts", get(handlers::list_posts))
        // GET /posts/{id}
        // A single post with its comments, newest first.
        .route("/posts/{id}", get(handlers::get_post))
        // GET /posts/{id}/comments
        // Just the comments of a post, newest first.
        .route("/posts/{id}/comments", get(handlers::get_comments))
}
