use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    identity,
    models::{
        AuthResponse, Comment, CreateCommentRequest, CreatePostRequest, LoginRequest, Post,
        PostDetail, RegisterRequest, UpdatePostRequest, UserResponse,
    },
    sessions,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::info;

// --- Identity & Session Handlers ---

/// [Public Route] Creates a new account. Registration does not log the
/// user in; the client follows up with POST /login.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = identity::register(
        state.repo.as_ref(),
        &payload.username,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// [Public Route] Verifies credentials and opens a session. The response
/// token is the caller's proof of identity for every protected route.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user =
        identity::authenticate(state.repo.as_ref(), &payload.username, &payload.password).await?;

    let token = state.sessions.start_session(user.id);
    info!("user logged in: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// [Authenticated Route] Ends the presented session. The store treats a
/// second logout of the same token as a no-op.
pub async fn logout(
    AuthUser { username, .. }: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> StatusCode {
    if let Some(token) = sessions::bearer_token(&headers) {
        state.sessions.end_session(token);
    }
    info!("user logged out: {}", username);
    StatusCode::NO_CONTENT
}

/// [Authenticated Route] The authenticated user's own profile.
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.repo.get_user(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

// --- Post Handlers ---

/// [Public Route] Lists every post, newest first. No authorization:
/// anonymous readers see the same list as logged-in users.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repo.list_posts().await?;
    Ok(Json(posts))
}

/// [Public Route] A single post together with its comments, newest first.
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;
    let comments = state.repo.list_comments(id).await?;
    Ok(Json(PostDetail { post, comments }))
}

/// [Authenticated Route] Submits a new post owned by the requesting user.
pub async fn create_post(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state
        .repo
        .create_post(id, &payload.title, &payload.content)
        .await?;

    info!("post created: {} by user {}", post.id, id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// [Authenticated Route] Full replacement of a post's title and content.
/// The repository enforces the owner-only rule inside its transaction.
pub async fn update_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .repo
        .edit_post(user_id, id, &payload.title, &payload.content)
        .await?;
    Ok(Json(post))
}

/// [Authenticated Route] Owner-only delete; takes the post's comments
/// with it atomically.
pub async fn delete_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.delete_post(user_id, id).await?;
    info!("post deleted: {} by user {}", id, user_id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Comment Handlers ---

/// [Public Route] Comments for a post, newest first. 404 for a post that
/// does not exist, distinct from an existing post with no comments.
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    state
        .repo
        .get_post(post_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let comments = state.repo.list_comments(post_id).await?;
    Ok(Json(comments))
}

/// [Authenticated Route] Adds a comment to an existing post. Any
/// authenticated user may comment on any post.
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .repo
        .create_comment(user_id, post_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// [Authenticated Route] Deletes the caller's own comment. The post's
/// author holds no moderation rights over other users' comments.
pub async fn delete_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.delete_comment(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
