use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::info;

use crate::{
    error::ApiError,
    models::{User, require_non_blank},
    repository::Repository,
};

/// Registers a new user. Uniqueness of username and email is decided
/// atomically with the insert by the repository; this layer validates the
/// fields and makes sure only a salted hash ever leaves it.
pub async fn register(
    repo: &dyn Repository,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let username = require_non_blank("username", username)?;
    let email = require_non_blank("email", email)?;
    if !email.contains('@') {
        return Err(ApiError::InvalidInput(
            "email must be a valid address".to_string(),
        ));
    }
    if password.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }

    let password_hash = hash(password, DEFAULT_COST)?;
    let user = repo.create_user(&username, &email, &password_hash).await?;

    info!("new user registered: {}", user.username);
    Ok(user)
}

/// Verifies credentials. Unknown username and wrong password are
/// indistinguishable to the caller, and failure has no side effects.
pub async fn authenticate(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = repo
        .get_user_by_username(username.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = verify(password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(user)
}
