use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::{
    auth::password::hash_password,
    error::{AppError, AppResult, UniqueField},
    users::{
        dto::UserSchema,
        repo::unique_violation,
        repo_types::{User, UserChanges},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate(payload: &UserSchema) -> AppResult<()> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Only the user a record belongs to may change it.
pub fn ensure_owner(caller: &User, target_id: i64) -> AppResult<()> {
    if caller.id != target_id {
        warn!(caller_id = caller.id, target_id, "not the owner");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// The password is hashed before the store is touched. The username/email
/// lookups only give early, named errors; the UNIQUE constraints on the
/// autocommit INSERT settle any race between concurrent signups.
pub async fn create_user(conn: &mut SqliteConnection, payload: &UserSchema) -> AppResult<User> {
    validate(payload)?;
    let hash = hash_password(&payload.password)?;

    if User::find_by_username(conn, &payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Duplicate(UniqueField::Username));
    }
    if User::find_by_email(conn, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already taken");
        return Err(AppError::Duplicate(UniqueField::Email));
    }

    let new = UserChanges {
        username: &payload.username,
        email: &payload.email,
        password_hash: &hash,
    };
    let user = User::create(conn, &new).await.map_err(|e| match unique_violation(&e) {
        Some(field) => {
            warn!(%field, "signup lost a uniqueness race");
            AppError::Duplicate(field)
        }
        None => e.into(),
    })?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(user)
}

pub async fn update_user(
    conn: &mut SqliteConnection,
    caller: &User,
    target_id: i64,
    payload: &UserSchema,
) -> AppResult<User> {
    ensure_owner(caller, target_id)?;
    validate(payload)?;

    let hash = hash_password(&payload.password)?;
    let changes = UserChanges {
        username: &payload.username,
        email: &payload.email,
        password_hash: &hash,
    };
    let user = User::update(conn, target_id, &changes)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(field) => {
                warn!(user_id = target_id, %field, "update collides with another user");
                AppError::Conflict
            }
            None => e.into(),
        })?
        .ok_or(AppError::NotFound)?;

    info!(user_id = user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(
    conn: &mut SqliteConnection,
    caller: &User,
    target_id: i64,
) -> AppResult<()> {
    ensure_owner(caller, target_id)?;

    if !User::delete(conn, target_id).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = target_id, "user deleted");
    Ok(())
}
