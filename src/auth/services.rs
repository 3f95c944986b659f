use lazy_static::lazy_static;
use sqlx::SqliteConnection;
use tracing::warn;

use crate::{
    auth::{
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::{AppError, AppResult},
    users::repo_types::User,
};

lazy_static! {
    static ref DUMMY_HASH: String =
        hash_password("no-such-user-password").unwrap_or_default();
}

/// Resolve the bearer token's subject to a live user row.
pub async fn current_user(conn: &mut SqliteConnection, auth: &AuthUser) -> AppResult<User> {
    User::find_by_email(conn, &auth.0).await?.ok_or_else(|| {
        warn!(subject = %auth.0, "token subject has no matching user");
        AppError::Unauthorized
    })
}

/// Check an email/password pair and issue an access token for it.
pub async fn authenticate(
    conn: &mut SqliteConnection,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let Some(user) = User::find_by_email(conn, email).await? else {
        // the miss path pays the same argon2 cost as a wrong password
        let _ = verify_password(password, &DUMMY_HASH);
        warn!(email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash) {
        warn!(email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    Ok(keys.sign_access(&user.email)?)
}
