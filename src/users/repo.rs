use sqlx::SqliteConnection;

use crate::error::UniqueField;
use crate::users::repo_types::{User, UserChanges};

impl User {
    /// Find a user by primary key.
    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Find a user by email.
    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Find a user by username.
    pub async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Page through users in creation order.
    pub async fn list(
        conn: &mut SqliteConnection,
        offset: i64,
        limit: i64,
    ) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
    }

    /// Insert a user; timestamps come from the column defaults.
    pub async fn create(conn: &mut SqliteConnection, new: &UserChanges<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES (?, ?, ?)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_one(&mut *conn)
        .await
    }

    /// Overwrite every mutable column of an existing user.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        changes: &UserChanges<'_>,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = ?,
                email = ?,
                password_hash = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Which UNIQUE column a failed write collided with, if that is why it failed.
///
/// SQLite reports these as `UNIQUE constraint failed: users.<column>`.
pub fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    if db_err.message().contains("users.email") {
        Some(UniqueField::Email)
    } else {
        Some(UniqueField::Username)
    }
}
