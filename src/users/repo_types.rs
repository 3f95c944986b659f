use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String, // Argon2 hash, never leaves the repo layer in a response
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Column values for an insert or a full update.
#[derive(Debug)]
pub struct UserChanges<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}
