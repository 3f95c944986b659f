use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{extractors::AuthUser, services::current_user},
    db::DbSession,
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{Message, Pagination, UserList, UserPublic, UserSchema, MAX_PAGE_SIZE},
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(read_users).post(create_user))
        .route(
            "/users/:user_id",
            get(read_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(db, payload))]
pub async fn create_user(
    mut db: DbSession,
    Json(payload): Json<UserSchema>,
) -> AppResult<(StatusCode, Json<UserPublic>)> {
    let user = services::create_user(&mut db, &payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(db))]
pub async fn read_users(
    mut db: DbSession,
    Query(p): Query<Pagination>,
) -> AppResult<Json<UserList>> {
    if p.offset < 0 || p.limit < 0 {
        return Err(AppError::Validation(
            "offset and limit must be non-negative".into(),
        ));
    }
    let users = User::list(&mut db, p.offset, p.limit.min(MAX_PAGE_SIZE)).await?;
    Ok(Json(UserList {
        users: users.into_iter().map(UserPublic::from).collect(),
    }))
}

#[instrument(skip(db))]
pub async fn read_user(
    mut db: DbSession,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserPublic>> {
    let user = User::find_by_id(&mut db, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(auth, db, payload))]
pub async fn update_user(
    auth: AuthUser,
    Path(user_id): Path<i64>,
    mut db: DbSession,
    Json(payload): Json<UserSchema>,
) -> AppResult<Json<UserPublic>> {
    let caller = current_user(&mut db, &auth).await?;
    let user = services::update_user(&mut db, &caller, user_id, &payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(auth, db))]
pub async fn delete_user(
    auth: AuthUser,
    Path(user_id): Path<i64>,
    mut db: DbSession,
) -> AppResult<Json<Message>> {
    let caller = current_user(&mut db, &auth).await?;
    services::delete_user(&mut db, &caller, user_id).await?;
    Ok(Json(Message {
        message: "User deleted".into(),
    }))
}
