use axum::{
    extract::{FromRef, State},
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{TokenRequest, TokenResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{authenticate, current_user},
    },
    db::DbSession,
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login_for_access_token))
        .route("/auth/refresh_token", post(refresh_access_token))
}

#[instrument(skip(state, db, form))]
pub async fn login_for_access_token(
    State(state): State<AppState>,
    mut db: DbSession,
    Form(form): Form<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let token = authenticate(&mut db, &keys, &form.username, &form.password).await?;

    info!("access token issued");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, db, auth))]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    auth: AuthUser,
    mut db: DbSession,
) -> AppResult<Json<TokenResponse>> {
    let user = current_user(&mut db, &auth).await?;
    let token = JwtKeys::from_ref(&state).sign_access(&user.email)?;

    info!(user_id = user.id, "access token refreshed");
    Ok(Json(TokenResponse::bearer(token)))
}
