use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;
pub mod claims;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
