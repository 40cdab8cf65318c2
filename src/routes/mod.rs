//! Router assembly.
//!
//! Binds the `/api/users` and `/api/boards` endpoints plus `/healthz` under a
//! single Axum router with CORS and request tracing layers.

pub mod auth;
pub mod boards;
pub mod error;
pub mod extract;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/users", post(users::join_or_login).get(users::list_users))
        .route("/api/users/me", get(users::me))
        .route("/api/users/logout", post(users::logout))
        .route("/api/users/{id}/boards", get(users::list_user_boards))
        .route("/api/boards", get(boards::search).post(boards::create))
        .route("/api/boards/writers", get(boards::list_by_writers))
        .route(
            "/api/boards/{id}",
            get(boards::get).put(boards::update).delete(boards::delete),
        )
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
