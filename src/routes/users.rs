//! Account routes: registration, login, logout, and user listings.
//!
//! `POST /api/users` doubles as login when called with `?type=LOGIN`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::auth::{AuthUser, clear_session_cookie, session_cookie};
use super::error::ApiError;
use super::extract::{self, Path, Query};
use crate::model::{BoardPost, User};
use crate::services::{auth as auth_svc, board, session};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserAction {
    #[default]
    Join,
    Login,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserActionQuery {
    #[serde(rename = "type", default)]
    pub action: UserAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub account_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

pub(crate) fn default_size() -> u32 {
    10
}

/// `POST /api/users[?type=JOIN|LOGIN]`
pub async fn join_or_login(
    State(state): State<AppState>,
    Query(query): Query<UserActionQuery>,
    extract::Json(form): extract::Json<UserForm>,
) -> Result<Response, ApiError> {
    match query.action {
        UserAction::Join => {
            let user = auth_svc::register(state.users.as_ref(), &form.account_id, &form.password).await?;
            Ok((StatusCode::CREATED, Json(user)).into_response())
        }
        UserAction::Login => {
            let user = auth_svc::login(state.users.as_ref(), &form.account_id, &form.password).await?;
            let token = session::create_session(state.sessions.as_ref(), user.id, state.config.session_ttl).await?;
            let jar = CookieJar::new().add(session_cookie(&state.config, token));
            Ok((jar, Json(user)).into_response())
        }
    }
}

/// `GET /api/users/me`
pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// `POST /api/users/logout` deletes the session and clears the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    session::delete_session(state.sessions.as_ref(), &auth.token).await?;
    tracing::info!(user_id = auth.user.id, "user logged out");

    let jar = CookieJar::new().add(clear_session_cookie(&state.config));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// `GET /api/users`, admin only.
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<User>>, ApiError> {
    if !auth.user.is_admin() {
        return Err(ApiError::forbidden("admin role required"));
    }
    Ok(Json(auth_svc::find_all(state.users.as_ref()).await?))
}

/// `GET /api/users/{id}/boards`
pub async fn list_user_boards(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<BoardPost>>, ApiError> {
    let page = board::page_request(query.page, query.size, state.config.max_page_size)?;
    if auth_svc::find_by_id(state.users.as_ref(), user_id).await?.is_none() {
        return Err(auth_svc::AuthError::UserNotFound.into());
    }
    Ok(Json(board::list_by_writer(state.boards.as_ref(), user_id, page).await?))
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
