//! Board post routes. Every handler requires a session.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::auth::AuthUser;
use super::error::ApiError;
use super::extract::{self, Path, Query};
use super::users::default_size;
use crate::model::{BoardPost, Page, SearchType, User};
use crate::services::{auth as auth_svc, board};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "type", default)]
    pub search_type: SearchType,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub struct WritersQuery {
    pub ids: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    #[serde(default)]
    pub contents: String,
}

/// Parse a comma separated id list such as `1,2,3`.
fn parse_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>().map_err(|_| ApiError::invalid_input(format!("invalid writer id: {part}"))))
        .collect()
}

/// `GET /api/boards?type&keyword&page&size`
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<BoardPost>>, ApiError> {
    let page = board::page_request(query.page, query.size, state.config.max_page_size)?;
    let result = board::search(state.boards.as_ref(), query.search_type, &query.keyword, page).await?;
    Ok(Json(result))
}

/// `GET /api/boards/writers?ids=1,2&page&size`. Unknown ids are skipped.
pub async fn list_by_writers(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<WritersQuery>,
) -> Result<Json<Vec<BoardPost>>, ApiError> {
    let page = board::page_request(query.page, query.size, state.config.max_page_size)?;
    let ids = parse_ids(&query.ids)?;

    let mut writers: Vec<User> = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = auth_svc::find_by_id(state.users.as_ref(), id).await? {
            writers.push(user);
        }
    }

    Ok(Json(board::list_by_writers(state.boards.as_ref(), &writers, page).await?))
}

/// `POST /api/boards`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    extract::Json(form): extract::Json<PostForm>,
) -> Result<impl IntoResponse, ApiError> {
    let post = board::create_post(state.boards.as_ref(), &auth.user, &form.title, &form.contents).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/boards/{id}`
pub async fn get(State(state): State<AppState>, _auth: AuthUser, Path(id): Path<i64>) -> Result<Json<BoardPost>, ApiError> {
    Ok(Json(board::get_post(state.boards.as_ref(), id).await?))
}

/// `PUT /api/boards/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    extract::Json(form): extract::Json<PostForm>,
) -> Result<Json<BoardPost>, ApiError> {
    let post = board::update_post(state.boards.as_ref(), &auth.user, id, &form.title, &form.contents).await?;
    Ok(Json(post))
}

/// `DELETE /api/boards/{id}`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    board::delete_post(state.boards.as_ref(), &auth.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "boards_test.rs"]
mod tests;
