//! Board service for post CRUD, search and writer listings.
//!
//! DESIGN
//! ======
//! The authenticated writer is attached to a post at creation and never
//! changes afterwards. Only the writer or an admin may update or delete a
//! post. Missing ids surface as `BoardError::NotFound` for reads, updates
//! and deletes alike.

use tracing::info;

use crate::model::{BoardPost, Page, PageRequest, SearchType, User};
use crate::store::{BoardStore, StoreError};

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("post not found: {0}")]
    NotFound(i64),
    #[error("not allowed to modify post {0}")]
    Forbidden(i64),
    #[error("writer does not exist: {0}")]
    WriterNotFound(i64),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

fn validate_post(title: &str) -> Result<(), BoardError> {
    if title.trim().is_empty() {
        return Err(BoardError::InvalidInput("title must not be blank"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(BoardError::InvalidInput("title must be at most 200 characters"));
    }
    Ok(())
}

/// Build a page request, rejecting sizes outside `1..=max_size`.
///
/// # Errors
///
/// `InvalidInput` if `size` is zero or above `max_size`.
pub fn page_request(page: u32, size: u32, max_size: u32) -> Result<PageRequest, BoardError> {
    if size == 0 || size > max_size {
        return Err(BoardError::InvalidInput("size must be between 1 and the maximum page size"));
    }
    Ok(PageRequest::new(page, size))
}

/// Whether `actor` may update or delete `post`.
#[must_use]
pub fn can_modify(actor: &User, post: &BoardPost) -> bool {
    actor.is_admin() || actor.id == post.writer.id
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a post written by `writer`.
///
/// # Errors
///
/// `InvalidInput` for a blank or overlong title, `WriterNotFound` if the
/// writer no longer exists.
pub async fn create_post(
    boards: &dyn BoardStore,
    writer: &User,
    title: &str,
    contents: &str,
) -> Result<BoardPost, BoardError> {
    validate_post(title)?;

    let draft = BoardPost::draft(title, contents, writer.clone());
    let post = boards.insert_post(&draft).await.map_err(|e| match e {
        StoreError::MissingReference(_) => BoardError::WriterNotFound(writer.id),
        other => BoardError::Store(other),
    })?;

    info!(post_id = post.id, writer_id = writer.id, "post created");
    Ok(post)
}

/// Fetch one post.
///
/// # Errors
///
/// `NotFound` if no post has `id`.
pub async fn get_post(boards: &dyn BoardStore, id: i64) -> Result<BoardPost, BoardError> {
    boards.find_post_by_id(id).await?.ok_or(BoardError::NotFound(id))
}

/// Replace a post's title and contents. Writer and id are unchanged.
///
/// # Errors
///
/// `NotFound` if no post has `id`, `Forbidden` if `actor` may not modify it.
pub async fn update_post(
    boards: &dyn BoardStore,
    actor: &User,
    id: i64,
    title: &str,
    contents: &str,
) -> Result<BoardPost, BoardError> {
    validate_post(title)?;

    let existing = get_post(boards, id).await?;
    if !can_modify(actor, &existing) {
        return Err(BoardError::Forbidden(id));
    }

    if !boards.update_post_by_id(id, title, contents).await? {
        return Err(BoardError::NotFound(id));
    }

    info!(post_id = id, actor_id = actor.id, "post updated");
    Ok(BoardPost { title: title.to_owned(), contents: contents.to_owned(), ..existing })
}

/// Delete a post.
///
/// # Errors
///
/// `NotFound` if no post has `id`, `Forbidden` if `actor` may not modify it.
pub async fn delete_post(boards: &dyn BoardStore, actor: &User, id: i64) -> Result<(), BoardError> {
    let existing = get_post(boards, id).await?;
    if !can_modify(actor, &existing) {
        return Err(BoardError::Forbidden(id));
    }

    if !boards.delete_post_by_id(id).await? {
        return Err(BoardError::NotFound(id));
    }

    info!(post_id = id, actor_id = actor.id, "post deleted");
    Ok(())
}

// =============================================================================
// LISTINGS
// =============================================================================

/// One page of posts matching `keyword`, plus the total match count.
///
/// # Errors
///
/// `Store` if either query fails.
pub async fn search(
    boards: &dyn BoardStore,
    search_type: SearchType,
    keyword: &str,
    page: PageRequest,
) -> Result<Page<BoardPost>, BoardError> {
    let items = boards.find_all_posts(search_type, keyword, page).await?;
    let total = boards.find_total_size_for_search(search_type, keyword).await?;
    Ok(Page { items, page: page.page, size: page.size, total })
}

/// # Errors
///
/// `Store` if the query fails.
pub async fn list_by_writer(
    boards: &dyn BoardStore,
    writer_id: i64,
    page: PageRequest,
) -> Result<Vec<BoardPost>, BoardError> {
    Ok(boards.find_all_posts_by_writer_id(writer_id, page).await?)
}

/// # Errors
///
/// `Store` if the query fails.
pub async fn list_by_writers(
    boards: &dyn BoardStore,
    writers: &[User],
    page: PageRequest,
) -> Result<Vec<BoardPost>, BoardError> {
    Ok(boards.find_all_posts_by_writer_in(writers, page).await?)
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
