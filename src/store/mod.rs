//! Persistence seams for users, board posts and sessions.
//!
//! ARCHITECTURE
//! ============
//! Services talk to storage only through these traits. `PgStore` backs
//! production with `PostgreSQL`; `MemoryStore` backs tests and the
//! `STORAGE_BACKEND=memory` mode. Both implement all three traits, so a single
//! instance is shared behind three trait objects in `AppState`.
//!
//! Store methods report missing rows as `Ok(None)` / `Ok(false)`; translating
//! those into domain errors is the services' job.

#[cfg(test)]
pub(crate) mod conformance;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::model::{BoardPost, NewUser, PageRequest, SearchType, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key violates {0}")]
    Duplicate(String),
    #[error("referenced row does not exist: {0}")]
    MissingReference(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `StoreError::Duplicate` if the account id is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_account_id(&self, account_id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// All users, ascending by id.
    async fn find_all_users(&self) -> Result<Vec<User>, StoreError>;
}

/// Board post persistence. Every listing is ordered newest-first by id.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Persist a draft and return it with its assigned id.
    /// Fails with `StoreError::MissingReference` if the writer does not exist.
    async fn insert_post(&self, post: &BoardPost) -> Result<BoardPost, StoreError>;

    async fn find_post_by_id(&self, id: i64) -> Result<Option<BoardPost>, StoreError>;

    /// Replace title and contents. Returns `false` if no row has `id`.
    async fn update_post_by_id(&self, id: i64, title: &str, contents: &str) -> Result<bool, StoreError>;

    /// Returns `false` if no row has `id`.
    async fn delete_post_by_id(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_all_posts(
        &self,
        search_type: SearchType,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError>;

    async fn find_all_posts_by_writer_in(
        &self,
        writers: &[User],
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError>;

    async fn find_all_posts_by_writer_id(
        &self,
        writer_id: i64,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError>;

    /// Number of posts `find_all_posts` would return for this search without paging.
    async fn find_total_size_for_search(&self, search_type: SearchType, keyword: &str) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session. Sessions already expired at insert time are purged.
    async fn insert_session(&self, token: &str, user_id: i64, expires_at: OffsetDateTime) -> Result<(), StoreError>;

    /// Resolve a token to its user if the session has not expired at `now`.
    async fn find_session_user(&self, token: &str, now: OffsetDateTime) -> Result<Option<User>, StoreError>;

    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}
