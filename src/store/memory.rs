//! In-memory store used by tests and `STORAGE_BACKEND=memory`.
//!
//! All tables sit behind one `std::sync::Mutex`; the lock is never held
//! across an await, so check-then-insert on account ids is atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{BoardStore, SessionStore, StoreError, UserStore};
use crate::model::{BoardPost, NewUser, PageRequest, SearchType, User};

struct StoredPost {
    title: String,
    contents: String,
    writer_id: i64,
    created_at: OffsetDateTime,
}

struct StoredSession {
    user_id: i64,
    expires_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    /// Keyed by id; ids only grow, so reverse iteration is newest-first.
    posts: BTreeMap<i64, StoredPost>,
    sessions: HashMap<String, StoredSession>,
    last_user_id: i64,
    last_post_id: i64,
}

impl Tables {
    fn resolve(&self, id: i64, post: &StoredPost) -> Option<BoardPost> {
        let writer = self.users.get(&post.writer_id)?;
        Some(BoardPost {
            id,
            title: post.title.clone(),
            contents: post.contents.clone(),
            writer: writer.clone(),
            created_at: post.created_at,
        })
    }

    fn newest_first<F>(&self, page: PageRequest, keep: F) -> Vec<BoardPost>
    where
        F: Fn(&StoredPost) -> bool,
    {
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        self.posts
            .iter()
            .rev()
            .filter(|(_, post)| keep(post))
            .skip(skip)
            .take(take)
            .filter_map(|(id, post)| self.resolve(*id, post))
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.account_id == user.account_id) {
            return Err(StoreError::Duplicate("users_account_id_key".into()));
        }

        tables.last_user_id += 1;
        let stored = User {
            id: tables.last_user_id,
            account_id: user.account_id,
            password: user.password,
            role: user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_account_id(&self, account_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.account_id == account_id)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables().users.values().cloned().collect())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn insert_post(&self, post: &BoardPost) -> Result<BoardPost, StoreError> {
        let mut tables = self.tables();
        let Some(writer) = tables.users.get(&post.writer.id).cloned() else {
            return Err(StoreError::MissingReference(format!("users.id = {}", post.writer.id)));
        };

        tables.last_post_id += 1;
        let id = tables.last_post_id;
        let created_at = OffsetDateTime::now_utc();
        tables.posts.insert(
            id,
            StoredPost {
                title: post.title.clone(),
                contents: post.contents.clone(),
                writer_id: writer.id,
                created_at,
            },
        );

        Ok(BoardPost { id, title: post.title.clone(), contents: post.contents.clone(), writer, created_at })
    }

    async fn find_post_by_id(&self, id: i64) -> Result<Option<BoardPost>, StoreError> {
        let tables = self.tables();
        Ok(tables.posts.get(&id).and_then(|post| tables.resolve(id, post)))
    }

    async fn update_post_by_id(&self, id: i64, title: &str, contents: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(false);
        };
        title.clone_into(&mut post.title);
        contents.clone_into(&mut post.contents);
        Ok(true)
    }

    async fn delete_post_by_id(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables().posts.remove(&id).is_some())
    }

    async fn find_all_posts(
        &self,
        search_type: SearchType,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        Ok(self
            .tables()
            .newest_first(page, |post| search_type.matches(&post.title, &post.contents, keyword)))
    }

    async fn find_all_posts_by_writer_in(
        &self,
        writers: &[User],
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        Ok(self
            .tables()
            .newest_first(page, |post| writers.iter().any(|w| w.id == post.writer_id)))
    }

    async fn find_all_posts_by_writer_id(
        &self,
        writer_id: i64,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        Ok(self.tables().newest_first(page, |post| post.writer_id == writer_id))
    }

    async fn find_total_size_for_search(&self, search_type: SearchType, keyword: &str) -> Result<i64, StoreError> {
        let count = self
            .tables()
            .posts
            .values()
            .filter(|post| search_type.matches(&post.title, &post.contents, keyword))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, token: &str, user_id: i64, expires_at: OffsetDateTime) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference(format!("users.id = {user_id}")));
        }
        let now = OffsetDateTime::now_utc();
        tables.sessions.retain(|_, s| s.expires_at > now);
        tables
            .sessions
            .insert(token.to_owned(), StoredSession { user_id, expires_at });
        Ok(())
    }

    async fn find_session_user(&self, token: &str, now: OffsetDateTime) -> Result<Option<User>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .and_then(|s| tables.users.get(&s.user_id))
            .cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.tables().sessions.remove(token);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
