//! `PostgreSQL` store backed by a SQLx pool.
//!
//! DESIGN
//! ======
//! Every operation is a single statement, so each is atomic without an
//! explicit transaction. Account-id uniqueness and the post→writer link are
//! enforced by constraints; their violations are mapped to `StoreError`
//! variants instead of being pre-checked.
//!
//! Keyword search uses `strpos` rather than `LIKE` so `%` and `_` in user
//! input match literally. `find_all_posts` and `find_total_size_for_search`
//! share `push_search_filter`, which keeps page contents and totals in step.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use time::OffsetDateTime;

use super::{BoardStore, SessionStore, StoreError, UserStore};
use crate::model::{BoardPost, NewUser, PageRequest, SearchType, User, UserRole};

const USER_COLUMNS: &str = "id, account_id, password, role, created_at";

const POST_SELECT: &str = r"SELECT p.id, p.title, p.contents, p.created_at,
           u.id AS writer_id, u.account_id AS writer_account_id, u.password AS writer_password,
           u.role AS writer_role, u.created_at AS writer_created_at
      FROM posts p
      JOIN users u ON u.id = p.writer_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

fn parse_role(raw: &str) -> Result<UserRole, sqlx::Error> {
    UserRole::parse(raw).ok_or_else(|| sqlx::Error::Decode(format!("unknown user role: {raw}").into()))
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        password: row.try_get("password")?,
        role: parse_role(&role)?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<BoardPost, sqlx::Error> {
    let role: String = row.try_get("writer_role")?;
    Ok(BoardPost {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        contents: row.try_get("contents")?,
        created_at: row.try_get("created_at")?,
        writer: User {
            id: row.try_get("writer_id")?,
            account_id: row.try_get("writer_account_id")?,
            password: row.try_get("writer_password")?,
            role: parse_role(&role)?,
            created_at: row.try_get("writer_created_at")?,
        },
    })
}

fn posts_from_rows(rows: &[PgRow]) -> Result<Vec<BoardPost>, StoreError> {
    Ok(rows.iter().map(post_from_row).collect::<Result<_, _>>()?)
}

/// Translate constraint violations into their `StoreError` variants.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or("unknown constraint").to_owned();
        if db.is_unique_violation() {
            return StoreError::Duplicate(constraint);
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference(constraint);
        }
    }
    StoreError::Database(err)
}

// =============================================================================
// SEARCH PREDICATE
// =============================================================================

fn push_search_filter(builder: &mut QueryBuilder<'_, Postgres>, search_type: SearchType, keyword: &str) {
    builder.push(" WHERE ");
    match search_type {
        SearchType::Title => {
            builder.push("strpos(p.title, ");
            builder.push_bind(keyword.to_owned());
            builder.push(") > 0");
        }
        SearchType::Contents => {
            builder.push("strpos(p.contents, ");
            builder.push_bind(keyword.to_owned());
            builder.push(") > 0");
        }
        SearchType::All => {
            builder.push("(strpos(p.title, ");
            builder.push_bind(keyword.to_owned());
            builder.push(") > 0 OR strpos(p.contents, ");
            builder.push_bind(keyword.to_owned());
            builder.push(") > 0)");
        }
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    builder.push(" ORDER BY p.id DESC LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
}

// =============================================================================
// USERS
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (account_id, password, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.account_id)
        .bind(&user.password)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user_from_row(&row)?)
    }

    async fn find_user_by_account_id(&self, account_id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE account_id = $1"))
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(user_from_row).collect::<Result<_, _>>()?)
    }
}

// =============================================================================
// POSTS
// =============================================================================

#[async_trait]
impl BoardStore for PgStore {
    async fn insert_post(&self, post: &BoardPost) -> Result<BoardPost, StoreError> {
        let row = sqlx::query(
            "INSERT INTO posts (title, contents, writer_id) VALUES ($1, $2, $3) RETURNING id, created_at",
        )
        .bind(&post.title)
        .bind(&post.contents)
        .bind(post.writer.id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(BoardPost {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            ..post.clone()
        })
    }

    async fn find_post_by_id(&self, id: i64) -> Result<Option<BoardPost>, StoreError> {
        let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    async fn update_post_by_id(&self, id: i64, title: &str, contents: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE posts SET title = $1, contents = $2 WHERE id = $3")
            .bind(title)
            .bind(contents)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_all_posts(
        &self,
        search_type: SearchType,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        let mut builder = QueryBuilder::new(POST_SELECT);
        push_search_filter(&mut builder, search_type, keyword);
        push_page(&mut builder, page);

        let rows = builder.build().fetch_all(&self.pool).await?;
        posts_from_rows(&rows)
    }

    async fn find_all_posts_by_writer_in(
        &self,
        writers: &[User],
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        if writers.is_empty() {
            return Ok(Vec::new());
        }
        let writer_ids: Vec<i64> = writers.iter().map(|w| w.id).collect();

        let mut builder = QueryBuilder::new(POST_SELECT);
        builder.push(" WHERE p.writer_id = ANY(");
        builder.push_bind(writer_ids);
        builder.push(")");
        push_page(&mut builder, page);

        let rows = builder.build().fetch_all(&self.pool).await?;
        posts_from_rows(&rows)
    }

    async fn find_all_posts_by_writer_id(
        &self,
        writer_id: i64,
        page: PageRequest,
    ) -> Result<Vec<BoardPost>, StoreError> {
        let mut builder = QueryBuilder::new(POST_SELECT);
        builder.push(" WHERE p.writer_id = ");
        builder.push_bind(writer_id);
        push_page(&mut builder, page);

        let rows = builder.build().fetch_all(&self.pool).await?;
        posts_from_rows(&rows)
    }

    async fn find_total_size_for_search(&self, search_type: SearchType, keyword: &str) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_search_filter(&mut builder, search_type, keyword);

        let total = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, token: &str, user_id: i64, expires_at: OffsetDateTime) -> Result<(), StoreError> {
        sqlx::query(
            r"WITH purged AS (DELETE FROM sessions WHERE expires_at <= $4)
              INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_session_user(&self, token: &str, now: OffsetDateTime) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r"SELECT u.id, u.account_id, u.password, u.role, u.created_at
                FROM sessions s
                JOIN users u ON u.id = s.user_id
               WHERE s.token = $1 AND s.expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
