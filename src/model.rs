//! Domain records shared by stores, services and routes.
//!
//! DESIGN
//! ======
//! `User` and `BoardPost` mirror the `users` and `posts` tables. A post
//! carries its full writer record, resolved by join, so callers never need
//! a second lookup to render the author or check permissions.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    Normal,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Admin => "ADMIN",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NORMAL" => Some(Self::Normal),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Registered account. The password is never serialized.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub account_id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Insert payload for a user; the store assigns `id` and `created_at`.
#[derive(Clone)]
pub struct NewUser {
    pub account_id: String,
    pub password: String,
    pub role: UserRole,
}

// =============================================================================
// BOARD POSTS
// =============================================================================

/// A board post with its writer resolved. `id == 0` marks an unsaved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPost {
    pub id: i64,
    pub title: String,
    pub contents: String,
    pub writer: User,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BoardPost {
    /// Unsaved post. The store replaces `id` and `created_at` on insert.
    #[must_use]
    pub fn draft(title: impl Into<String>, contents: impl Into<String>, writer: User) -> Self {
        Self {
            id: 0,
            title: title.into(),
            contents: contents.into(),
            writer,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id != 0
    }
}

// =============================================================================
// SEARCH + PAGING
// =============================================================================

/// Which post fields a keyword is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchType {
    #[default]
    All,
    Title,
    Contents,
}

impl SearchType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Title => "TITLE",
            Self::Contents => "CONTENTS",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ALL" => Some(Self::All),
            "TITLE" => Some(Self::Title),
            "CONTENTS" => Some(Self::Contents),
            _ => None,
        }
    }

    /// Literal, case-sensitive substring match. An empty keyword matches everything.
    #[must_use]
    pub fn matches(self, title: &str, contents: &str, keyword: &str) -> bool {
        match self {
            Self::All => title.contains(keyword) || contents.contains(keyword),
            Self::Title => title.contains(keyword),
            Self::Contents => contents.contains(keyword),
        }
    }
}

/// Zero-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Rows to skip: `page * size`, saturating at `i64::MAX`.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page).saturating_mul(i64::from(self.size))
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of a search, with the total match count ignoring paging.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
