//! Session token management.
//!
//! ARCHITECTURE
//! ============
//! A successful login creates an opaque random token stored with an expiry.
//! The HTTP layer carries it in an `HttpOnly` cookie and resolves it back to
//! a `User` on every request; nothing about the principal lives in process
//! memory between requests.

use std::fmt::Write;

use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::model::User;
use crate::store::{SessionStore, StoreError};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Create a session for the given user, returning the token.
///
/// # Errors
///
/// Returns a `StoreError` if the session cannot be stored.
pub async fn create_session(sessions: &dyn SessionStore, user_id: i64, ttl: Duration) -> Result<String, StoreError> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + ttl;
    sessions.insert_session(&token, user_id, expires_at).await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
///
/// # Errors
///
/// Returns a `StoreError` if the lookup fails.
pub async fn validate_session(sessions: &dyn SessionStore, token: &str) -> Result<Option<User>, StoreError> {
    sessions.find_session_user(token, OffsetDateTime::now_utc()).await
}

/// Delete a session by token.
///
/// # Errors
///
/// Returns a `StoreError` if the delete fails.
pub async fn delete_session(sessions: &dyn SessionStore, token: &str) -> Result<(), StoreError> {
    sessions.delete_session(token).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
