//! Account service: registration, credential checks and user lookup.
//!
//! Passwords are stored and compared verbatim.

use tracing::{info, warn};

use crate::model::{NewUser, User, UserRole};
use crate::store::{StoreError, UserStore};

const MAX_ACCOUNT_ID_LEN: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("account id is already in use")]
    DuplicatedUser,
    #[error("no user with that account id")]
    UserNotFound,
    #[error("password does not match")]
    WrongPassword,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

fn validate_credentials(account_id: &str, password: &str) -> Result<(), AuthError> {
    if account_id.trim().is_empty() {
        return Err(AuthError::InvalidInput("accountId must not be blank"));
    }
    if account_id.chars().count() > MAX_ACCOUNT_ID_LEN {
        return Err(AuthError::InvalidInput("accountId must be at most 50 characters"));
    }
    if password.trim().is_empty() {
        return Err(AuthError::InvalidInput("password must not be blank"));
    }
    Ok(())
}

/// Register a new `NORMAL` user.
///
/// # Errors
///
/// `DuplicatedUser` if the account id is taken (enforced by the store, so
/// concurrent registrations of one id admit exactly one), `InvalidInput` for
/// blank credentials.
pub async fn register(users: &dyn UserStore, account_id: &str, password: &str) -> Result<User, AuthError> {
    validate_credentials(account_id, password)?;

    let user = users
        .insert_user(NewUser { account_id: account_id.to_owned(), password: password.to_owned(), role: UserRole::Normal })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AuthError::DuplicatedUser,
            other => AuthError::Store(other),
        })?;

    info!(user_id = user.id, account_id = %user.account_id, "user registered");
    Ok(user)
}

/// Verify credentials and return the matching user.
///
/// # Errors
///
/// `UserNotFound` for an unknown account id, `WrongPassword` on mismatch.
pub async fn login(users: &dyn UserStore, account_id: &str, password: &str) -> Result<User, AuthError> {
    let Some(user) = users.find_user_by_account_id(account_id).await? else {
        warn!(%account_id, "login for unknown account");
        return Err(AuthError::UserNotFound);
    };

    if user.password != password {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AuthError::WrongPassword);
    }

    info!(user_id = user.id, "user logged in");
    Ok(user)
}

/// All users, ascending by id.
///
/// # Errors
///
/// `Store` if the lookup fails.
pub async fn find_all(users: &dyn UserStore) -> Result<Vec<User>, AuthError> {
    Ok(users.find_all_users().await?)
}

/// # Errors
///
/// `Store` if the lookup fails.
pub async fn find_by_id(users: &dyn UserStore, id: i64) -> Result<Option<User>, AuthError> {
    Ok(users.find_user_by_id(id).await?)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
