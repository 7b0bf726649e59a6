//! User management use-cases.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete flows for operator surfaces.
//! - Validate operator input before it reaches the store.
//! - Decide user-facing meaning of storage failures (duplicate email).
//!
//! # Invariants
//! - Only `name` and `email` are written; `id` and `created_at` stay
//!   storage-assigned.
//! - Store errors other than constraint violations pass through unchanged.

use crate::model::user::{User, UserColumn, UserId, Users};
use crate::repo::record_store::{RecordStore, StoreError};
use crate::repo::shape::Payload;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid email regex"));

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Name or email failed validation.
    InvalidInput(String),
    /// Target user does not exist.
    UserNotFound(UserId),
    /// Another user already owns this email.
    DuplicateEmail(String),
    /// Write succeeded but the row could not be read back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid user input: {message}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already in use: `{email}`"),
            Self::InconsistentState(details) => write!(f, "inconsistent user state: {details}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for UserServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Operator-supplied user fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Returns a trimmed copy, or `InvalidInput` when a field is unusable.
    pub fn normalized(&self) -> UserServiceResult<Self> {
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty() {
            return Err(UserServiceError::InvalidInput(
                "name cannot be empty".to_string(),
            ));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(UserServiceError::InvalidInput(format!(
                "`{email}` is not an email address"
            )));
        }

        Ok(Self::new(name, email))
    }

    fn to_payload(&self) -> Payload<UserColumn> {
        Payload::new()
            .set(UserColumn::Name, self.name.clone())
            .set(UserColumn::Email, self.email.clone())
    }
}

/// Use-case service over the typed `users` store.
pub struct UserService<'conn> {
    store: RecordStore<'conn, Users>,
}

impl<'conn> UserService<'conn> {
    pub fn new(store: RecordStore<'conn, Users>) -> Self {
        Self { store }
    }

    /// Lists all users, newest id first.
    pub fn list_users(&self) -> UserServiceResult<Vec<User>> {
        Ok(self.store.get_all()?)
    }

    pub fn get_user(&self, id: UserId) -> UserServiceResult<User> {
        self.store
            .get_by_id(id)?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    pub fn find_by_email(&self, email: &str) -> UserServiceResult<Option<User>> {
        Ok(self.store.find_one_by(UserColumn::Email, email.trim())?)
    }

    pub fn count_users(&self) -> UserServiceResult<u64> {
        Ok(self.store.count()?)
    }

    /// Creates a user from validated input.
    ///
    /// # Errors
    /// - `InvalidInput` for blank name or malformed email.
    /// - `DuplicateEmail` when the email is taken.
    /// - `InconsistentState` when the new row vanished before read-back.
    pub fn create_user(&self, draft: &UserDraft) -> UserServiceResult<User> {
        let draft = draft.normalized()?;
        self.store
            .create(&draft.to_payload())
            .map_err(|err| map_write_error(err, &draft.email))?
            .ok_or(UserServiceError::InconsistentState(
                "created user missing on read-back",
            ))
    }

    /// Replaces name and email of an existing user.
    ///
    /// Returns `UserNotFound` when no row has `id`, including when it was
    /// deleted concurrently.
    pub fn update_user(&self, id: UserId, draft: &UserDraft) -> UserServiceResult<User> {
        let draft = draft.normalized()?;
        self.store
            .update(id, &draft.to_payload())
            .map_err(|err| map_write_error(err, &draft.email))?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    /// Deletes a user; `false` when it did not exist.
    pub fn delete_user(&self, id: UserId) -> UserServiceResult<bool> {
        Ok(self.store.delete(id)?)
    }
}

fn map_write_error(err: StoreError, email: &str) -> UserServiceError {
    if err.is_unique_violation() {
        return UserServiceError::DuplicateEmail(email.to_string());
    }
    UserServiceError::Store(err)
}
