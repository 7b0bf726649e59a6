//! Typed schema for the `users` table.
//!
//! # Invariants
//! - `UserColumn` lists exactly the columns created by migration 1.
//! - `email` is unique at the storage level.

use crate::repo::record_store::{StoreError, StoreResult};
use crate::repo::shape::{ColumnName, FromRow, Shape, Table};
use rusqlite::types::FromSql;
use serde::Serialize;

/// Primary key of a `users` row.
pub type UserId = i64;

/// One `users` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, filled by the column default.
    pub created_at: Option<String>,
}

/// Allow-list of `users` columns accepted in payloads and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserColumn {
    Id,
    Name,
    Email,
    CreatedAt,
}

impl ColumnName for UserColumn {
    fn as_str(&self) -> &str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Shape marker binding `User` and `UserColumn` to the `users` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Shape for Users {
    type Column = UserColumn;
    type Record = User;
}

impl Table for Users {
    const NAME: &'static str = "users";
}

impl FromRow for User {
    fn from_row(row: &rusqlite::Row<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: user_column(row, UserColumn::Id)?,
            name: user_column(row, UserColumn::Name)?,
            email: user_column(row, UserColumn::Email)?,
            created_at: user_column(row, UserColumn::CreatedAt)?,
        })
    }
}

// A stored value of the wrong type is bad data; a missing column stays a
// storage error.
fn user_column<T: FromSql>(row: &rusqlite::Row<'_>, column: UserColumn) -> StoreResult<T> {
    row.get(column.as_str()).map_err(|err| match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::InvalidData(format!("users.{}: {err}", column.as_str()))
        }
        other => other.into(),
    })
}
