//! Row shapes and column identifiers accepted by [`RecordStore`].
//!
//! # Responsibility
//! - Bind a store to a record type and a column identifier type.
//! - Keep identifiers that end up inside SQL text on an allow-list.
//!
//! # Invariants
//! - An [`Ident`] only ever holds `[A-Za-z_][A-Za-z0-9_]*`.
//! - [`Payload`] keys are unique; re-setting a key keeps its first position.
//!
//! [`RecordStore`]: super::record_store::RecordStore

use super::record_store::{StoreError, StoreResult};
use crate::model::row::Row;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::fmt::{Display, Formatter};

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// A column name that may be interpolated into statement text.
pub trait ColumnName {
    fn as_str(&self) -> &str;
}

/// Decodes one result row into a record.
pub trait FromRow: Sized {
    fn from_row(row: &rusqlite::Row<'_>) -> StoreResult<Self>;
}

/// Row-shape descriptor: which columns exist and what a row decodes into.
///
/// Carries no runtime data; stores only use it at the type level.
pub trait Shape {
    type Column: ColumnName;
    type Record: FromRow;
}

/// A shape bound to one fixed table name.
pub trait Table: Shape {
    const NAME: &'static str;
}

/// Untyped shape: any validated identifier, rows as [`Row`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyShape;

impl Shape for AnyShape {
    type Column = Ident;
    type Record = Row;
}

/// Validated SQL identifier for untyped tables and columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validates `value` as a bare SQL identifier.
    ///
    /// # Errors
    /// - `StoreError::InvalidIdentifier` when `value` contains anything but
    ///   ASCII letters, digits and `_`, or starts with a digit.
    pub fn new(value: impl Into<String>) -> StoreResult<Self> {
        let value = value.into();
        if !IDENT_RE.is_match(&value) {
            return Err(StoreError::InvalidIdentifier(value));
        }
        Ok(Self(value))
    }
}

impl ColumnName for Ident {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Ident {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRow for Row {
    fn from_row(row: &rusqlite::Row<'_>) -> StoreResult<Self> {
        let stmt: &rusqlite::Statement<'_> = row.as_ref();
        let mut columns = Vec::with_capacity(stmt.column_count());
        for index in 0..stmt.column_count() {
            let name = stmt.column_name(index)?.to_string();
            columns.push((name, row.get::<_, Value>(index)?));
        }
        Ok(columns.into_iter().collect())
    }
}

/// Ordered column-to-value mapping for `create` and `update`.
///
/// Statement column order follows insertion order, not table schema order.
#[derive(Debug, Clone)]
pub struct Payload<C> {
    entries: Vec<(C, Value)>,
}

impl<C: ColumnName> Payload<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder form of [`Payload::insert`].
    pub fn set(mut self, column: C, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets `column` to `value`, replacing an earlier value for the same column.
    pub fn insert(&mut self, column: C, value: impl Into<Value>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == column.as_str())
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: ColumnName> Default for Payload<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ColumnName> FromIterator<(C, Value)> for Payload<C> {
    fn from_iter<I: IntoIterator<Item = (C, Value)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (column, value) in iter {
            payload.insert(column, value);
        }
        payload
    }
}
