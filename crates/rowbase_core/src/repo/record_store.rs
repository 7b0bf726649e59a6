//! Generic per-table record store over SQLite.
//!
//! # Responsibility
//! - Translate a fixed vocabulary of CRUD operations into one statement each.
//! - Decode rows into the shape's record type.
//!
//! # Invariants
//! - Table and column identifiers are interpolated into SQL text; values are
//!   always bound as positional parameters.
//! - The store holds no state besides the table name and never caches rows.
//! - No operation spans more than one statement in a transaction: a
//!   concurrent delete between write and re-fetch makes `create`/`update`
//!   return `None`.
//! - Storage errors propagate unchanged as `StoreError::Db`; values the
//!   record type cannot decode surface as `StoreError::InvalidData`.

use super::shape::{AnyShape, ColumnName, FromRow, Ident, Payload, Shape, Table};
use crate::db::DbError;
use rusqlite::{Connection, ErrorCode, Params, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for record store construction and operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite failure, including constraint violations and
    /// references to columns that do not exist.
    Db(DbError),
    /// A table or column name failed identifier validation.
    InvalidIdentifier(String),
    /// `update` was called without any column to set.
    EmptyPayload,
    /// Store table is missing from the connection.
    MissingRequiredTable(String),
    /// Store table lacks a required column.
    MissingRequiredColumn { table: String, column: &'static str },
    /// Persisted data cannot be decoded into the record type.
    InvalidData(String),
}

impl StoreError {
    /// Whether this is a SQLite constraint failure (`UNIQUE`, `NOT NULL`, ...).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == ErrorCode::ConstraintViolation
        )
    }

    /// Whether this is specifically a `UNIQUE` constraint failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidIdentifier(value) => write!(f, "invalid SQL identifier `{value}`"),
            Self::EmptyPayload => write!(f, "update requires at least one column"),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires primary key column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted row: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// CRUD facade over one table whose primary key is `id`.
///
/// `S` fixes the column identifier type and the record type. The default
/// [`AnyShape`] accepts any validated [`Ident`] and yields untyped rows.
pub struct RecordStore<'conn, S: Shape = AnyShape> {
    conn: &'conn Connection,
    table: Ident,
    _shape: PhantomData<fn() -> S>,
}

impl<'conn> RecordStore<'conn, AnyShape> {
    /// Constructs an untyped store for `table`.
    pub fn untyped(conn: &'conn Connection, table: &str) -> StoreResult<Self> {
        Self::try_new(conn, table)
    }
}

impl<'conn, T: Table> RecordStore<'conn, T> {
    /// Constructs a store for the shape's fixed table.
    pub fn open_table(conn: &'conn Connection) -> StoreResult<Self> {
        Self::try_new(conn, T::NAME)
    }
}

impl<'conn, S: Shape> RecordStore<'conn, S> {
    /// Constructs a store after checking the table invariant.
    ///
    /// # Errors
    /// - `InvalidIdentifier` when `table` is not a bare identifier.
    /// - `MissingRequiredTable` when the table does not exist.
    /// - `MissingRequiredColumn` when `id` is not an `INTEGER PRIMARY KEY`
    ///   of a rowid table.
    pub fn try_new(conn: &'conn Connection, table: &str) -> StoreResult<Self> {
        let table = Ident::new(table)?;
        ensure_table_ready(conn, &table)?;
        Ok(Self {
            conn,
            table,
            _shape: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Returns every row, highest `id` first.
    pub fn get_all(&self) -> StoreResult<Vec<S::Record>> {
        self.query(&format!("SELECT * FROM {} ORDER BY id DESC", self.table), [])
    }

    /// Returns the row whose `id` equals `id`.
    pub fn get_by_id<I: ToSql>(&self, id: I) -> StoreResult<Option<S::Record>> {
        self.query_one(&format!("SELECT * FROM {} WHERE id = ?1", self.table), [&id])
    }

    /// Returns all rows where `column` equals `value`.
    pub fn find_by<V: ToSql>(&self, column: S::Column, value: V) -> StoreResult<Vec<S::Record>> {
        self.query(&select_where_sql(&self.table, &column), [&value])
    }

    /// Returns the first row where `column` equals `value`.
    pub fn find_one_by<V: ToSql>(
        &self,
        column: S::Column,
        value: V,
    ) -> StoreResult<Option<S::Record>> {
        self.query_one(&select_where_sql(&self.table, &column), [&value])
    }

    /// Same cost as [`RecordStore::get_by_id`]: the row is fetched and dropped.
    pub fn exists<I: ToSql>(&self, id: I) -> StoreResult<bool> {
        Ok(self.get_by_id(id)?.is_some())
    }

    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) AS count FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count `{count}`")))
    }

    /// Deletes the row with `id`; returns `false` when there was none.
    pub fn delete<I: ToSql>(&self, id: I) -> StoreResult<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.table),
            [&id],
        )?;
        Ok(changed > 0)
    }

    /// Inserts `data` and re-fetches the new row by its generated `id`.
    ///
    /// An empty payload inserts a row of column defaults.
    pub fn create(&self, data: &Payload<S::Column>) -> StoreResult<Option<S::Record>> {
        let columns: Vec<&str> = data.columns().collect();
        let values: Vec<&dyn ToSql> = data.values().map(|value| value as &dyn ToSql).collect();

        self.conn
            .execute(&insert_sql(&self.table, &columns), values.as_slice())?;

        let id = self.conn.last_insert_rowid();
        self.get_by_id(id)
    }

    /// Sets the columns in `data` on the row with `id`, then re-fetches it.
    ///
    /// Returns `None` when no row has `id`.
    ///
    /// # Errors
    /// - `EmptyPayload` when `data` has no columns; no statement is issued.
    pub fn update<I: ToSql>(
        &self,
        id: I,
        data: &Payload<S::Column>,
    ) -> StoreResult<Option<S::Record>> {
        if data.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let columns: Vec<&str> = data.columns().collect();
        let mut values: Vec<&dyn ToSql> =
            data.values().map(|value| value as &dyn ToSql).collect();
        values.push(&id);

        self.conn
            .execute(&update_sql(&self.table, &columns), values.as_slice())?;

        self.get_by_id(&id)
    }

    /// Runs a caller-supplied statement and decodes every row.
    ///
    /// `params` bind values only; identifiers inside `sql` are the caller's
    /// responsibility.
    pub fn query<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<S::Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(S::Record::from_row(row)?);
        }
        Ok(records)
    }

    /// Runs a caller-supplied statement and decodes the first row, if any.
    pub fn query_one<P: Params>(&self, sql: &str, params: P) -> StoreResult<Option<S::Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(S::Record::from_row(row)?)),
            None => Ok(None),
        }
    }
}

fn select_where_sql(table: &Ident, column: &impl ColumnName) -> String {
    format!("SELECT * FROM {table} WHERE {} = ?1", column.as_str())
}

fn insert_sql(table: &Ident, columns: &[&str]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(1..=columns.len()).join(", ")
    )
}

/// `id` binds to the placeholder after the last assignment.
fn update_sql(table: &Ident, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .zip(placeholders(1..=columns.len()))
        .map(|(column, placeholder)| format!("{column} = {placeholder}"))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE id = ?{}",
        assignments.join(", "),
        columns.len() + 1
    )
}

fn placeholders(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|index| format!("?{index}")).collect()
}

fn ensure_table_ready(conn: &Connection, table: &Ident) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table.as_str()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable(table.to_string()));
    }

    if !has_id_primary_key(conn, table)? || !has_rowid(conn, table) {
        return Err(StoreError::MissingRequiredColumn {
            table: table.to_string(),
            column: "id",
        });
    }

    Ok(())
}

/// `id` must be the sole key and declared exactly `INTEGER`, which makes it
/// the rowid alias `last_insert_rowid` reports.
fn has_id_primary_key(conn: &Connection, table: &Ident) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut id_is_key = false;
    let mut key_columns = 0;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let declared_type: String = row.get(2)?;
        let pk_position: i64 = row.get(5)?;
        if pk_position > 0 {
            key_columns += 1;
            id_is_key |= name == "id" && declared_type.eq_ignore_ascii_case("INTEGER");
        }
    }
    Ok(id_is_key && key_columns == 1)
}

// WITHOUT ROWID tables have no `rowid` column to select.
fn has_rowid(conn: &Connection, table: &Ident) -> bool {
    conn.prepare(&format!("SELECT rowid FROM {table} LIMIT 0;"))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{insert_sql, select_where_sql, update_sql};
    use crate::repo::shape::Ident;

    fn users() -> Ident {
        Ident::new("users").unwrap()
    }

    #[test]
    fn insert_columns_follow_payload_order() {
        assert_eq!(
            insert_sql(&users(), &["email", "name"]),
            "INSERT INTO users (email, name) VALUES (?1, ?2)"
        );
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        assert_eq!(insert_sql(&users(), &[]), "INSERT INTO users DEFAULT VALUES");
    }

    #[test]
    fn update_binds_id_after_assignments() {
        assert_eq!(
            update_sql(&users(), &["name", "email"]),
            "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3"
        );
    }

    #[test]
    fn select_where_interpolates_column_only() {
        let column = Ident::new("email").unwrap();
        assert_eq!(
            select_where_sql(&users(), &column),
            "SELECT * FROM users WHERE email = ?1"
        );
    }
}
