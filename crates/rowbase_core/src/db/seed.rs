//! Fixture rows for a fresh `users` table.

use super::DbResult;
use log::info;
use rusqlite::{params, Connection};

/// `(name, email)` fixtures inserted by [`seed_users`], in id order.
pub const SEED_USERS: [(&str, &str); 3] = [
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
    ("Alice Johnson", "alice@example.com"),
];

/// Inserts [`SEED_USERS`] when the `users` table is empty.
///
/// Returns the number of inserted rows; `0` when the table already had data.
pub fn seed_users(conn: &Connection) -> DbResult<usize> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) AS count FROM users;", [], |row| {
        row.get(0)
    })?;
    if existing > 0 {
        info!("event=db_seed module=db status=skipped existing_rows={existing}");
        return Ok(0);
    }

    let mut stmt = conn.prepare("INSERT INTO users (name, email) VALUES (?1, ?2);")?;
    for (name, email) in SEED_USERS {
        stmt.execute(params![name, email])?;
    }

    info!(
        "event=db_seed module=db status=ok inserted_rows={}",
        SEED_USERS.len()
    );
    Ok(SEED_USERS.len())
}
