//! Raw query command
//!
//! Usage: rowbase query <SQL> [PARAM...] [--table NAME]

use clap::Args;
use rowbase_core::RecordStore;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Statement text; use ?1, ?2, ... for values
    pub sql: String,

    /// Values bound to the positional placeholders, as text
    pub params: Vec<String>,

    /// Table the untyped store is opened on
    #[arg(long, default_value = "users")]
    pub table: String,

    /// Print only the first row
    #[arg(long)]
    pub one: bool,
}

/// Execute query command
pub fn execute(conn: &Connection, args: QueryArgs) -> Result<(), Box<dyn Error>> {
    let store = RecordStore::untyped(conn, &args.table)?;
    let params = params_from_iter(args.params.iter());

    if args.one {
        match store.query_one(&args.sql, params)? {
            Some(row) => println!("{}", serde_json::to_string(&row)?),
            None => println!("null"),
        }
        return Ok(());
    }

    for row in store.query(&args.sql, params)? {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}
