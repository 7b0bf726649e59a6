//! rowbase CLI
//!
//! Operator commands over the `users` table and raw queries.

use clap::{Parser, Subcommand};
use rowbase_core::db::{close_db, open_db, seed_users, DbResult};
use rowbase_core::{default_log_level, init_logging};
use std::error::Error;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "rowbase", version)]
#[command(about = "rowbase - manage user records in a SQLite table", long_about = None)]
struct Cli {
    /// SQLite database file, created when missing
    #[arg(long, global = true, default_value = "app.db")]
    db: PathBuf,

    /// Skip inserting fixture users into an empty table
    #[arg(long, global = true)]
    no_seed: bool,

    /// trace|debug|info|warn|error; defaults by build mode
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// User record operations
    Users(commands::users::UsersArgs),
    /// Run a raw SQL statement and print result rows as JSON
    Query(commands::query::QueryArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir)?;
    }

    let conn = open_db(&cli.db)?;
    if !cli.no_seed {
        seed_users(&conn)?;
    }

    let result = match cli.command {
        Commands::Users(args) => commands::users::execute(&conn, args),
        Commands::Query(args) => commands::query::execute(&conn, args),
    };

    finish(result, close_db(conn))
}

/// The command's own failure wins over a failed close.
fn finish(result: Result<(), Box<dyn Error>>, closed: DbResult<()>) -> Result<(), Box<dyn Error>> {
    result?;
    closed?;
    Ok(())
}
