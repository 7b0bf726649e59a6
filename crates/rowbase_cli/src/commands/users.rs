//! User record commands
//!
//! Usage: rowbase users <list|show|create|edit|delete|count>

use clap::{Args, Subcommand};
use log::info;
use rowbase_core::{RecordStore, User, UserDraft, UserId, UserService, Users};
use rusqlite::Connection;
use std::error::Error;

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List all users, newest first
    List,
    /// Show one user
    Show { id: UserId },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Edit a user; omitted fields keep their current value
    Edit {
        id: UserId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user
    Delete { id: UserId },
    /// Print the number of users
    Count,
}

/// Execute users command
pub fn execute(conn: &Connection, args: UsersArgs) -> Result<(), Box<dyn Error>> {
    let service = UserService::new(RecordStore::<Users>::open_table(conn)?);

    match args.command {
        UsersCommand::List => {
            for user in service.list_users()? {
                print_user(&user)?;
            }
        }
        UsersCommand::Show { id } => print_user(&service.get_user(id)?)?,
        UsersCommand::Create { name, email } => {
            let user = service.create_user(&UserDraft::new(name, email))?;
            info!("event=user_create module=cli status=ok id={}", user.id);
            print_user(&user)?;
        }
        UsersCommand::Edit { id, name, email } => {
            let current = service.get_user(id)?;
            let draft = UserDraft::new(
                name.unwrap_or(current.name),
                email.unwrap_or(current.email),
            );
            let user = service.update_user(id, &draft)?;
            info!("event=user_update module=cli status=ok id={id}");
            print_user(&user)?;
        }
        UsersCommand::Delete { id } => {
            let deleted = service.delete_user(id)?;
            info!("event=user_delete module=cli status=ok id={id} deleted={deleted}");
            println!("{}", if deleted { "deleted" } else { "not found" });
        }
        UsersCommand::Count => println!("{}", service.count_users()?),
    }

    Ok(())
}

fn print_user(user: &User) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string(user)?);
    Ok(())
}
