//! User management commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keepsync_store::StoreConfig;

use super::{interrupt_context, open_keeper};

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user with a precomputed password hash
    Add(AddArgs),
    /// Show a registered user
    Show(ShowArgs),
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Username to register
    pub username: String,

    /// Password hash to store (hashing happens upstream)
    #[arg(long, value_name = "HASH")]
    pub password_hash: String,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Username to look up
    pub username: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_users(args: UserArgs, config: &StoreConfig) -> Result<()> {
    let keeper = open_keeper(config).await?;
    let ctx = interrupt_context();
    let users = keeper.users();

    let result = match args.command {
        UserCommands::Add(args) => users
            .add_user(&ctx, &args.username, &args.password_hash)
            .await
            .map(|id| println!("{}", id))
            .with_context(|| format!("Failed to add user '{}'", args.username)),
        UserCommands::Show(args) => match users.get_user(&ctx, &args.username).await {
            Ok(user) if args.json => serde_json::to_string_pretty(&user)
                .map(|json| println!("{}", json))
                .context("Failed to serialize user"),
            Ok(user) => {
                println!("id:       {}", user.id);
                println!("username: {}", user.username);
                println!("created:  {}", user.created_at.to_rfc3339());
                Ok(())
            }
            Err(err) => Err(err).with_context(|| format!("Failed to look up '{}'", args.username)),
        },
    };

    keeper.close().await;
    result
}
