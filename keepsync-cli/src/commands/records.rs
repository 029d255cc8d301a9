//! Record inspection commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use keepsync_store::{Keeper, OpContext, Record, RecordTable, StoreConfig, UserId};

use super::{interrupt_context, open_keeper};

#[derive(Parser, Debug)]
pub struct RecordsArgs {
    #[command(subcommand)]
    pub command: RecordsCommands,
}

#[derive(Subcommand, Debug)]
pub enum RecordsCommands {
    /// List a user's records in one table
    List(ListArgs),
    /// Soft-delete one record
    Delete(DeleteArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Table name (Credentials, TextData, BinaryData, CardData)
    #[arg(value_parser = parse_table)]
    pub table: RecordTable,

    /// Owner username
    #[arg(long)]
    pub user: String,

    /// Only records changed after this RFC 3339 timestamp
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Include soft-deleted records
    #[arg(long)]
    pub include_deleted: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Table name (Credentials, TextData, BinaryData, CardData)
    #[arg(value_parser = parse_table)]
    pub table: RecordTable,

    /// Owner username
    #[arg(long)]
    pub user: String,

    /// Record id
    #[arg(long)]
    pub id: String,
}

fn parse_table(raw: &str) -> Result<RecordTable, String> {
    raw.parse().map_err(|e: keepsync_store::ValidationError| e.to_string())
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}

pub async fn run_records(args: RecordsArgs, config: &StoreConfig) -> Result<()> {
    let keeper = open_keeper(config).await?;
    let ctx = interrupt_context();

    let result = match args.command {
        RecordsCommands::List(args) => run_list(&keeper, &ctx, args).await,
        RecordsCommands::Delete(args) => run_delete(&keeper, &ctx, args).await,
    };

    keeper.close().await;
    result
}

async fn resolve_user(keeper: &Keeper, ctx: &OpContext, username: &str) -> Result<UserId> {
    keeper
        .users()
        .get_user_id(ctx, username)
        .await
        .with_context(|| format!("Failed to resolve user '{}'", username))
}

async fn run_list(keeper: &Keeper, ctx: &OpContext, args: ListArgs) -> Result<()> {
    let user_id = resolve_user(keeper, ctx, &args.user).await?;
    let records = keeper
        .records()
        .get_all_records(ctx, args.table, user_id, args.since, args.include_deleted)
        .await
        .with_context(|| format!("Failed to read {} records", args.table))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("no records");
        return Ok(());
    }
    for record in &records {
        println!("{}", render(record));
    }
    Ok(())
}

async fn run_delete(keeper: &Keeper, ctx: &OpContext, args: DeleteArgs) -> Result<()> {
    let user_id = resolve_user(keeper, ctx, &args.user).await?;
    let affected = keeper
        .records()
        .delete_record(ctx, args.table, user_id, &args.id)
        .await
        .with_context(|| format!("Failed to delete {} '{}'", args.table, args.id))?;

    if affected == 0 {
        println!("no record '{}' for user '{}'", args.id, args.user);
    } else {
        println!("deleted {}", args.id);
    }
    Ok(())
}

/// One line per record: id, timestamp, deletion flag, then data columns.
fn render(record: &Record) -> String {
    let mut line = format!(
        "{}  {}",
        record.id().unwrap_or("-"),
        record.get("updated_at").unwrap_or("-")
    );
    if record.is_deleted() {
        line.push_str("  [deleted]");
    }
    for (column, value) in record.iter() {
        if matches!(column, "id" | "user_id" | "updated_at" | "deleted") {
            continue;
        }
        line.push_str(&format!("  {}={}", column, value.unwrap_or("NULL")));
    }
    line
}
