//! Command-line front end for the to-do list.
//!
//! # Responsibility
//! - Open the record store at startup and close it on the way out.
//! - Route each subcommand through `ListService` and print what it returns.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Cli, Command};
use log::{error, info};
use todolist_core::{
    default_log_level, init_logging, Category, Item, ListService, SqliteRecordStore,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).map_err(|err| anyhow!("{err}"))?;
    }

    let store = SqliteRecordStore::open(&cli.db)
        .with_context(|| format!("failed to open {}", cli.db.display()))?;
    let mut service = ListService::new(store);

    let outcome = run(&mut service, cli.command, cli.json);
    // Close even when the command failed so the WAL is checkpointed.
    let closed = service
        .into_store()
        .close()
        .context("failed to close the database");
    finish(outcome, closed)
}

/// Merges the command result with the close result.
///
/// A command error wins; a close error that follows it is logged and
/// printed to stderr so neither is lost.
fn finish(outcome: Result<()>, closed: Result<()>) -> Result<()> {
    match (outcome, closed) {
        (Err(command_err), Err(close_err)) => {
            error!("event=db_close module=cli status=error after_command_error=true");
            eprintln!("warning: {close_err:#}");
            Err(command_err)
        }
        (outcome, closed) => outcome.and(closed),
    }
}

fn run(service: &mut ListService<SqliteRecordStore>, command: Command, json: bool) -> Result<()> {
    match command {
        Command::List { filter } => {
            let items = match filter.as_deref() {
                Some(text) => service.search(text)?,
                None => service.refresh()?,
            };
            print_items(&items, json)
        }
        Command::Add { name } => print_items(&service.add_item(&name)?, json),
        Command::Rename { id, name } => print_items(&service.rename_item(id, &name)?, json),
        Command::Remove { id } => print_items(&service.remove_item(id)?, json),
        Command::Categories => print_categories(&service.categories()?, json),
        Command::AddCategory { name } => {
            let category = service.add_category(&name)?;
            print_categories(std::slice::from_ref(&category), json)
        }
        Command::Assign {
            item_id,
            category_id,
        } => print_items(&service.assign_category(item_id, category_id)?, json),
        Command::Demo => {
            let demo = service.seed_relationship_demo()?;
            info!(
                "event=demo_seeded module=cli status=ok category_id={} item_id={}",
                demo.category.id, demo.item.id
            );
            print_categories(std::slice::from_ref(&demo.category), json)
        }
    }
}

fn print_items(items: &[Item], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("(no items)");
    }
    for item in items {
        match item.category {
            Some(category_id) => println!("{}  {}  [{}]", item.id, item.name, category_id),
            None => println!("{}  {}", item.id, item.name),
        }
    }
    Ok(())
}

fn print_categories(categories: &[Category], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(categories)?);
        return Ok(());
    }
    if categories.is_empty() {
        println!("(no categories)");
    }
    for category in categories {
        println!(
            "{}  {}  ({} item(s))",
            category.id,
            category.name,
            category.items.len()
        );
        for item_id in &category.items {
            println!("    {item_id}");
        }
    }
    Ok(())
}
