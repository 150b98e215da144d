//! Bookshelf CLI.
//!
//! # Responsibility
//! - Open the store from environment config and seed the demo author.
//! - Drive the core use cases and print their results as JSON.

use bookshelf_core::db::migrations;
use bookshelf_core::{
    default_log_level, init_logging, BookshelfApi, CreateBookRequest, LoadStrategy, Store,
    StoreConfig,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(about = "Bookshelf store - relationship loading and unit-of-work demos", long_about = None)]
struct Cli {
    /// SQLite file; an in-memory store is used when unset
    #[arg(long, env = "BOOKSHELF_DB")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging stays off when unset
    #[arg(long, env = "BOOKSHELF_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, env = "BOOKSHELF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log every executed SQL statement at debug level
    #[arg(long)]
    echo_sql: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Authors with books resolved one query per author
    Lazy,
    /// Authors with books resolved in a single joined query
    Eager,
    /// Book count per author name
    Counts,
    /// Two user inserts followed by an injected failure
    TxDemo,
    /// Add a book to an author
    Add { author_id: i64, title: String },
    /// List an author's books
    List { author_id: i64 },
    /// Delete a book
    Delete { book_id: i64 },
    /// Apply every pending schema revision (up) or revert the latest one (down)
    Migrate {
        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    /// Upgrade to the newest known revision
    Up,
    /// Revert exactly one revision
    Down,
}

#[derive(Debug, Serialize)]
struct RevisionReport {
    revision: u32,
    name: Option<&'static str>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        if let Err(err) = init_logging(&level, log_dir) {
            eprintln!("Warning: logging disabled: {err}");
        }
    }

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match cli.db {
        Some(path) => StoreConfig::file(path),
        None => StoreConfig::in_memory(),
    }
    .with_echo_sql(cli.echo_sql);
    let store = Store::open(config)?;
    let api = BookshelfApi::new(store.clone());

    if let Commands::Migrate { direction } = cli.command {
        let revision = match direction {
            Direction::Up => store.with_connection(migrations::upgrade)?,
            Direction::Down => store.with_connection(migrations::downgrade)?,
        };
        return print_json(&RevisionReport {
            revision,
            name: migrations::revision_name(revision),
        });
    }

    if let Some(author) = api.seed_demo_data()? {
        log::info!(
            "event=cli_seed module=cli status=ok author_id={}",
            author.id
        );
    }

    match cli.command {
        Commands::Lazy => print_json(&api.authors(LoadStrategy::Lazy)?),
        Commands::Eager => print_json(&api.authors(LoadStrategy::Eager)?),
        Commands::Counts => print_json(&api.author_book_counts()?),
        Commands::TxDemo => print_json(&api.users_transaction_demo()),
        Commands::Add { author_id, title } => {
            print_json(&api.create_book(&CreateBookRequest { title, author_id })?)
        }
        Commands::List { author_id } => print_json(&api.books_by_author(author_id)?),
        Commands::Delete { book_id } => print_json(&api.delete_book(book_id)?),
        Commands::Migrate { .. } => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
