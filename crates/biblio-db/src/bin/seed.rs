//! # Seed Data Generator
//!
//! Populates the database with a small catalogue and member list for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./biblio.db (or whatever biblio.toml / BIBLIO_DB_PATH says)
//! cargo run -p biblio-db --bin seed
//!
//! # Specify database path
//! cargo run -p biblio-db --bin seed -- --db ./data/biblio.db
//!
//! # Load settings from a config file
//! cargo run -p biblio-db --bin seed -- --config ./biblio.toml
//! ```
//!
//! Each book gets a synthetic 13-digit ISBN: `978` followed by a
//! zero-padded sequence number.

use std::env;
use std::path::PathBuf;

use biblio_core::{NewBook, NewMember, PageRequest};
use biblio_db::{AppConfig, Database};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (title, author, publisher, genre, pages, copies)
const BOOKS: &[(&str, &str, &str, &str, i64, i64)] = &[
    ("The Hobbit", "J R R Tolkien", "Allen and Unwin", "Fantasy", 310, 4),
    ("A Wizard of Earthsea", "Ursula K Le Guin", "Parnassus Press", "Fantasy", 183, 2),
    ("Dune", "Frank Herbert", "Chilton Books", "Science Fiction", 412, 3),
    ("Foundation", "Isaac Asimov", "Gnome Press", "Science Fiction", 255, 2),
    ("Malgudi Days", "R K Narayan", "Indian Thought", "Short Stories", 246, 5),
    ("The Guide", "R K Narayan", "Viking Press", "Fiction", 220, 1),
    ("Godaan", "Munshi Premchand", "Saraswati Press", "Fiction", 344, 2),
    ("Pride and Prejudice", "Jane Austen", "T Egerton", "Romance", 432, 3),
    ("Emma", "Jane Austen", "John Murray", "Romance", 474, 1),
    ("Neuromancer", "William Gibson", "Ace", "Science Fiction", 271, 2),
    ("The Name of the Rose", "Umberto Eco", "Bompiani", "Mystery", 536, 1),
    ("Murder on the Orient Express", "Agatha Christie", "Collins Crime Club", "Mystery", 256, 3),
];

/// (first name, last name, phone)
const MEMBERS: &[(&str, &str, &str)] = &[
    ("Asha", "Rao", "9845012345"),
    ("Ravi", "Kumar", "9845012346"),
    ("Meera", "Iyer", "9845012347"),
    ("Arjun", "Nair", "9845012348"),
    ("Fatima", "Sheikh", "9845012349"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Biblio Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   TOML config file");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(path) = db_path {
        config.database.database_path = path;
    }

    println!("Biblio Seed Data Generator");
    println!("==========================");
    println!("Database: {}", config.database.database_path.display());
    println!();

    let db = Database::open(&config).await?;
    info!("Connected and migrated");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let books = db.books();
    let mut inserted_books = 0;
    for (seq, (title, author, publisher, genre, pages, copies)) in BOOKS.iter().enumerate() {
        let book = NewBook {
            title: title.to_string(),
            author: author.to_string(),
            publisher: publisher.to_string(),
            genre: genre.to_string(),
            isbn_no: format!("978{:010}", seq + 1),
            pages: *pages,
            total_copies: *copies,
        };

        match books.create(&book).await {
            Ok(_) => inserted_books += 1,
            Err(e) => eprintln!("Failed to insert '{}': {}", book.title, e),
        }
    }

    let members = db.members();
    let mut inserted_members = 0;
    for (first, last, phone) in MEMBERS {
        let member = NewMember {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            phone_number: phone.to_string(),
        };

        match members.create(&member).await {
            Ok(_) => inserted_members += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", member.email, e),
        }
    }

    println!("Inserted {} books and {} members in {:?}", inserted_books, inserted_members, start.elapsed());

    // Exercise the generated search path
    println!();
    println!("Verifying search...");
    for term in ["the", "Dune", "9780000000005"] {
        let page = books.list(&PageRequest::new(10, 0).search(term)).await?;
        println!("  Search '{}': {} results", term, page.pagination.total);
    }

    println!();
    println!("Seed complete!");

    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,biblio=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
