use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use library_lending::{
    get_events_for_member, insert_event, load_books_csv, open_journal, AppConfig, Book,
    LendingError, LendingEvent, Library, Member, SubscriptionTier,
};

#[derive(Parser)]
#[command(
    name = "library-lending",
    version,
    about = "Book inventory, borrowing limits and overdue fines for a small library",
    long_about = None
)]
struct Cli {
    #[arg(long, help = "Library data file (default: $LIBRARY_DATA_PATH or library_data.json)")]
    data: Option<PathBuf>,

    #[arg(long, help = "Lending journal database (default: $LIBRARY_JOURNAL_PATH or library_journal.db)")]
    journal: Option<PathBuf>,

    /// Runs the demo scenario when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add the sample books and members, lend, return and print every report
    Demo,

    /// Add every book from a CSV file (Name,Author,Cost,Copies)
    ImportBooks { csv: PathBuf },

    /// Add a single book to the catalog
    AddBook {
        #[arg(long)]
        name: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        copies: u32,
    },

    /// Register a member
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, help = "Basic or Premium")]
        tier: SubscriptionTier,
        #[arg(long)]
        id: String,
        #[arg(long, help = "Subscription start date, YYYY-MM-DD (default: today)")]
        since: Option<NaiveDate>,
    },

    /// Lend a book to a member
    Borrow { id: String, book: String },

    /// Take a book back from a member
    Return { id: String, book: String },

    /// List books with copies on the shelf
    Books,

    /// List borrowed books, most popular first
    Popular,

    /// Show a member's completed loans
    History { id: String },

    /// Show subscriptions that expire soon or have expired
    Reminders,

    /// Show fines accruing on open loans
    Fines,

    /// Show the journal entries for a member
    Activity { id: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(journal) = cli.journal {
        config.journal_path = journal;
    }

    let mut library = Library::load(&config.data_path)?;
    library.set_policy(config.policy);
    let journal = open_journal(&config.journal_path)?;

    match cli.command.unwrap_or(Command::Demo) {
        Command::Demo => {
            run_demo(&mut library, &journal)?;
            library.save(&config.data_path)?;
            println!("\n✓ Library data saved to {}.", config.data_path.display());
        }
        Command::ImportBooks { csv } => {
            let books = load_books_csv(&csv)?;
            let mut added = 0;
            for book in books {
                if add_book(&mut library, &journal, book)? {
                    added += 1;
                }
            }
            library.save(&config.data_path)?;
            println!("✓ Imported {} books from {}", added, csv.display());
        }
        Command::AddBook { name, author, cost, copies } => {
            add_book(&mut library, &journal, Book::new(name, author, cost, copies))?;
            library.save(&config.data_path)?;
        }
        Command::Register { name, tier, id, since } => {
            let start = since.map(start_of_day).unwrap_or_else(Utc::now);
            let member = Member::new(name, tier, id, start);
            let event = LendingEvent::member_registered(&member);
            library.register_user(member)?;
            insert_event(&journal, &event)?;
            library.save(&config.data_path)?;
        }
        Command::Borrow { id, book } => {
            let receipt = library.borrow_book(&id, &book)?;
            insert_event(&journal, &LendingEvent::borrowed(&receipt))?;
            library.save(&config.data_path)?;
            println!("{}", receipt);
        }
        Command::Return { id, book } => {
            let receipt = library.return_book(&id, &book)?;
            insert_event(&journal, &LendingEvent::returned(&receipt))?;
            library.save(&config.data_path)?;
            println!("{}", receipt);
        }
        Command::Books => print_available_books(&library),
        Command::Popular => print_most_borrowed(&library),
        Command::History { id } => print_history(&library, &id)?,
        Command::Reminders => print_reminders(&library),
        Command::Fines => print_fines(&library),
        Command::Activity { id } => {
            let events = get_events_for_member(&journal, &id)?;
            println!("\nJournal for {} ({} events):", id, events.len());
            for event in events {
                println!(
                    "{}  {:<18} {}",
                    event.timestamp.format("%Y-%m-%d %H:%M"),
                    event.kind.as_str(),
                    event.book_name.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Add a book and journal it; an already-cataloged name is skipped
fn add_book(library: &mut Library, journal: &Connection, book: Book) -> Result<bool> {
    let event = LendingEvent::book_added(&book);
    match library.add_book(book) {
        Ok(()) => {
            insert_event(journal, &event)?;
            Ok(true)
        }
        Err(LendingError::DuplicateBook(name)) => {
            tracing::warn!(book = %name, "skipping book already in catalog");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// The scripted walkthrough: two books, two members, one loan each, one return
fn run_demo(library: &mut Library, journal: &Connection) -> Result<()> {
    add_book(
        library,
        journal,
        Book::new("Python Basics".to_string(), "Girish".to_string(), 500.0, 3),
    )?;
    add_book(
        library,
        journal,
        Book::new("Advanced Python".to_string(), "Chandra".to_string(), 800.0, 2),
    )?;

    let jan_first = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid demo subscription date"))?;
    for member in [
        Member::new(
            "Kartikeya".to_string(),
            SubscriptionTier::Basic,
            "U001".to_string(),
            jan_first,
        ),
        Member::new(
            "Kaustubh".to_string(),
            SubscriptionTier::Premium,
            "U002".to_string(),
            jan_first,
        ),
    ] {
        let event = LendingEvent::member_registered(&member);
        match library.register_user(member) {
            Ok(()) => insert_event(journal, &event)?,
            Err(err) => tracing::warn!(error = %err, "skipping registration"),
        }
    }

    print_available_books(library);

    println!();
    for (id, book) in [("U001", "Python Basics"), ("U002", "Advanced Python")] {
        match library.borrow_book(id, book) {
            Ok(receipt) => {
                insert_event(journal, &LendingEvent::borrowed(&receipt))?;
                println!("{}", receipt);
            }
            Err(err) => println!("❌ {}", err),
        }
    }

    match library.return_book("U001", "Python Basics") {
        Ok(receipt) => {
            insert_event(journal, &LendingEvent::returned(&receipt))?;
            println!("{}", receipt);
        }
        Err(err) => println!("❌ {}", err),
    }

    print_history(library, "U001")?;
    print_history(library, "U002")?;

    print_most_borrowed(library);
    print_reminders(library);
    print_fines(library);

    Ok(())
}

fn print_available_books(library: &Library) {
    println!("\n📚 List of Available Books:");
    for row in library.available_books() {
        println!("{}", row);
    }
}

fn print_most_borrowed(library: &Library) {
    println!("\n🏆 Most Borrowed Books:");
    for row in library.most_borrowed_books() {
        println!("{}", row);
    }
}

fn print_history(library: &Library, subscription_id: &str) -> Result<()> {
    println!("\n📖 {}", library.history_report(subscription_id)?);
    Ok(())
}

fn print_reminders(library: &Library) {
    println!("\n🔔 Subscription Renewal Reminders:");
    for reminder in library.subscription_renewal_reminders() {
        println!("{}", reminder);
    }
}

fn print_fines(library: &Library) {
    println!("\n💰 Overdue Fine Calculation:");
    for notice in library.calculate_fines() {
        println!("{}", notice);
    }
}
