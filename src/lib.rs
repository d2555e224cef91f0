// Library Lending - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod db;         // Lending journal (SQLite audit trail)
pub mod entities;
pub mod error;
pub mod import;     // CSV catalog import
pub mod library;    // Lending engine
pub mod persistence;
pub mod reports;

// Re-export commonly used types
pub use config::{AppConfig, LendingPolicy, CURRENCY_SYMBOL};
pub use db::{
    EventKind, LendingEvent,
    count_events, get_events_for_book, get_events_for_member, insert_event,
    open_journal, setup_database,
};
pub use entities::{Book, HistoryRecord, Loan, Member, SubscriptionTier};
pub use error::LendingError;
pub use import::load_books_csv;
pub use library::{BorrowReceipt, Library, ReturnReceipt};
pub use persistence::SCHEMA_VERSION;
pub use reports::{
    AvailableBook, FineNotice, HistoryReport, PopularBook, RenewalReminder, RenewalStatus,
};
