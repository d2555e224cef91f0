// 🗄️ Lending Journal - SQLite audit trail
//
// Append-only: every book added, member registered, borrow and return becomes
// one row in `events`. The JSON snapshot holds current state; the journal holds
// how we got there.

use crate::entities::{Book, Member};
use crate::library::{BorrowReceipt, ReturnReceipt};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// EVENT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    BookAdded,
    MemberRegistered,
    BookBorrowed,
    BookReturned,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BookAdded => "book_added",
            EventKind::MemberRegistered => "member_registered",
            EventKind::BookBorrowed => "book_borrowed",
            EventKind::BookReturned => "book_returned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "book_added" => Some(EventKind::BookAdded),
            "member_registered" => Some(EventKind::MemberRegistered),
            "book_borrowed" => Some(EventKind::BookBorrowed),
            "book_returned" => Some(EventKind::BookReturned),
            _ => None,
        }
    }
}

// ============================================================================
// LENDING EVENT
// ============================================================================

/// One row of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub subscription_id: Option<String>,
    pub book_name: Option<String>,
    pub data: serde_json::Value,
}

impl LendingEvent {
    fn new(
        kind: EventKind,
        timestamp: DateTime<Utc>,
        subscription_id: Option<String>,
        book_name: Option<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            kind,
            subscription_id,
            book_name,
            data,
        }
    }

    pub fn book_added(book: &Book) -> Self {
        Self::new(
            EventKind::BookAdded,
            Utc::now(),
            None,
            Some(book.name.clone()),
            serde_json::json!({
                "author": book.author,
                "cost": book.cost,
                "copies": book.copies,
            }),
        )
    }

    pub fn member_registered(member: &Member) -> Self {
        Self::new(
            EventKind::MemberRegistered,
            Utc::now(),
            Some(member.subscription_id.clone()),
            None,
            serde_json::json!({
                "name": member.name,
                "tier": member.tier.as_str(),
                "subscription_start": member.subscription_start,
            }),
        )
    }

    pub fn borrowed(receipt: &BorrowReceipt) -> Self {
        Self::new(
            EventKind::BookBorrowed,
            receipt.borrowed_at,
            Some(receipt.subscription_id.clone()),
            Some(receipt.book_name.clone()),
            serde_json::json!({ "due_date": receipt.due_date }),
        )
    }

    pub fn returned(receipt: &ReturnReceipt) -> Self {
        Self::new(
            EventKind::BookReturned,
            receipt.returned_at,
            Some(receipt.subscription_id.clone()),
            Some(receipt.book_name.clone()),
            serde_json::json!({
                "borrowed_at": receipt.borrowed_at,
                "overdue_days": receipt.overdue_days,
                "fine": receipt.fine,
            }),
        )
    }
}

// ============================================================================
// DATABASE
// ============================================================================

/// Open (or create) the journal at `path` and make sure the schema exists
pub fn open_journal(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open journal {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            kind TEXT NOT NULL,
            subscription_id TEXT,
            book_name TEXT,
            data TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_member ON events(subscription_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_book ON events(book_name)",
        [],
    )?;

    Ok(())
}

/// Append an event to the journal
pub fn insert_event(conn: &Connection, event: &LendingEvent) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, kind, subscription_id, book_name, data
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.kind.as_str(),
            event.subscription_id,
            event.book_name,
            data_json,
        ],
    )
    .context("Failed to insert journal event")?;

    tracing::debug!(event = event.kind.as_str(), id = %event.event_id, "journal event recorded");
    Ok(())
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<LendingEvent> {
    let timestamp_str: String = row.get(1)?;
    let kind_str: String = row.get(2)?;
    let data_json: String = row.get(5)?;

    let conversion_error =
        |idx: usize, err: Box<dyn std::error::Error + Send + Sync>| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err)
        };

    Ok(LendingEvent {
        event_id: row.get(0)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|e| conversion_error(1, Box::new(e)))?
            .with_timezone(&Utc),
        kind: EventKind::parse(&kind_str)
            .ok_or_else(|| conversion_error(2, format!("unknown event kind: {}", kind_str).into()))?,
        subscription_id: row.get(3)?,
        book_name: row.get(4)?,
        data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, Box::new(e)))?,
    })
}

/// Events for one member, oldest first
pub fn get_events_for_member(conn: &Connection, subscription_id: &str) -> Result<Vec<LendingEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, kind, subscription_id, book_name, data
         FROM events
         WHERE subscription_id = ?1
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![subscription_id], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Events for one book, oldest first
pub fn get_events_for_book(conn: &Connection, book_name: &str) -> Result<Vec<LendingEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, kind, subscription_id, book_name, data
         FROM events
         WHERE book_name = ?1
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![book_name], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn count_events(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SubscriptionTier;
    use crate::library::Library;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
    }

    fn journal() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_event_kind_roundtrip() {
        for kind in [
            EventKind::BookAdded,
            EventKind::MemberRegistered,
            EventKind::BookBorrowed,
            EventKind::BookReturned,
        ] {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("book_burned"), None);
    }

    #[test]
    fn test_lending_activity_is_journaled() {
        let conn = journal();
        let mut library = Library::new();

        let book = Book::new("Python Basics".to_string(), "Girish".to_string(), 500.0, 3);
        insert_event(&conn, &LendingEvent::book_added(&book)).unwrap();
        library.add_book(book).unwrap();

        let member = Member::new(
            "Kartikeya".to_string(),
            SubscriptionTier::Basic,
            "U001".to_string(),
            t0(),
        );
        insert_event(&conn, &LendingEvent::member_registered(&member)).unwrap();
        library.register_user(member).unwrap();

        let borrowed = library.borrow_book_at("U001", "Python Basics", t0()).unwrap();
        insert_event(&conn, &LendingEvent::borrowed(&borrowed)).unwrap();

        let returned = library
            .return_book_at("U001", "Python Basics", t0() + Duration::days(10))
            .unwrap();
        insert_event(&conn, &LendingEvent::returned(&returned)).unwrap();

        assert_eq!(count_events(&conn).unwrap(), 4);

        let member_events = get_events_for_member(&conn, "U001").unwrap();
        let kinds: Vec<EventKind> = member_events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::MemberRegistered,
                EventKind::BookBorrowed,
                EventKind::BookReturned,
            ]
        );
        assert_eq!(member_events[1].timestamp, t0());
        assert_eq!(member_events[2].data["fine"], 6);

        let book_events = get_events_for_book(&conn, "Python Basics").unwrap();
        assert_eq!(book_events.len(), 3);
        assert_eq!(book_events[0].kind, EventKind::BookAdded);
        assert_eq!(book_events[0].data["copies"], 3);
    }

    #[test]
    fn test_event_roundtrip_preserves_fields() {
        let conn = journal();
        let event = LendingEvent::new(
            EventKind::BookBorrowed,
            t0(),
            Some("U002".to_string()),
            Some("Advanced Python".to_string()),
            serde_json::json!({"note": "test"}),
        );

        insert_event(&conn, &event).unwrap();
        let stored = get_events_for_member(&conn, "U002").unwrap();

        assert_eq!(stored, vec![event]);
    }

    #[test]
    fn test_unknown_member_has_no_events() {
        let conn = journal();
        assert!(get_events_for_member(&conn, "U404").unwrap().is_empty());
        assert_eq!(count_events(&conn).unwrap(), 0);
    }

    #[test]
    fn test_open_journal_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");

        {
            let conn = open_journal(&path).unwrap();
            let book = Book::new("A".to_string(), "B".to_string(), 1.0, 1);
            insert_event(&conn, &LendingEvent::book_added(&book)).unwrap();
        }

        let conn = open_journal(&path).unwrap();
        assert_eq!(count_events(&conn).unwrap(), 1);
    }
}
