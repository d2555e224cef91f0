// 🏛️ Lending Engine - owns the catalog and the membership
//
// Books and members live in insertion-ordered Vecs and are found by linear
// scan. Keys are unique (enforced on registration and on load), so the first
// match is the only match.
//
// Every operation returns a typed receipt or a LendingError; nothing here
// prints. Time-dependent operations have an `_at` variant taking `now`.

use crate::config::{LendingPolicy, CURRENCY_SYMBOL};
use crate::entities::{Book, HistoryRecord, Loan, Member};
use crate::error::LendingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

// ============================================================================
// RECEIPTS
// ============================================================================

/// Result of a successful borrow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowReceipt {
    pub member_name: String,
    pub subscription_id: String,
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl fmt::Display for BorrowReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} borrowed '{}'. Return by {}.",
            self.member_name, self.book_name, self.due_date
        )
    }
}

/// Result of a successful return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub member_name: String,
    pub subscription_id: String,
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: DateTime<Utc>,

    /// Whole days past the loan period (zero or negative means on time)
    pub overdue_days: i64,

    pub fine: u64,
}

impl ReturnReceipt {
    pub fn is_late(&self) -> bool {
        self.overdue_days > 0
    }
}

impl fmt::Display for ReturnReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Book returned. Fine: {}{}", CURRENCY_SYMBOL, self.fine)
    }
}

// ============================================================================
// LIBRARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    books: Vec<Book>,

    #[serde(default)]
    members: Vec<Member>,

    /// Configuration, not data - never persisted
    #[serde(skip)]
    policy: LendingPolicy,
}

impl Library {
    /// Empty library with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LendingPolicy) -> Self {
        Library {
            books: Vec::new(),
            members: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: LendingPolicy) {
        self.policy = policy;
    }

    /// All catalog entries in insertion order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// All members in registration order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.members.is_empty()
    }

    // ========================================================================
    // CATALOG + MEMBERSHIP
    // ========================================================================

    /// Append a book to the catalog
    pub fn add_book(&mut self, book: Book) -> Result<(), LendingError> {
        if !book.has_valid_cost() {
            tracing::warn!(book = %book.name, cost = book.cost, "rejecting non-finite cost");
            return Err(LendingError::InvalidCost {
                book: book.name,
                cost: book.cost,
            });
        }

        if self.find_book(&book.name).is_some() {
            tracing::warn!(book = %book.name, "book already in catalog");
            return Err(LendingError::DuplicateBook(book.name));
        }

        tracing::debug!(book = %book.name, copies = book.copies, "book added");
        self.books.push(book);
        Ok(())
    }

    /// Append a member to the membership list
    pub fn register_user(&mut self, member: Member) -> Result<(), LendingError> {
        if self.find_member(&member.subscription_id).is_some() {
            tracing::warn!(member = %member.subscription_id, "subscription id already registered");
            return Err(LendingError::DuplicateMember(member.subscription_id));
        }

        tracing::debug!(member = %member.subscription_id, tier = %member.tier, "member registered");
        self.members.push(member);
        Ok(())
    }

    pub fn find_book(&self, name: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.name == name)
    }

    pub fn find_member(&self, subscription_id: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|member| member.subscription_id == subscription_id)
    }

    fn book_index(&self, name: &str) -> Option<usize> {
        self.books.iter().position(|book| book.name == name)
    }

    fn member_index(&self, subscription_id: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.subscription_id == subscription_id)
    }

    // ========================================================================
    // BORROW
    // ========================================================================

    pub fn borrow_book(
        &mut self,
        subscription_id: &str,
        book_name: &str,
    ) -> Result<BorrowReceipt, LendingError> {
        self.borrow_book_at(subscription_id, book_name, Utc::now())
    }

    /// Lend one copy of `book_name` to the member
    ///
    /// Checked in order: member exists, member under limit, book exists,
    /// copy available. Any failure leaves the library untouched.
    pub fn borrow_book_at(
        &mut self,
        subscription_id: &str,
        book_name: &str,
        now: DateTime<Utc>,
    ) -> Result<BorrowReceipt, LendingError> {
        let result = self.try_borrow(subscription_id, book_name, now);

        match &result {
            Ok(receipt) => tracing::debug!(
                member = %receipt.subscription_id,
                book = %receipt.book_name,
                due = %receipt.due_date,
                "book borrowed"
            ),
            Err(err) => tracing::warn!(
                member = subscription_id,
                book = book_name,
                error = %err,
                "borrow rejected"
            ),
        }

        result
    }

    fn try_borrow(
        &mut self,
        subscription_id: &str,
        book_name: &str,
        now: DateTime<Utc>,
    ) -> Result<BorrowReceipt, LendingError> {
        let member_idx = self
            .member_index(subscription_id)
            .ok_or_else(|| LendingError::MemberNotFound(subscription_id.to_string()))?;

        let member = &self.members[member_idx];
        if !member.can_borrow() {
            return Err(LendingError::LimitExceeded {
                member: subscription_id.to_string(),
                limit: member.max_books(),
            });
        }

        let book_idx = self
            .book_index(book_name)
            .ok_or_else(|| LendingError::BookNotFound(book_name.to_string()))?;

        if !self.books[book_idx].check_out() {
            return Err(LendingError::OutOfStock(book_name.to_string()));
        }

        let member = &mut self.members[member_idx];
        member.borrowed.push(Loan {
            book_name: book_name.to_string(),
            borrowed_at: now,
        });

        Ok(BorrowReceipt {
            member_name: member.name.clone(),
            subscription_id: member.subscription_id.clone(),
            book_name: book_name.to_string(),
            borrowed_at: now,
            due_date: self.policy.due_date(now),
        })
    }

    // ========================================================================
    // RETURN
    // ========================================================================

    pub fn return_book(
        &mut self,
        subscription_id: &str,
        book_name: &str,
    ) -> Result<ReturnReceipt, LendingError> {
        self.return_book_at(subscription_id, book_name, Utc::now())
    }

    /// Close the member's first open loan of `book_name` and charge any fine
    pub fn return_book_at(
        &mut self,
        subscription_id: &str,
        book_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt, LendingError> {
        let result = self.try_return(subscription_id, book_name, now);

        match &result {
            Ok(receipt) => tracing::debug!(
                member = %receipt.subscription_id,
                book = %receipt.book_name,
                fine = receipt.fine,
                "book returned"
            ),
            Err(err) => tracing::warn!(
                member = subscription_id,
                book = book_name,
                error = %err,
                "return rejected"
            ),
        }

        result
    }

    fn try_return(
        &mut self,
        subscription_id: &str,
        book_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt, LendingError> {
        let member_idx = self
            .member_index(subscription_id)
            .ok_or_else(|| LendingError::MemberNotFound(subscription_id.to_string()))?;

        let loan_idx = self.members[member_idx]
            .find_loan(book_name)
            .ok_or_else(|| LendingError::NotBorrowed {
                member: subscription_id.to_string(),
                book: book_name.to_string(),
            })?;

        let book_idx = self
            .book_index(book_name)
            .ok_or_else(|| LendingError::BookNotFound(book_name.to_string()))?;

        let member = &mut self.members[member_idx];
        let loan = member.borrowed.remove(loan_idx);
        self.books[book_idx].check_in();

        let overdue_days = self.policy.overdue_days(loan.borrowed_at, now);
        let fine = self.policy.fine_for(loan.borrowed_at, now);

        member.history.push(HistoryRecord {
            book_name: loan.book_name.clone(),
            borrowed_at: loan.borrowed_at,
            returned_at: now,
            fine,
        });

        Ok(ReturnReceipt {
            member_name: member.name.clone(),
            subscription_id: member.subscription_id.clone(),
            book_name: loan.book_name,
            borrowed_at: loan.borrowed_at,
            returned_at: now,
            overdue_days,
            fine,
        })
    }

    // ========================================================================
    // INVARIANTS + PERSISTENCE
    // ========================================================================

    /// Check the invariants a loaded snapshot must satisfy
    ///
    /// - book names and subscription ids are unique
    /// - every cost is finite
    /// - every open loan refers to a catalog entry
    /// - no member holds more loans than their tier allows
    pub fn validate(&self) -> Result<(), LendingError> {
        let mut names = HashSet::new();
        for book in &self.books {
            if !book.has_valid_cost() {
                return Err(LendingError::InvalidCost {
                    book: book.name.clone(),
                    cost: book.cost,
                });
            }
            if !names.insert(book.name.as_str()) {
                return Err(LendingError::DuplicateBook(book.name.clone()));
            }
        }

        let mut ids = HashSet::new();
        for member in &self.members {
            if !ids.insert(member.subscription_id.as_str()) {
                return Err(LendingError::DuplicateMember(member.subscription_id.clone()));
            }

            if member.borrowed.len() > member.max_books() {
                return Err(LendingError::LimitExceeded {
                    member: member.subscription_id.clone(),
                    limit: member.max_books(),
                });
            }

            if let Some(loan) = member
                .borrowed
                .iter()
                .find(|loan| !names.contains(loan.book_name.as_str()))
            {
                return Err(LendingError::BookNotFound(loan.book_name.clone()));
            }
        }

        Ok(())
    }

    /// Write the whole library to `path` (see `persistence::save`)
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        crate::persistence::save(self, path)
    }

    /// Read a library from `path`, or start empty if it doesn't exist
    pub fn load(path: &Path) -> anyhow::Result<Library> {
        crate::persistence::load(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
