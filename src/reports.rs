// 📊 Reports - read-only views over the library
//
// Every report borrows the library immutably, so running one can never change
// state. Rows implement Display with the wording shown to librarians.

use crate::config::CURRENCY_SYMBOL;
use crate::entities::{Book, HistoryRecord};
use crate::error::LendingError;
use crate::library::Library;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// REPORT ROWS
// ============================================================================

/// A book with at least one copy on the shelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableBook {
    pub name: String,
    pub author: String,
    pub copies: u32,
}

impl From<&Book> for AvailableBook {
    fn from(book: &Book) -> Self {
        AvailableBook {
            name: book.name.clone(),
            author: book.author.clone(),
            copies: book.copies,
        }
    }
}

impl fmt::Display for AvailableBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} - {} copies available",
            self.name, self.author, self.copies
        )
    }
}

/// A book ranked by how often it has been borrowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularBook {
    pub name: String,
    pub author: String,
    pub borrow_count: u32,
}

impl From<&Book> for PopularBook {
    fn from(book: &Book) -> Self {
        PopularBook {
            name: book.name.clone(),
            author: book.author.clone(),
            borrow_count: book.borrow_count,
        }
    }
}

impl fmt::Display for PopularBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} - Borrowed {} times",
            self.name, self.author, self.borrow_count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenewalStatus {
    /// Expiry is still ahead, within the reminder window
    ExpiresIn { days: i64 },

    /// Expiry has already passed
    Expired { days_ago: i64 },
}

/// Reminder for a member whose subscription is ending (or has ended)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalReminder {
    pub member_name: String,
    pub subscription_id: String,
    pub expires_at: DateTime<Utc>,
    pub status: RenewalStatus,
}

impl RenewalReminder {
    pub fn is_expired(&self) -> bool {
        matches!(self.status, RenewalStatus::Expired { .. })
    }
}

impl fmt::Display for RenewalReminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            RenewalStatus::ExpiresIn { days } => write!(
                f,
                "{} (ID: {}) - Subscription expires in {} days.",
                self.member_name, self.subscription_id, days
            ),
            RenewalStatus::Expired { days_ago } => write!(
                f,
                "{} (ID: {}) - Subscription expired {} days ago.",
                self.member_name, self.subscription_id, days_ago
            ),
        }
    }
}

/// Fine accruing on a loan that is still open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineNotice {
    pub member_name: String,
    pub subscription_id: String,
    pub book_name: String,
    pub overdue_days: i64,
    pub fine: u64,
}

impl fmt::Display for FineNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has an overdue fine of {}{} for '{}'.",
            self.member_name, CURRENCY_SYMBOL, self.fine, self.book_name
        )
    }
}

/// One member's completed transactions, headed by who they belong to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryReport<'a> {
    pub member_name: &'a str,
    pub subscription_id: &'a str,
    pub records: &'a [HistoryRecord],
}

impl fmt::Display for HistoryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Borrowed History for {} (ID: {}):",
            self.member_name, self.subscription_id
        )?;
        for record in self.records {
            write!(f, "\n{}", record)?;
        }
        Ok(())
    }
}

// ============================================================================
// LIBRARY REPORTS
// ============================================================================

impl Library {
    /// Books with copies on the shelf, in catalog order
    pub fn available_books(&self) -> Vec<AvailableBook> {
        self.books()
            .iter()
            .filter(|book| book.is_available())
            .map(AvailableBook::from)
            .collect()
    }

    /// Borrowed books, most borrowed first (ties keep catalog order)
    pub fn most_borrowed_books(&self) -> Vec<PopularBook> {
        let mut ranked: Vec<&Book> = self
            .books()
            .iter()
            .filter(|book| book.has_been_borrowed())
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.borrow_count.cmp(&a.borrow_count));

        ranked.into_iter().map(PopularBook::from).collect()
    }

    /// Completed transactions for one member, in return order
    pub fn view_borrowed_history(
        &self,
        subscription_id: &str,
    ) -> Result<&[HistoryRecord], LendingError> {
        self.find_member(subscription_id)
            .map(|member| member.history.as_slice())
            .ok_or_else(|| LendingError::MemberNotFound(subscription_id.to_string()))
    }

    /// Same records as `view_borrowed_history`, with the member's name attached
    pub fn history_report(
        &self,
        subscription_id: &str,
    ) -> Result<HistoryReport<'_>, LendingError> {
        self.find_member(subscription_id)
            .map(|member| HistoryReport {
                member_name: &member.name,
                subscription_id: &member.subscription_id,
                records: &member.history,
            })
            .ok_or_else(|| LendingError::MemberNotFound(subscription_id.to_string()))
    }

    pub fn subscription_renewal_reminders(&self) -> Vec<RenewalReminder> {
        self.subscription_renewal_reminders_at(Utc::now())
    }

    /// Members whose subscription ends within the renewal window, or already ended
    pub fn subscription_renewal_reminders_at(&self, now: DateTime<Utc>) -> Vec<RenewalReminder> {
        let window = self.policy().renewal_window_days;

        self.members()
            .iter()
            .filter_map(|member| {
                let expires_at = member.subscription_expiry(self.policy());

                let status = if expires_at <= now {
                    RenewalStatus::Expired {
                        days_ago: (now - expires_at).num_days(),
                    }
                } else {
                    let days = (expires_at - now).num_days();
                    if days > window {
                        return None;
                    }
                    RenewalStatus::ExpiresIn { days }
                };

                Some(RenewalReminder {
                    member_name: member.name.clone(),
                    subscription_id: member.subscription_id.clone(),
                    expires_at,
                    status,
                })
            })
            .collect()
    }

    pub fn calculate_fines(&self) -> Vec<FineNotice> {
        self.calculate_fines_at(Utc::now())
    }

    /// Fines accruing on open loans as of `now`
    pub fn calculate_fines_at(&self, now: DateTime<Utc>) -> Vec<FineNotice> {
        let policy = self.policy();
        let mut notices = Vec::new();

        for member in self.members() {
            for loan in &member.borrowed {
                let overdue_days = policy.overdue_days(loan.borrowed_at, now);
                if overdue_days > 0 {
                    notices.push(FineNotice {
                        member_name: member.name.clone(),
                        subscription_id: member.subscription_id.clone(),
                        book_name: loan.book_name.clone(),
                        overdue_days,
                        fine: policy.fine_for(loan.borrowed_at, now),
                    });
                }
            }
        }

        notices
    }
}

// ============================================================================
// TESTS
// ============================================================================
