// 👤 Member Entity - subscriber with two ledgers
//
// subscription_id is IDENTITY (never changes).
// borrowed holds the open loans, history holds completed ones.

use crate::config::{LendingPolicy, CURRENCY_SYMBOL};
use crate::error::LendingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SUBSCRIPTION TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionTier {
    /// Up to 5 books at a time
    Basic,

    /// Up to 10 books at a time
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "Basic",
            SubscriptionTier::Premium => "Premium",
        }
    }

    /// Maximum number of books a member of this tier may hold at once
    pub fn max_books(&self) -> usize {
        match self {
            SubscriptionTier::Basic => 5,
            SubscriptionTier::Premium => 10,
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(SubscriptionTier::Basic),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(LendingError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LEDGER ENTRIES
// ============================================================================

/// An open loan: which book, since when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
}

impl Loan {
    pub fn due_date(&self, policy: &LendingPolicy) -> DateTime<Utc> {
        policy.due_date(self.borrowed_at)
    }
}

/// A completed borrow-then-return transaction (immutable once written)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: DateTime<Utc>,
    pub fine: u64,
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Book: {}, Borrowed On: {}, Returned On: {}, Fine: {}{}",
            self.book_name,
            self.borrowed_at.format("%Y-%m-%d"),
            self.returned_at.format("%Y-%m-%d"),
            CURRENCY_SYMBOL,
            self.fine
        )
    }
}

// ============================================================================
// MEMBER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub tier: SubscriptionTier,

    /// Stable identity - unique across the library
    pub subscription_id: String,

    pub subscription_start: DateTime<Utc>,

    /// Currently borrowed books, oldest first
    #[serde(default)]
    pub borrowed: Vec<Loan>,

    /// Completed transactions in return order
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl Member {
    /// Create a member with empty ledgers
    pub fn new(
        name: String,
        tier: SubscriptionTier,
        subscription_id: String,
        subscription_start: DateTime<Utc>,
    ) -> Self {
        Member {
            name,
            tier,
            subscription_id,
            subscription_start,
            borrowed: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn max_books(&self) -> usize {
        self.tier.max_books()
    }

    /// Room for one more loan?
    pub fn can_borrow(&self) -> bool {
        self.borrowed.len() < self.max_books()
    }

    /// Index of the first open loan for `book_name`
    pub fn find_loan(&self, book_name: &str) -> Option<usize> {
        self.borrowed.iter().position(|loan| loan.book_name == book_name)
    }

    pub fn subscription_expiry(&self, policy: &LendingPolicy) -> DateTime<Utc> {
        policy.subscription_expiry(self.subscription_start)
    }

    /// Sum of all fines charged on completed returns
    pub fn total_fines(&self) -> u64 {
        self.history.iter().map(|record| record.fine).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn basic_member() -> Member {
        Member::new(
            "Kartikeya".to_string(),
            SubscriptionTier::Basic,
            "U001".to_string(),
            jan_first(),
        )
    }

    #[test]
    fn test_tier_limits() {
        assert_eq!(SubscriptionTier::Basic.max_books(), 5);
        assert_eq!(SubscriptionTier::Premium.max_books(), 10);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Basic".parse::<SubscriptionTier>(), Ok(SubscriptionTier::Basic));
        assert_eq!("premium".parse::<SubscriptionTier>(), Ok(SubscriptionTier::Premium));
        assert_eq!(" PREMIUM ".parse::<SubscriptionTier>(), Ok(SubscriptionTier::Premium));

        let err = "Gold".parse::<SubscriptionTier>().unwrap_err();
        assert_eq!(err, LendingError::UnknownTier("Gold".to_string()));
    }

    #[test]
    fn test_member_creation() {
        let member = basic_member();

        assert_eq!(member.subscription_id, "U001");
        assert_eq!(member.max_books(), 5);
        assert!(member.can_borrow());
        assert!(member.borrowed.is_empty());
        assert!(member.history.is_empty());
    }

    #[test]
    fn test_can_borrow_respects_limit() {
        let mut member = basic_member();

        for i in 0..5 {
            member.borrowed.push(Loan {
                book_name: format!("Book {}", i),
                borrowed_at: jan_first(),
            });
        }

        assert!(!member.can_borrow());
    }

    #[test]
    fn test_find_loan_returns_first_match() {
        let mut member = basic_member();
        member.borrowed.push(Loan {
            book_name: "A".to_string(),
            borrowed_at: jan_first(),
        });
        member.borrowed.push(Loan {
            book_name: "B".to_string(),
            borrowed_at: jan_first(),
        });

        assert_eq!(member.find_loan("B"), Some(1));
        assert_eq!(member.find_loan("C"), None);
    }

    #[test]
    fn test_subscription_expiry() {
        let member = basic_member();
        let expiry = member.subscription_expiry(&LendingPolicy::default());
        assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 6, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_history_record_display() {
        let record = HistoryRecord {
            book_name: "Python Basics".to_string(),
            borrowed_at: jan_first(),
            returned_at: Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap(),
            fine: 6,
        };

        assert_eq!(
            record.to_string(),
            "Book: Python Basics, Borrowed On: 2024-01-01, Returned On: 2024-01-11, Fine: ₹6"
        );
    }

    #[test]
    fn test_total_fines() {
        let mut member = basic_member();
        for fine in [0, 6, 4] {
            member.history.push(HistoryRecord {
                book_name: "X".to_string(),
                borrowed_at: jan_first(),
                returned_at: jan_first(),
                fine,
            });
        }
        assert_eq!(member.total_fines(), 10);
    }
}
