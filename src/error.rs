// ⚠️ Lending Errors - one variant per failure cause
//
// Every engine operation returns Result<_, LendingError>; callers branch on the
// variant instead of parsing a message.

use thiserror::Error;

/// Domain errors raised by the lending engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LendingError {
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Member {member} already has the maximum of {limit} borrowed books")]
    LimitExceeded { member: String, limit: usize },

    #[error("No copies of '{0}' are available")]
    OutOfStock(String),

    #[error("'{book}' is not in the borrowed list of member {member}")]
    NotBorrowed { member: String, book: String },

    #[error("Book already in catalog: {0}")]
    DuplicateBook(String),

    #[error("Subscription id already registered: {0}")]
    DuplicateMember(String),

    #[error("Unknown subscription tier: {0}")]
    UnknownTier(String),

    #[error("Cost of '{book}' must be a finite number, got {cost}")]
    InvalidCost { book: String, cost: f64 },
}

impl LendingError {
    /// True for the failures that mean "this member may not borrow right now"
    pub fn is_eligibility_failure(&self) -> bool {
        matches!(
            self,
            LendingError::MemberNotFound(_) | LendingError::LimitExceeded { .. }
        )
    }

    /// True for the failures that mean "this book cannot be lent right now"
    pub fn is_availability_failure(&self) -> bool {
        matches!(
            self,
            LendingError::BookNotFound(_) | LendingError::OutOfStock(_)
        )
    }
}
