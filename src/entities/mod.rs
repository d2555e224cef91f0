// Entity Models
//
// - Book: catalog entry keyed by name
// - Member: subscriber keyed by subscription id, with loan + history ledgers

pub mod book;
pub mod member;

pub use book::Book;
pub use member::{HistoryRecord, Loan, Member, SubscriptionTier};
