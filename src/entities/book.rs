// 📚 Book Entity - a catalog entry
//
// Name is the catalog key. Copies and borrow_count are the only values that
// change after the book is added.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Title, unique within the catalog
    pub name: String,

    pub author: String,

    /// Replacement cost
    pub cost: f64,

    /// Copies currently on the shelf
    pub copies: u32,

    /// Successful borrows over the book's lifetime (never decreases)
    #[serde(default)]
    pub borrow_count: u32,
}

impl Book {
    /// Create a catalog entry that has never been borrowed
    pub fn new(name: String, author: String, cost: f64, copies: u32) -> Self {
        Book {
            name,
            author,
            cost,
            copies,
            borrow_count: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.copies > 0
    }

    /// NaN and infinities can't be written to the JSON snapshot
    pub fn has_valid_cost(&self) -> bool {
        self.cost.is_finite()
    }

    pub fn has_been_borrowed(&self) -> bool {
        self.borrow_count > 0
    }

    /// Take one copy off the shelf and count the borrow
    ///
    /// Returns false (and changes nothing) when no copy is left.
    pub(crate) fn check_out(&mut self) -> bool {
        match self.copies.checked_sub(1) {
            Some(remaining) => {
                self.copies = remaining;
                self.borrow_count = self.borrow_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Put one copy back on the shelf
    pub(crate) fn check_in(&mut self) {
        self.copies = self.copies.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_basics() -> Book {
        Book::new(
            "Python Basics".to_string(),
            "Girish".to_string(),
            500.0,
            3,
        )
    }

    #[test]
    fn test_book_creation() {
        let book = python_basics();

        assert_eq!(book.name, "Python Basics");
        assert_eq!(book.author, "Girish");
        assert_eq!(book.copies, 3);
        assert_eq!(book.borrow_count, 0);
        assert!(book.is_available());
        assert!(!book.has_been_borrowed());
    }

    #[test]
    fn test_check_out_and_in() {
        let mut book = python_basics();

        assert!(book.check_out());
        assert_eq!(book.copies, 2);
        assert_eq!(book.borrow_count, 1);

        book.check_in();
        assert_eq!(book.copies, 3);
        // Returning never undoes the borrow count
        assert_eq!(book.borrow_count, 1);
    }

    #[test]
    fn test_check_out_empty_shelf() {
        let mut book = Book::new("Rare".to_string(), "Anon".to_string(), 100.0, 1);

        assert!(book.check_out());
        assert!(!book.is_available());

        assert!(!book.check_out());
        assert_eq!(book.copies, 0);
        assert_eq!(book.borrow_count, 1);
    }

    #[test]
    fn test_cost_must_be_finite() {
        assert!(python_basics().has_valid_cost());

        for cost in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let book = Book::new("A".to_string(), "B".to_string(), cost, 1);
            assert!(!book.has_valid_cost());
        }
    }

    #[test]
    fn test_missing_borrow_count_defaults_to_zero() {
        let json = r#"{"name":"A","author":"B","cost":10.0,"copies":2}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.borrow_count, 0);
    }
}
