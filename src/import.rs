// 📥 Catalog Import - bulk-load books from CSV
//
// Expected header: Name,Author,Cost,Copies

use crate::entities::Book;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct BookRow {
    #[serde(rename = "Name")]
    name: String,

    #[serde(rename = "Author")]
    author: String,

    #[serde(rename = "Cost")]
    cost: f64,

    #[serde(rename = "Copies")]
    copies: u32,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book::new(row.name.trim().to_string(), row.author.trim().to_string(), row.cost, row.copies)
    }
}

/// Read catalog entries from a CSV file (borrow counts start at zero)
pub fn load_books_csv(csv_path: &Path) -> Result<Vec<Book>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut books = Vec::new();

    for (idx, result) in rdr.deserialize::<BookRow>().enumerate() {
        // +2: header is line 1
        let line = idx + 2;
        let row = result.with_context(|| format!("Failed to deserialize book on line {}", line))?;

        let book = Book::from(row);
        if !book.has_valid_cost() {
            bail!("Cost of '{}' on line {} is not a finite number", book.name, line);
        }
        books.push(book);
    }

    tracing::debug!(path = %csv_path.display(), count = books.len(), "books read from CSV");
    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_books_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(
            &path,
            "Name,Author,Cost,Copies\n\
             Python Basics,Girish,500,3\n\
             Advanced Python, Chandra ,800.50,2\n",
        )
        .unwrap();

        let books = load_books_csv(&path).unwrap();

        assert_eq!(books.len(), 2);
        assert_eq!(books[0].name, "Python Basics");
        assert_eq!(books[0].copies, 3);
        assert_eq!(books[0].borrow_count, 0);
        assert_eq!(books[1].author, "Chandra");
        assert_eq!(books[1].cost, 800.5);
    }

    #[test]
    fn test_load_books_csv_bad_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(
            &path,
            "Name,Author,Cost,Copies\n\
             Python Basics,Girish,500,3\n\
             Broken,Someone,cheap,-1\n",
        )
        .unwrap();

        let err = load_books_csv(&path).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_load_books_csv_rejects_non_finite_cost() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("books.csv");

        for cost in ["NaN", "inf", "-inf"] {
            fs::write(
                &path,
                format!("Name,Author,Cost,Copies\nPython Basics,Girish,500,3\nPriceless,Anon,{},1\n", cost),
            )
            .unwrap();

            let err = load_books_csv(&path).unwrap_err();
            assert!(err.to_string().contains("'Priceless' on line 3"), "{}", err);
        }
    }

    #[test]
    fn test_load_books_csv_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_books_csv(&dir.path().join("missing.csv")).is_err());
    }
}
