//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Borrowed => "Borrowed",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(BookStatus::Available),
            "Borrowed" => Ok(BookStatus::Borrowed),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

/// Internal row structure for database queries (status stored as TEXT)
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    id: i64,
    title: String,
    author: String,
    category: String,
    status: Option<String>,
    pdf_file: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            author: row.author,
            category: row.category,
            status: row
                .status
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            pdf_file: row.pdf_file,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub status: BookStatus,
    /// Stored filename of the attached PDF, relative to the PDF directory
    pub pdf_file: Option<String>,
}

impl Book {
    /// Mark as borrowed. Returns false when the book was already out.
    pub fn issue(&mut self) -> bool {
        if self.status == BookStatus::Available {
            self.status = BookStatus::Borrowed;
            true
        } else {
            false
        }
    }

    /// Mark as available again. Returns false when the book was not borrowed.
    pub fn give_back(&mut self) -> bool {
        if self.status == BookStatus::Borrowed {
            self.status = BookStatus::Available;
            true
        } else {
            false
        }
    }
}

/// Add book request (`POST /api/add`)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, max = 50, message = "Category is required"))]
    pub category: String,
}

/// Catalog totals shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub total: usize,
    pub available: usize,
    pub borrowed: usize,
}

impl CatalogSummary {
    pub fn from_books(books: &[Book]) -> Self {
        let total = books.len();
        let available = books
            .iter()
            .filter(|b| b.status == BookStatus::Available)
            .count();
        Self {
            total,
            available,
            borrowed: total - available,
        }
    }
}
