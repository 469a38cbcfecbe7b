//! Books repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::AppResult,
    models::book::{Book, BookRow, BookStatus, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get(&self, id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, category, status, pdf_file FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    /// All books in table order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, category, status, pdf_file FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// Create a new book with Available status
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO books (title, author, category, status)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, author, category, status, pdf_file
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(BookStatus::Available.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Book::from(row))
    }

    /// Persist all mutable fields of an existing book
    pub async fn save(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                title = ?,
                author = ?,
                category = ?,
                status = ?,
                pdf_file = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.status.as_str())
        .bind(&book.pdf_file)
        .bind(book.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a book. Returns false when no row matched.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
