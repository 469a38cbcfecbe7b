//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{book::CreateBook, user::Upload, Book, CatalogSummary},
    repository::Repository,
    storage::{has_extension, secure_filename, FileStore},
};

pub const INVALID_PDF: &str = "Invalid file or file type. Only PDF is allowed.";

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    pdfs: FileStore,
}

impl CatalogService {
    pub fn new(repository: Repository, pdfs: FileStore) -> Self {
        Self { repository, pdfs }
    }

    /// All books in insertion order
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Books together with their status totals
    pub async fn dashboard(&self) -> AppResult<(Vec<Book>, CatalogSummary)> {
        let books = self.list_books().await?;
        let summary = CatalogSummary::from_books(&books);
        Ok((books, summary))
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Add a book; new books start out available
    pub async fn add_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let book = CreateBook {
            title: book.title.trim().to_string(),
            author: book.author.trim().to_string(),
            category: book.category.trim().to_string(),
        };
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Catalog: added book id={} '{}'", created.id, created.title);
        Ok(created)
    }

    /// Attach a PDF to a book, replacing any earlier attachment
    pub async fn upload_pdf(&self, id: i64, upload: Option<Upload>) -> AppResult<Book> {
        let upload = upload
            .filter(|u| !u.filename.is_empty() && has_extension(&u.filename, "pdf"))
            .ok_or_else(|| AppError::Validation(INVALID_PDF.to_string()))?;

        let mut book = self.get_book(id).await?;

        let stored = secure_filename(&format!("book_{}_{}", id, upload.filename));
        self.pdfs.save(&stored, &upload.content).await?;

        let previous = book.pdf_file.replace(stored.clone());
        let overwrote = previous.as_deref() == Some(stored.as_str());
        if let Err(e) = self.repository.books.save(&book).await {
            if !overwrote {
                if let Err(cleanup) = self.pdfs.remove(&stored).await {
                    tracing::warn!("Could not remove unsaved upload {}: {}", stored, cleanup);
                }
            }
            return Err(e);
        }

        if let Some(old) = previous.filter(|_| !overwrote) {
            if let Err(e) = self.pdfs.remove(&old).await {
                tracing::warn!("Could not remove replaced file {}: {}", old, e);
            }
        }

        tracing::info!("Catalog: attached {} to book id={}", stored, id);
        Ok(book)
    }

    /// Delete a book and its attached file
    pub async fn delete_book(&self, id: i64) -> AppResult<Book> {
        let book = self.get_book(id).await?;

        if let Some(ref pdf) = book.pdf_file {
            self.pdfs.remove(pdf).await?;
        }
        self.repository.books.delete(id).await?;

        tracing::info!("Catalog: deleted book id={}", id);
        Ok(book)
    }

    /// Mark a book borrowed. Returns false when it already was.
    pub async fn issue_book(&self, id: i64) -> AppResult<bool> {
        let mut book = self.get_book(id).await?;
        if !book.issue() {
            return Ok(false);
        }
        self.repository.books.save(&book).await?;
        Ok(true)
    }

    /// Mark a book available again. Returns false when it already was.
    pub async fn return_book(&self, id: i64) -> AppResult<bool> {
        let mut book = self.get_book(id).await?;
        if !book.give_back() {
            return Ok(false);
        }
        self.repository.books.save(&book).await?;
        Ok(true)
    }
}
