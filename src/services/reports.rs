//! Catalog report generation

use crate::{error::AppResult, report, repository::Repository};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Current catalog rendered as a PDF, in the order books were added
    pub async fn catalog_pdf(&self) -> AppResult<Vec<u8>> {
        let books = self.repository.books.list().await?;
        report::render_catalog(&books)
    }
}
