//! Printable catalog report

pub mod font;
pub mod pdf;

use crate::{error::AppResult, models::Book};
use font::FontStyle;
use pdf::{Cell, Sheet};

pub const REPORT_FILENAME: &str = "Library_Catalog.pdf";
pub const REPORT_TITLE: &str = "BiblioTech Library Report";

const TITLE_MAX_CHARS: usize = 35;
const AUTHOR_MAX_CHARS: usize = 20;

/// (header, column width in mm)
const COLUMNS: [(&str, f64); 4] = [("Title", 80.0), ("Author", 50.0), ("Category", 30.0), ("Status", 30.0)];

/// Keep the first `max` characters, appending an ellipsis when anything was cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// The four cell texts printed for a book
pub fn row_cells(book: &Book) -> [String; 4] {
    [
        truncate(&book.title, TITLE_MAX_CHARS),
        truncate(&book.author, AUTHOR_MAX_CHARS),
        book.category.clone(),
        book.status.to_string(),
    ]
}

/// Render the whole catalog, in the given order, as a PDF document
pub fn render_catalog(books: &[Book]) -> AppResult<Vec<u8>> {
    let mut doc = Sheet::new()?;
    doc.add_page();

    doc.set_font(FontStyle::Regular, 12.0);
    doc.cell(Cell::new(200.0, 10.0, REPORT_TITLE).centered().line_break());
    doc.ln(Some(10.0));

    doc.set_font(FontStyle::Bold, 12.0);
    doc.set_fill_color(200, 220, 255);
    for (i, (header, width)) in COLUMNS.iter().enumerate() {
        let cell = Cell::new(*width, 10.0, header).bordered().centered().filled();
        doc.cell(if i == COLUMNS.len() - 1 { cell.line_break() } else { cell });
    }

    doc.set_font(FontStyle::Regular, 10.0);
    for book in books {
        let texts = row_cells(book);
        for (i, text) in texts.iter().enumerate() {
            let cell = Cell::new(COLUMNS[i].1, 10.0, text).bordered();
            doc.cell(if i == texts.len() - 1 { cell.line_break() } else { cell });
        }
    }

    tracing::debug!("Rendered catalog report: {} books, {} pages", books.len(), doc.page_count());
    doc.finish()
}
