//! A4 cell sheet for tabular reports, written out with lopdf
//!
//! Coordinates are in millimetres from the top-left corner of a portrait page. A
//! cursor advances across a row of fixed-width cells and wraps to the left margin on
//! line breaks. The document carries no timestamps or ids, so identical input yields
//! identical bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::font::{EmbeddedFont, FontStyle};
use crate::error::{AppError, AppResult};

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 10.0;
const BOTTOM_MARGIN_MM: f64 = 20.0;
const CELL_MARGIN_MM: f64 = 1.0;
const LINE_WIDTH_MM: f64 = 0.2;
const PT_PER_MM: f64 = 72.0 / 25.4;

fn pt(mm: f64) -> Object {
    Object::from(mm * PT_PER_MM)
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Failed to write PDF: {}", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// How a cell ends: keep going on the same row, or wrap to the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Right,
    NextLine,
}

#[derive(Debug, Clone)]
pub struct Cell<'a> {
    pub width: f64,
    pub height: f64,
    pub text: &'a str,
    pub border: bool,
    pub align: Align,
    pub fill: bool,
    pub advance: Advance,
}

impl<'a> Cell<'a> {
    pub fn new(width: f64, height: f64, text: &'a str) -> Self {
        Self {
            width,
            height,
            text,
            border: false,
            align: Align::Left,
            fill: false,
            advance: Advance::Right,
        }
    }

    pub fn bordered(mut self) -> Self {
        self.border = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn filled(mut self) -> Self {
        self.fill = true;
        self
    }

    pub fn line_break(mut self) -> Self {
        self.advance = Advance::NextLine;
        self
    }
}

pub struct Sheet {
    regular: EmbeddedFont,
    bold: EmbeddedFont,
    pages: Vec<Vec<Operation>>,
    style: FontStyle,
    font_size: f64,
    fill_rgb: (u8, u8, u8),
    x: f64,
    y: f64,
    last_height: f64,
}

impl Sheet {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            regular: EmbeddedFont::load(FontStyle::Regular)?,
            bold: EmbeddedFont::load(FontStyle::Bold)?,
            pages: Vec::new(),
            style: FontStyle::Regular,
            font_size: 12.0,
            fill_rgb: (255, 255, 255),
            x: MARGIN_MM,
            y: MARGIN_MM,
            last_height: 0.0,
        })
    }

    fn font(&self) -> &EmbeddedFont {
        match self.style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    fn font_mut(&mut self) -> &mut EmbeddedFont {
        match self.style {
            FontStyle::Regular => &mut self.regular,
            FontStyle::Bold => &mut self.bold,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages
            .push(vec![Operation::new("w", vec![pt(LINE_WIDTH_MM)])]);
        self.x = MARGIN_MM;
        self.y = MARGIN_MM;
    }

    pub fn set_font(&mut self, style: FontStyle, size: f64) {
        self.style = style;
        self.font_size = size;
    }

    pub fn set_fill_color(&mut self, r: u8, g: u8, b: u8) {
        self.fill_rgb = (r, g, b);
    }

    /// Width of `text` in millimetres in the current font
    pub fn text_width(&self, text: &str) -> f64 {
        self.font().text_width(text, self.font_size) / PT_PER_MM
    }

    /// Move down `height` millimetres (or the last cell height) and back to the left margin
    pub fn ln(&mut self, height: Option<f64>) {
        self.x = MARGIN_MM;
        self.y += height.unwrap_or(self.last_height);
    }

    pub fn cell(&mut self, cell: Cell<'_>) {
        if self.pages.is_empty() {
            self.add_page();
        }
        // Start a fresh page when a row would cross the bottom margin
        if self.y + cell.height > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM && self.x <= MARGIN_MM {
            self.add_page();
        }

        let mut ops = Vec::new();
        if cell.fill || cell.border {
            if cell.fill {
                let (r, g, b) = self.fill_rgb;
                ops.push(Operation::new(
                    "rg",
                    vec![
                        Object::from(r as f64 / 255.0),
                        Object::from(g as f64 / 255.0),
                        Object::from(b as f64 / 255.0),
                    ],
                ));
            }
            ops.push(Operation::new(
                "re",
                vec![
                    pt(self.x),
                    pt(PAGE_HEIGHT_MM - self.y),
                    pt(cell.width),
                    pt(-cell.height),
                ],
            ));
            let paint = match (cell.fill, cell.border) {
                (true, true) => "B",
                (true, false) => "f",
                _ => "S",
            };
            ops.push(Operation::new(paint, vec![]));
        }

        if !cell.text.is_empty() {
            let dx = match cell.align {
                Align::Center => (cell.width - self.text_width(cell.text)) / 2.0,
                Align::Left => CELL_MARGIN_MM,
            };
            let baseline = self.y + 0.5 * cell.height + 0.3 * self.font_size / PT_PER_MM;
            let resource = self.style.resource();
            let size = self.font_size;
            let encoded = self.font_mut().encode(cell.text);

            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("g", vec![0.into()]));
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(resource.as_bytes().to_vec()), Object::from(size)],
            ));
            ops.push(Operation::new(
                "Td",
                vec![pt(self.x + dx), pt(PAGE_HEIGHT_MM - baseline)],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encoded, StringFormat::Hexadecimal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }

        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }

        self.last_height = cell.height;
        match cell.advance {
            Advance::Right => self.x += cell.width,
            Advance::NextLine => {
                self.x = MARGIN_MM;
                self.y += cell.height;
            }
        }
    }

    /// Serialize the document
    pub fn finish(mut self) -> AppResult<Vec<u8>> {
        if self.pages.is_empty() {
            self.add_page();
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = self.regular.embed(&mut doc);
        let bold_id = self.bold.embed(&mut doc);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FontStyle::Regular.resource() => regular_id,
                FontStyle::Bold.resource() => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in std::mem::take(&mut self.pages) {
            let content = Content { operations }.encode().map_err(pdf_error)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), pt(PAGE_WIDTH_MM), pt(PAGE_HEIGHT_MM)],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(pdf_error)?;
        Ok(out)
    }
}

/// Strings shown with `Tj`, page by page, decoded from their UTF-16BE codes
#[cfg(test)]
pub(crate) fn shown_text(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut runs = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for op in content.operations.iter().filter(|op| op.operator == "Tj") {
            if let Some(Object::String(bytes, _)) = op.operands.first() {
                let units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                runs.push(String::from_utf16(&units).unwrap());
            }
        }
    }
    runs
}
