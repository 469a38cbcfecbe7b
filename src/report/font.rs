//! TrueType faces embedded in the report
//!
//! Text is written with one CID per UTF-16 code unit, so a content stream string is
//! plain UTF-16BE. A `CIDToGIDMap` stream maps those codes to glyphs of the face.
//! Characters outside the Basic Multilingual Plane are printed as `?`.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{Face, GlyphId};

use crate::error::{AppError, AppResult};

const REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const REPLACEMENT: u16 = b'?' as u16;

/// `bfchar` blocks of a CMap hold at most 100 entries
const CMAP_BLOCK: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    pub(crate) fn resource(&self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
        }
    }
}

pub struct EmbeddedFont {
    base_name: &'static str,
    data: &'static [u8],
    face: Face<'static>,
    used: BTreeSet<u16>,
}

impl EmbeddedFont {
    pub fn load(style: FontStyle) -> AppResult<Self> {
        let (base_name, data) = match style {
            FontStyle::Regular => ("DejaVuSans", REGULAR),
            FontStyle::Bold => ("DejaVuSans-Bold", BOLD),
        };
        let face = Face::parse(data, 0)
            .map_err(|e| AppError::Internal(format!("Failed to parse font {}: {}", base_name, e)))?;

        Ok(Self {
            base_name,
            data,
            face,
            used: BTreeSet::new(),
        })
    }

    fn code(c: char) -> u16 {
        u16::try_from(c as u32).unwrap_or(REPLACEMENT)
    }

    fn glyph(&self, code: u16) -> GlyphId {
        char::from_u32(code as u32)
            .and_then(|c| self.face.glyph_index(c))
            .unwrap_or(GlyphId(0))
    }

    /// Advance width in thousandths of an em
    fn advance(&self, code: u16) -> f64 {
        let units = self.face.glyph_hor_advance(self.glyph(code)).unwrap_or(0);
        units as f64 * 1000.0 / self.face.units_per_em() as f64
    }

    fn scaled(&self, units: i16) -> i64 {
        (units as f64 * 1000.0 / self.face.units_per_em() as f64).round() as i64
    }

    /// Whether every character of `text` has a glyph in this face
    pub fn covers(&self, text: &str) -> bool {
        text.chars().all(|c| self.face.glyph_index(c).is_some())
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: f64 = text.chars().map(|c| self.advance(Self::code(c))).sum();
        units * size / 1000.0
    }

    /// Bytes of a `Tj` operand for `text`; the codes are kept for embedding
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let code = Self::code(c);
            self.used.insert(code);
            out.extend_from_slice(&code.to_be_bytes());
        }
        out
    }

    fn cid_to_gid_map(&self) -> Vec<u8> {
        let last = self.used.last().copied().unwrap_or(0) as usize;
        let mut map = vec![0u8; (last + 1) * 2];
        for &code in &self.used {
            let at = code as usize * 2;
            map[at..at + 2].copy_from_slice(&self.glyph(code).0.to_be_bytes());
        }
        map
    }

    fn widths(&self) -> Vec<Object> {
        self.used
            .iter()
            .flat_map(|&code| {
                [
                    Object::Integer(code as i64),
                    Object::Array(vec![Object::Integer(self.advance(code).round() as i64)]),
                ]
            })
            .collect()
    }

    fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let codes: Vec<u16> = self.used.iter().copied().collect();
        for block in codes.chunks(CMAP_BLOCK) {
            let _ = writeln!(cmap, "{} beginbfchar", block.len());
            for code in block {
                let _ = writeln!(cmap, "<{:04X}> <{:04X}>", code, code);
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    /// Write the Type0 font with its CID font, descriptor and font program.
    /// Returns the id of the font dictionary to list under the page resources.
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let font_file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.to_vec(),
        ));

        let bbox = self.face.global_bounding_box();
        let ascender = self.face.ascender();
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.base_name,
            "Flags" => 32,
            "FontBBox" => vec![
                self.scaled(bbox.x_min).into(),
                self.scaled(bbox.y_min).into(),
                self.scaled(bbox.x_max).into(),
                self.scaled(bbox.y_max).into(),
            ],
            "ItalicAngle" => 0,
            "Ascent" => self.scaled(ascender),
            "Descent" => self.scaled(self.face.descender()),
            "CapHeight" => self.scaled(self.face.capital_height().unwrap_or(ascender)),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let map_id = doc.add_object(Stream::new(dictionary! {}, self.cid_to_gid_map()));
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => self.base_name,
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => self.advance(0).round() as i64,
            "W" => self.widths(),
            "CIDToGIDMap" => map_id,
        });

        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            self.to_unicode_cmap().into_bytes(),
        ));

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => self.base_name,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font_id.into()],
            "ToUnicode" => to_unicode_id,
        })
    }
}
