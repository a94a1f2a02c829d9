//! A4 PDF writer.
//!
//! Each page is one full-bleed JPEG image with the page text drawn on top
//! in Helvetica.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{RasterImage, TextRun};

/// A4 width in points.
pub const A4_WIDTH_PT: f32 = 595.28;

/// A4 height in points.
pub const A4_HEIGHT_PT: f32 = 841.89;

const PT_PER_MM: f32 = 72.0 / 25.4;
const FONT_NAME: &str = "F1";
const PRODUCER: &str = concat!("carnet ", env!("CARGO_PKG_VERSION"));

/// A PDF document under construction.
#[derive(Debug)]
pub struct PdfDocument {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Start an empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
        }
    }

    /// Number of pages added so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append `image` as a new page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page content cannot be encoded.
    pub fn add_page(&mut self, image: &RasterImage) -> Result<()> {
        let image_name = format!("Im{}", self.page_ids.len() + 1);
        let image_id = self.doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                    "Filter" => "DCTDecode",
                },
                image.data.clone(),
            )
            .with_compression(false),
        );

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    A4_WIDTH_PT.into(),
                    0_i64.into(),
                    0_i64.into(),
                    A4_HEIGHT_PT.into(),
                    0_i64.into(),
                    0_i64.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        operations.extend(image.text.iter().flat_map(text_operations));

        let content = Content { operations }
            .encode()
            .map_err(|e| Error::pdf(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), A4_WIDTH_PT.into(), A4_HEIGHT_PT.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { FONT_NAME => self.font_id },
                "XObject" => dictionary! { image_name.as_str() => image_id },
            },
        });
        self.page_ids.push(page_id);

        debug!(
            "Added PDF page {} ({} text runs)",
            self.page_ids.len(),
            image.text.len()
        );
        Ok(())
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        #[allow(clippy::cast_possible_wrap)]
        let count = self.page_ids.len() as i64;
        doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Carnet de stage"),
            "Producer" => Object::string_literal(PRODUCER),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| Error::pdf(e.to_string()))?;
        Ok(bytes)
    }

    /// Write the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Operators drawing one text run. Coordinates come in millimetres from the
/// top-left corner of the sheet.
fn text_operations(run: &TextRun) -> Vec<Operation> {
    let x = run.x * PT_PER_MM;
    let y = A4_HEIGHT_PT - run.baseline * PT_PER_MM;
    let size = run.size * PT_PER_MM;
    let [r, g, b] = run.color.0;

    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.as_bytes().to_vec()), size.into()],
        ),
        Operation::new(
            "rg",
            vec![channel(r).into(), channel(g).into(), channel(b).into()],
        ),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(to_win_ansi(&run.text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn channel(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Encode `text` for a WinAnsi font. Characters outside the code page become `?`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'Œ' => 0x8C,
            'œ' => 0x9C,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blank_page(text: Vec<TextRun>) -> RasterImage {
        let canvas = image::RgbImage::from_pixel(4, 6, Rgb([255, 255, 255]));
        let mut data = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut data, 50)
            .encode_image(&canvas)
            .unwrap();
        RasterImage {
            width: 4,
            height: 6,
            data,
            text,
        }
    }

    fn run(text: &str) -> TextRun {
        TextRun {
            x: 15.0,
            baseline: 20.0,
            size: 5.0,
            color: Rgb([120, 53, 15]),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_to_win_ansi() {
        assert_eq!(to_win_ansi("abc"), b"abc".to_vec());
        assert_eq!(to_win_ansi("é"), vec![0xE9]);
        assert_eq!(to_win_ansi("J’ai"), vec![b'J', 0x92, b'a', b'i']);
        assert_eq!(to_win_ansi("œuvre"), vec![0x9C, b'u', b'v', b'r', b'e']);
        assert_eq!(to_win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn test_empty_document() {
        let pdf = PdfDocument::new();
        assert_eq!(pdf.page_count(), 0);

        let bytes = pdf.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_pages_are_written() {
        let mut pdf = PdfDocument::new();
        pdf.add_page(&blank_page(vec![run("JOUR 1")])).unwrap();
        pdf.add_page(&blank_page(vec![])).unwrap();
        assert_eq!(pdf.page_count(), 2);

        let bytes = pdf.to_bytes().unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
    }

    #[test]
    fn test_page_text_is_always_drawn() {
        let mut pdf = PdfDocument::new();
        pdf.add_page(&blank_page(vec![run("CARNET")])).unwrap();

        let bytes = pdf.to_bytes().unwrap();
        assert!(bytes.windows(8).any(|w| w == b"(CARNET)"));
    }

    #[test]
    fn test_text_operations_flip_y() {
        let ops = text_operations(&run("x"));
        let td = ops.iter().find(|op| op.operator == "Td").unwrap();
        let y = td.operands[1].as_float().unwrap();
        assert!((y - (A4_HEIGHT_PT - 20.0 * PT_PER_MM)).abs() < 0.01);
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let mut pdf = PdfDocument::new();
        pdf.add_page(&blank_page(vec![])).unwrap();
        pdf.save(&path).unwrap();

        assert!(Document::load(&path).is_ok());
    }
}
