//! Built-in page rasterizer.
//!
//! Paints the layout of a page onto an RGB canvas with the `image` crate and
//! encodes it as JPEG. Glyphs are not painted; text travels alongside the
//! picture as the page's text layer.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{trace, warn};

use super::layout::{self, Block, Rect, TextRun, AMBER_100, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, WHITE};
use super::{RasterImage, Rasterizer};
use crate::config::PdfConfig;
use crate::error::Result;
use crate::record::EncodedImage;
use crate::view::PageView;

const MM_PER_INCH: f32 = 25.4;

/// Rasterizer painting pages at a fixed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRasterizer {
    dpi: u32,
    jpeg_quality: u8,
}

impl PageRasterizer {
    /// Create a rasterizer. `jpeg_quality` is clamped to 1..=100.
    #[must_use]
    pub fn new(dpi: u32, jpeg_quality: u8) -> Self {
        Self {
            dpi: dpi.max(1),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Create a rasterizer from the PDF settings.
    #[must_use]
    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(config.dpi, config.jpeg_quality)
    }

    /// Canvas size in pixels for one A4 page.
    #[must_use]
    pub fn page_size(&self) -> (u32, u32) {
        (self.px(PAGE_WIDTH_MM).max(1), self.px(PAGE_HEIGHT_MM).max(1))
    }

    /// Paint a page and collect its text layer.
    #[must_use]
    pub fn paint(&self, view: &PageView<'_>) -> (RgbImage, Vec<TextRun>) {
        let (width, height) = self.page_size();
        let mut canvas = RgbImage::from_pixel(width, height, WHITE);

        let blocks = layout::layout(view);
        for block in &blocks {
            match block {
                Block::Fill(rect, color) => self.fill(&mut canvas, rect, *color),
                Block::Outline(rect, color) => self.outline(&mut canvas, rect, *color),
                Block::Photo(rect, photo) => self.photo(&mut canvas, rect, photo),
                // Glyphs go on the PDF text layer.
                Block::Text(_) => {}
            }
        }

        (canvas, layout::text_runs(&blocks))
    }

    fn px(&self, mm: f32) -> u32 {
        #[allow(clippy::cast_precision_loss)]
        let scaled = mm * self.dpi as f32 / MM_PER_INCH;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = scaled.max(0.0).round() as u32;
        px
    }

    /// Pixel bounds of `rect`, clipped to the canvas.
    fn bounds(&self, canvas: &RgbImage, rect: &Rect) -> (u32, u32, u32, u32) {
        let x0 = self.px(rect.x).min(canvas.width());
        let y0 = self.px(rect.y).min(canvas.height());
        let x1 = self.px(rect.x + rect.width).min(canvas.width());
        let y1 = self.px(rect.bottom()).min(canvas.height());
        (x0, y0, x1, y1)
    }

    fn fill(&self, canvas: &mut RgbImage, rect: &Rect, color: Rgb<u8>) {
        let (x0, y0, x1, y1) = self.bounds(canvas, rect);
        for y in y0..y1 {
            for x in x0..x1 {
                canvas.put_pixel(x, y, color);
            }
        }
    }

    fn outline(&self, canvas: &mut RgbImage, rect: &Rect, color: Rgb<u8>) {
        let (x0, y0, x1, y1) = self.bounds(canvas, rect);
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        for x in x0..x1 {
            canvas.put_pixel(x, y0, color);
            canvas.put_pixel(x, y1 - 1, color);
        }
        for y in y0..y1 {
            canvas.put_pixel(x0, y, color);
            canvas.put_pixel(x1 - 1, y, color);
        }
    }

    fn photo(&self, canvas: &mut RgbImage, rect: &Rect, photo: &EncodedImage) {
        let (x0, y0, x1, y1) = self.bounds(canvas, rect);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let decoded = photo
            .decode()
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(Into::into));
        match decoded {
            Ok(img) => {
                let scaled = img
                    .resize_to_fill(x1 - x0, y1 - y0, FilterType::Triangle)
                    .to_rgb8();
                imageops::overlay(canvas, &scaled, i64::from(x0), i64::from(y0));
            }
            Err(e) => {
                warn!("Skipping unreadable photo: {}", e);
                self.fill(canvas, rect, AMBER_100);
            }
        }
    }
}

#[async_trait]
impl Rasterizer for PageRasterizer {
    fn name(&self) -> &'static str {
        "page"
    }

    async fn rasterize(&self, view: &PageView<'_>) -> Result<RasterImage> {
        let (canvas, text) = self.paint(view);

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.jpeg_quality).encode_image(&canvas)?;
        trace!(
            "Rasterized page {} to {} bytes at {} dpi",
            view.index,
            data.len(),
            self.dpi
        );

        Ok(RasterImage {
            width: canvas.width(),
            height: canvas.height(),
            data,
            text,
        })
    }
}
