//! Rendering pages to raster images.
//!
//! PDF assembly only needs "take a snapshot of the current page". That
//! capability is the [`Rasterizer`] trait; [`PageRasterizer`] is the
//! built-in implementation.

pub mod layout;
pub mod raster;

use async_trait::async_trait;

pub use layout::TextRun;
pub use raster::PageRasterizer;

use crate::error::Result;
use crate::view::PageView;

/// A rasterized page: JPEG pixels plus the text drawn on them.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Baseline JPEG data.
    pub data: Vec<u8>,
    /// Text layer, in millimetres on the A4 sheet.
    pub text: Vec<TextRun>,
}

/// Renders a page view to a raster image.
///
/// Implementors provide the actual drawing backend. A failure aborts the
/// export that requested the snapshot.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// The name of this rasterizer (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Take a snapshot of `view`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be drawn or encoded.
    async fn rasterize(&self, view: &PageView<'_>) -> Result<RasterImage>;
}
