//! Rendering: parse a document view, lay it out, paint it and rasterize it.
//!
//! This stands in for a browser's DOM-to-canvas capture. The output is a
//! deterministic RGBA bitmap, so golden tests can pin it by digest.

pub mod layout;
pub mod paint;
pub mod raster;

use log::debug;
use scraper::Html;

use crate::{Error, Result, Viewport};
pub use paint::Rgba;
pub use raster::Bitmap;

/// Largest capture, in device pixels, on either axis
pub const MAX_CAPTURE_DIMENSION: u32 = 32_768;

/// Everything a rasterizer needs to capture one mounted subtree
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    /// Markup of the subtree to capture
    pub html: String,
    /// Layout width in CSS pixels
    pub window_width: u32,
    /// Padding applied on every side, in CSS pixels
    pub padding: u32,
    /// Device pixels per CSS pixel
    pub scale: u32,
    pub background: Rgba,
    /// Whether images from other origins may be drawn
    pub allow_cross_origin: bool,
    /// Clip the capture to this many CSS pixels of height
    pub max_height: Option<u32>,
}

/// Converts a capture target into a bitmap
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, target: &CaptureTarget) -> Result<Bitmap>;
}

/// The built-in layout → paint → raster pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapRasterizer;

impl Rasterizer for BitmapRasterizer {
    fn rasterize(&self, target: &CaptureTarget) -> Result<Bitmap> {
        capture(target)
    }
}

/// Run the full pipeline on `target`.
pub fn capture(target: &CaptureTarget) -> Result<Bitmap> {
    if target.window_width == 0 || target.scale == 0 {
        return Err(Error::Render("capture needs a non-zero width and scale".into()));
    }
    let document = Html::parse_fragment(&target.html);
    let viewport = Viewport {
        width: target.window_width,
        height: 0,
    };
    let page = layout::layout_document(&document, viewport, target.padding, target.allow_cross_origin);
    let height = match target.max_height {
        Some(max) if page.height > max => {
            debug!("clipping capture from {} to {} px", page.height, max);
            max
        }
        _ => page.height,
    };

    let device_w = page.width.saturating_mul(target.scale);
    let device_h = height.saturating_mul(target.scale);
    if device_w > MAX_CAPTURE_DIMENSION || device_h > MAX_CAPTURE_DIMENSION {
        return Err(Error::Render(format!(
            "capture of {}x{} device pixels exceeds the {} limit",
            device_w, device_h, MAX_CAPTURE_DIMENSION
        )));
    }

    let commands = paint::paint_layout(&page, target.background);
    debug!(
        "rasterizing {} nodes / {} commands at {}x{} (scale {})",
        page.nodes.len(),
        commands.len(),
        page.width,
        height,
        target.scale
    );
    Ok(raster::rasterize(&commands, page.width, height, target.scale))
}
