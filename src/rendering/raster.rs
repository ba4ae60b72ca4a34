//! Rasterizer: executes paint commands into an RGBA bitmap

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use sha2::{Digest, Sha256};

use crate::rendering::layout::GLYPH_SIZE;
use crate::rendering::paint::{PaintCommand, Rgba};

/// An RGBA8 pixel buffer, row-major, top-left origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let (r, g, b, a) = fill;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[r, g, b, a]);
        }
        Self { width, height, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Source-over blend of one pixel; out-of-bounds writes are clipped.
    fn blend(&mut self, x: i64, y: i64, rgba: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let (r, g, b, a) = rgba;
        if a == 255 {
            self.pixels[i..i + 4].copy_from_slice(&[r, g, b, 255]);
            return;
        }
        let alpha = a as u32;
        let inv = 255 - alpha;
        let mix = |src: u8, dst: u8| ((src as u32 * alpha + dst as u32 * inv) / 255) as u8;
        self.pixels[i] = mix(r, self.pixels[i]);
        self.pixels[i + 1] = mix(g, self.pixels[i + 1]);
        self.pixels[i + 2] = mix(b, self.pixels[i + 2]);
        self.pixels[i + 3] = (alpha + self.pixels[i + 3] as u32 * inv / 255).min(255) as u8;
    }

    fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, rgba: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.width as i64);
        let y1 = (y + height).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, rgba);
            }
        }
    }

    /// RGB bytes with alpha composited over white, as the PDF image needs them
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as u32;
            for c in &px[..3] {
                out.push(((*c as u32 * a + 255 * (255 - a)) / 255) as u8);
            }
        }
        out
    }

    /// SHA-256 of the dimensions and pixel data, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draw `text` with its top-left at (x, y) in device pixels.
///
/// `cell` is the on-device size of one font pixel.
fn draw_text(bitmap: &mut Bitmap, x: i64, y: i64, text: &str, cell: i64, bold: bool, rgba: Rgba) {
    let advance = GLYPH_SIZE as i64 * cell;
    for (i, ch) in text.chars().enumerate() {
        let rows = glyph(ch);
        let gx = x + i as i64 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8u32 {
                // bit 0 is the leftmost pixel
                if (*bits >> col) & 1 == 0 {
                    continue;
                }
                let px = gx + col as i64 * cell;
                let py = y + row as i64 * cell;
                bitmap.fill_rect(px, py, cell, cell, rgba);
                if bold {
                    bitmap.fill_rect(px + cell.max(2) / 2, py, cell, cell, rgba);
                }
            }
        }
    }
}

/// Fit `image` inside the `width × height` device box at (x, y), centred,
/// keeping its aspect ratio.
fn draw_image(bitmap: &mut Bitmap, x: i64, y: i64, width: u32, height: u32, image: &RgbaImage) {
    let (iw, ih) = image.dimensions();
    if width == 0 || height == 0 || iw == 0 || ih == 0 {
        return;
    }
    let ratio = (width as f64 / iw as f64).min(height as f64 / ih as f64);
    let dw = ((iw as f64 * ratio).round() as u32).clamp(1, width);
    let dh = ((ih as f64 * ratio).round() as u32).clamp(1, height);
    let fitted = imageops::resize(image, dw, dh, FilterType::Triangle);
    let left = x + ((width - dw) / 2) as i64;
    let top = y + ((height - dh) / 2) as i64;
    for (px, py, pixel) in fitted.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        bitmap.blend(left + px as i64, top + py as i64, (r, g, b, a));
    }
}

/// Execute `commands` (in CSS pixels) into a `width × height` CSS-pixel
/// canvas rendered at `scale` device pixels per CSS pixel.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, scale: u32) -> Bitmap {
    let scale = scale.max(1);
    let s = scale as i64;
    let mut bitmap = Bitmap::new(width * scale, height * scale, (0, 0, 0, 0));

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                bitmap.fill_rect(*x as i64 * s, *y as i64 * s, *width as i64 * s, *height as i64 * s, *rgba);
            }
            PaintCommand::StrokeRect { x, y, width, height, rgba } => {
                let (x, y, w, h) = (*x as i64 * s, *y as i64 * s, *width as i64 * s, *height as i64 * s);
                bitmap.fill_rect(x, y, w, s, *rgba);
                bitmap.fill_rect(x, y + h - s, w, s, *rgba);
                bitmap.fill_rect(x, y, s, h, *rgba);
                bitmap.fill_rect(x + w - s, y, s, h, *rgba);
            }
            PaintCommand::Text { x, y, text, scale: text_scale, bold, rgba } => {
                let cell = *text_scale as i64 * s;
                draw_text(&mut bitmap, *x as i64 * s, *y as i64 * s, text, cell, *bold, *rgba);
            }
            PaintCommand::Image { x, y, width, height, image } => {
                draw_image(&mut bitmap, *x as i64 * s, *y as i64 * s, width * scale, height * scale, image);
            }
        }
    }
    bitmap
}
