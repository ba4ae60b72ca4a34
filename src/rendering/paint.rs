//! Paint commands produced from a page layout

use std::sync::Arc;

use image::RgbaImage;
use log::debug;

use crate::model::ImageAttachment;
use crate::rendering::layout::{Align, ElementType, LayoutNode, PageLayout, GLYPH_SIZE};

pub type Rgba = (u8, u8, u8, u8);

pub const WHITE: Rgba = (255, 255, 255, 255);
pub const TEXT: Rgba = (17, 24, 39, 255);
pub const MUTED_TEXT: Rgba = (75, 85, 99, 255);
pub const BORDER: Rgba = (221, 221, 221, 255);
pub const HEADER_FILL: Rgba = (242, 242, 242, 255);
pub const IMAGE_FILL: Rgba = (249, 250, 251, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// One-pixel outline
    StrokeRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        bold: bool,
        rgba: Rgba,
    },
    /// Decoded image fitted inside the box, aspect ratio kept
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image: Arc<RgbaImage>,
    },
}

/// Decode an inline `data:` image. Remote or unreadable sources give `None`.
pub fn decode_image(src: &str) -> Option<RgbaImage> {
    let attachment = ImageAttachment::from_data_url("inline", src)?;
    match image::load_from_memory(attachment.bytes()) {
        Ok(decoded) => Some(decoded.to_rgba8()),
        Err(e) => {
            debug!("image not drawn: {}", e);
            None
        }
    }
}

fn text_commands(node: &LayoutNode, rgba: Rgba, out: &mut Vec<PaintCommand>) {
    let content_x = node.lb.content_x();
    let content_w = node.lb.content_width() as i32;
    let glyph_w = (GLYPH_SIZE * node.scale) as i32;
    let line_h = node.line_height() as i32;

    // Image captions sit in the vertical middle of their frame
    let block_h = node.lines.len() as i32 * line_h;
    let top = match node.elem_type {
        ElementType::Image { .. } => node.lb.rect.y + (node.lb.rect.height as i32 - block_h) / 2,
        _ => node.lb.content_y(),
    };

    for (i, line) in node.lines.iter().enumerate() {
        let line_w = line.chars().count() as i32 * glyph_w;
        let x = match node.align {
            Align::Left => content_x,
            Align::Center => content_x + (content_w - line_w).max(0) / 2,
            Align::Right => content_x + (content_w - line_w).max(0),
        };
        out.push(PaintCommand::Text {
            x,
            y: top + i as i32 * line_h,
            text: line.clone(),
            scale: node.scale,
            bold: node.bold,
            rgba,
        });
    }
}

/// Turn a layout into an ordered list of paint commands, page background first.
pub fn paint_layout(layout: &PageLayout, background: Rgba) -> Vec<PaintCommand> {
    let mut out = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: layout.width,
        height: layout.height,
        rgba: background,
    }];

    for node in &layout.nodes {
        let r = &node.lb.rect;
        match &node.elem_type {
            ElementType::Image { src } => {
                if let Some(image) = decode_image(src) {
                    out.push(PaintCommand::Image {
                        x: r.x,
                        y: r.y,
                        width: r.width,
                        height: r.height,
                        image: Arc::new(image),
                    });
                    continue;
                }
                // Undecodable images keep a framed placeholder with the alt text
                out.push(PaintCommand::SolidRect {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                    rgba: IMAGE_FILL,
                });
                out.push(PaintCommand::StrokeRect {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                    rgba: BORDER,
                });
                text_commands(node, MUTED_TEXT, &mut out);
            }
            ElementType::TableHeaderCell | ElementType::TableCell => {
                if node.elem_type == ElementType::TableHeaderCell {
                    out.push(PaintCommand::SolidRect {
                        x: r.x,
                        y: r.y,
                        width: r.width,
                        height: r.height,
                        rgba: HEADER_FILL,
                    });
                }
                out.push(PaintCommand::StrokeRect {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                    rgba: BORDER,
                });
                text_commands(node, TEXT, &mut out);
            }
            ElementType::Title | ElementType::Heading | ElementType::Paragraph => {
                text_commands(node, TEXT, &mut out);
            }
        }
    }
    out
}
