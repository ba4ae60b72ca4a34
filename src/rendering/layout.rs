//! Block layout for document views.
//!
//! Walks parsed HTML and stacks blocks vertically inside a fixed-width page:
//! headings, paragraphs, tables and image boxes. Text uses a fixed 8px glyph
//! cell multiplied by the block's text scale.

use crate::Viewport;
use scraper::{ElementRef, Html, Node};

pub const GLYPH_SIZE: u32 = 8;
const LINE_GAP: u32 = 4;
const BLOCK_GAP: u32 = 8;
const CELL_PADDING: u32 = 6;
const DEFAULT_IMAGE_SIZE: u32 = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total * 2)
    }

    pub fn content_x(&self) -> i32 {
        self.rect.x + (self.box_model.border + self.box_model.padding) as i32
    }

    pub fn content_y(&self) -> i32 {
        self.rect.y + (self.box_model.border + self.box_model.padding) as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    fn from_class(class: &str) -> Option<Align> {
        class.split_whitespace().find_map(|c| match c {
            "text-left" => Some(Align::Left),
            "text-center" => Some(Align::Center),
            "text-right" => Some(Align::Right),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Title,
    Heading,
    Paragraph,
    TableHeaderCell,
    TableCell,
    Image { src: String },
}

/// A positioned block plus the text it shows, already wrapped into lines.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub lines: Vec<String>,
    pub elem_type: ElementType,
    pub scale: u32,
    pub bold: bool,
    pub align: Align,
}

impl LayoutNode {
    pub fn line_height(&self) -> u32 {
        line_height(self.scale)
    }
}

/// The result of laying out a whole document
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<LayoutNode>,
}

fn line_height(scale: u32) -> u32 {
    GLYPH_SIZE * scale + LINE_GAP
}

/// Greedy word wrap at `max_chars` per line; overlong words are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if cur_len > 0 && cur_len + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut cur));
            cur_len = 0;
        }
        if cur_len > 0 {
            cur.push(' ');
            cur_len += 1;
        }
        cur_len += word.len();
        cur.extend(word);
    }
    if cur_len > 0 {
        lines.push(cur);
    }
    lines
}

fn collapsed_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_align(el: ElementRef, inherited: Align) -> Align {
    el.value().attr("class").and_then(Align::from_class).unwrap_or(inherited)
}

fn attr_px(el: ElementRef, name: &str) -> Option<u32> {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
}

fn cells_of<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .collect()
}

fn col_span(cell: ElementRef) -> u32 {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

struct Flow {
    x: i32,
    width: u32,
    y: u32,
    allow_cross_origin: bool,
    nodes: Vec<LayoutNode>,
}

impl Flow {
    fn text_block(&mut self, text: &str, elem_type: ElementType, scale: u32, bold: bool, align: Align) {
        if text.is_empty() {
            return;
        }
        let chars_per_line = (self.width / (GLYPH_SIZE * scale)) as usize;
        let lines = wrap_text(text, chars_per_line);
        let height = lines.len() as u32 * line_height(scale);
        self.nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: self.x,
                    y: self.y as i32,
                    width: self.width,
                    height,
                },
                box_model: BoxModel {
                    margin: BLOCK_GAP,
                    border: 0,
                    padding: 0,
                },
            },
            lines,
            elem_type,
            scale,
            bold,
            align,
        });
        self.y += height + BLOCK_GAP;
    }

    fn image(&mut self, el: ElementRef, align: Align) {
        let src = el.value().attr("src").unwrap_or_default().to_string();
        let remote = src.starts_with("http://") || src.starts_with("https://");
        if remote && !self.allow_cross_origin {
            // A tainted image is left out of the capture entirely
            return;
        }
        let width = attr_px(el, "width").unwrap_or(DEFAULT_IMAGE_SIZE).min(self.width);
        let height = attr_px(el, "height").unwrap_or(DEFAULT_IMAGE_SIZE);
        let x = match align {
            Align::Left => self.x,
            Align::Center => self.x + ((self.width - width) / 2) as i32,
            Align::Right => self.x + (self.width - width) as i32,
        };
        let alt = el.value().attr("alt").unwrap_or_default();
        let max_chars = (width.saturating_sub(4) / GLYPH_SIZE) as usize;
        self.nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x,
                    y: self.y as i32,
                    width,
                    height,
                },
                box_model: BoxModel {
                    margin: BLOCK_GAP,
                    border: 1,
                    padding: 1,
                },
            },
            lines: wrap_text(alt, max_chars),
            elem_type: ElementType::Image { src },
            scale: 1,
            bold: false,
            align: Align::Center,
        });
        self.y += height + BLOCK_GAP;
    }

    fn table(&mut self, table: ElementRef, align: Align) {
        let rows: Vec<ElementRef> = table
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "tr")
            .collect();
        let columns = rows
            .iter()
            .map(|r| cells_of(*r).into_iter().map(col_span).sum::<u32>())
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }
        let col_width = self.width / columns;

        for row in rows {
            let row_align = element_align(row, align);
            let mut col = 0u32;
            let mut pending = Vec::new();
            let mut row_lines = 1usize;
            for cell in cells_of(row) {
                let cols = col_span(cell).min(columns - col.min(columns));
                if cols == 0 {
                    break;
                }
                let width = if col + cols == columns {
                    self.width - col_width * col
                } else {
                    col_width * cols
                };
                let inner = width.saturating_sub((CELL_PADDING + 1) * 2);
                let lines = wrap_text(&collapsed_text(cell), (inner / GLYPH_SIZE) as usize);
                row_lines = row_lines.max(lines.len());
                let header = cell.value().name() == "th";
                pending.push((self.x + (col_width * col) as i32, width, lines, header, element_align(cell, row_align)));
                col += cols;
            }
            let height = row_lines as u32 * line_height(1) + CELL_PADDING * 2 + 2;
            for (x, width, lines, header, cell_align) in pending {
                self.nodes.push(LayoutNode {
                    lb: LayoutBox {
                        rect: Rect {
                            x,
                            y: self.y as i32,
                            width,
                            height,
                        },
                        box_model: BoxModel {
                            margin: 0,
                            border: 1,
                            padding: CELL_PADDING,
                        },
                    },
                    lines,
                    elem_type: if header { ElementType::TableHeaderCell } else { ElementType::TableCell },
                    scale: 1,
                    bold: header,
                    align: cell_align,
                });
            }
            // Adjacent rows share a border line
            self.y += height - 1;
        }
        self.y += 1 + BLOCK_GAP;
    }

    fn walk(&mut self, el: ElementRef, inherited: Align) {
        let align = element_align(el, inherited);
        match el.value().name() {
            "head" | "style" | "script" | "title" | "br" => {}
            "h1" => self.text_block(&collapsed_text(el), ElementType::Title, 2, true, align),
            "h2" => self.text_block(&collapsed_text(el), ElementType::Heading, 2, true, align),
            "h3" | "h4" | "h5" | "h6" => self.text_block(&collapsed_text(el), ElementType::Heading, 1, true, align),
            "p" | "li" => self.text_block(&collapsed_text(el), ElementType::Paragraph, 1, false, align),
            "table" => self.table(el, align),
            "img" => self.image(el, align),
            _ => {
                for child in el.children() {
                    match child.value() {
                        Node::Element(_) => {
                            if let Some(child_el) = ElementRef::wrap(child) {
                                self.walk(child_el, align);
                            }
                        }
                        Node::Text(text) => {
                            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                            self.text_block(&text, ElementType::Paragraph, 1, false, align);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Lay out `document` inside a page `viewport.width` pixels wide with
/// `padding` pixels on every side.
///
/// The page grows to fit its content; `viewport.height` only sets a minimum.
pub fn layout_document(document: &Html, viewport: Viewport, padding: u32, allow_cross_origin: bool) -> PageLayout {
    let mut flow = Flow {
        x: padding as i32,
        width: viewport.width.saturating_sub(padding * 2).max(GLYPH_SIZE),
        y: padding,
        allow_cross_origin,
        nodes: Vec::new(),
    };
    flow.walk(document.root_element(), Align::Left);

    // The trailing block gap is replaced by the bottom padding
    let content_bottom = if flow.nodes.is_empty() { padding } else { flow.y - BLOCK_GAP };
    PageLayout {
        width: viewport.width,
        height: (content_bottom + padding).max(viewport.height),
        nodes: flow.nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn vp(width: u32) -> Viewport {
        Viewport { width, height: 0 }
    }

    #[test]
    fn layout_document_places_title_and_paragraphs() {
        let html = "<html><head><title>Test Title</title></head><body><h1>Heading</h1><p>Hello world</p><p>More text</p></body></html>";
        let doc = Html::parse_document(html);
        let page = layout_document(&doc, vp(200), 8, true);
        assert_eq!(page.nodes.len(), 3);
        assert_eq!(page.nodes[0].elem_type, ElementType::Title);
        assert_eq!(page.nodes[0].scale, 2);
        assert_eq!(page.nodes[1].elem_type, ElementType::Paragraph);
        assert!(page.nodes[1].lb.rect.y > page.nodes[0].lb.rect.y);
        assert_eq!(page.nodes[1].lb.rect.width, 184);
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 4).is_empty());
    }

    #[test]
    fn table_cells_share_rows() {
        let html = r#"<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td class="text-right">2</td></tr><tr><td colspan="2">wide</td></tr></table>"#;
        let doc = Html::parse_fragment(html);
        let page = layout_document(&doc, vp(216), 8, true);
        assert_eq!(page.nodes.len(), 5);
        assert_eq!(page.nodes[0].elem_type, ElementType::TableHeaderCell);
        assert_eq!(page.nodes[0].lb.rect.y, page.nodes[1].lb.rect.y);
        assert_eq!(page.nodes[1].lb.rect.x, 8 + 100);
        assert_eq!(page.nodes[3].align, Align::Right);
        assert_eq!(page.nodes[4].lb.rect.width, 200);
    }

    #[test]
    fn alignment_is_inherited() {
        let doc = Html::parse_fragment(r#"<div class="text-center"><h1>Quotation</h1><p class="text-left">x</p></div>"#);
        let page = layout_document(&doc, vp(300), 10, true);
        assert_eq!(page.nodes[0].align, Align::Center);
        assert_eq!(page.nodes[1].align, Align::Left);
    }

    #[test]
    fn page_grows_with_content() {
        let many: String = (0..50).map(|i| format!("<p>line {}</p>", i)).collect();
        let doc = Html::parse_fragment(&many);
        let page = layout_document(&doc, Viewport { width: 200, height: 100 }, 10, true);
        assert!(page.height > 50 * line_height(1));
        let empty = layout_document(&Html::parse_fragment(""), Viewport { width: 200, height: 100 }, 10, true);
        assert_eq!(empty.height, 100);
    }

    #[test]
    fn remote_images_need_cross_origin() {
        let html = r#"<img src="https://example.com/logo.png" alt="Logo"><img src="data:image/png;base64,AA==" alt="Inline">"#;
        let doc = Html::parse_fragment(html);
        assert_eq!(layout_document(&doc, vp(300), 0, true).nodes.len(), 2);
        let strict = layout_document(&doc, vp(300), 0, false);
        assert_eq!(strict.nodes.len(), 1);
        assert!(matches!(strict.nodes[0].elem_type, ElementType::Image { .. }));
    }
}
