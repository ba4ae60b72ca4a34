//! Single-image PDF encoding.
//!
//! Produces a one-page A4 portrait document whose only content is the
//! captured bitmap, drawn full-bleed from the top-left corner at a fixed
//! 210 mm width. Taller captures are clipped at the bottom of the page.

use std::io::Write;

use chrono::{DateTime, TimeZone};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::rendering::Bitmap;
use crate::{Error, Result};

pub const PDF_MIME: &str = "application/pdf";
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
const PT_PER_MM: f64 = 72.0 / 25.4;
const IMAGE_NAME: &str = "Im1";

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

/// Height in pixels of an A4 page that is `width_px` wide
pub fn page_height_px(width_px: u32) -> u32 {
    (width_px as f64 * A4_HEIGHT_MM / A4_WIDTH_MM).ceil() as u32
}

/// Where the image lands on the page, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ImagePlacement {
    /// Full page width, height scaled to keep the bitmap's aspect ratio
    pub fn full_width(bitmap_width: u32, bitmap_height: u32) -> Self {
        let height_mm = if bitmap_width == 0 {
            0.0
        } else {
            bitmap_height as f64 * A4_WIDTH_MM / bitmap_width as f64
        };
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm,
        }
    }
}

fn pdf_error(e: impl std::fmt::Display) -> Error {
    Error::Export(format!("PDF encoding failed: {}", e))
}

/// ASCII goes in as a literal; anything else as UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn pdf_date<Tz: TimeZone>(when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("D:{}", when.format("%Y%m%d%H%M%S"))
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Export(format!("image compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Export(format!("image compression failed: {}", e)))
}

/// Encode `bitmap` as the sole content of an A4 portrait page.
pub fn encode_single_image_pdf<Tz: TimeZone>(bitmap: &Bitmap, title: &str, created: &DateTime<Tz>) -> Result<Vec<u8>>
where
    Tz::Offset: std::fmt::Display,
{
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(Error::Export("cannot encode an empty capture".into()));
    }

    let page_w = mm_to_pt(A4_WIDTH_MM);
    let page_h = mm_to_pt(A4_HEIGHT_MM);
    let placement = ImagePlacement::full_width(bitmap.width, bitmap.height);
    let img_w = mm_to_pt(placement.width_mm);
    let img_h = mm_to_pt(placement.height_mm);

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(bitmap.width),
            "Height" => i64::from(bitmap.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        },
        deflate(&bitmap.to_rgb())?,
    );
    let image_id = doc.add_object(image);

    // PDF user space starts bottom-left; pin the image's top edge to the page top
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(img_w), 0_i64.into(), 0_i64.into(), real(img_h), 0_i64.into(), real(page_h - img_h)],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_error)?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0_i64.into(), 0_i64.into(), real(page_w), real(page_h)],
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1_i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(title),
        "Producer" => text_string(concat!("quotation-wizard ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(pdf_date(created)),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lopdf::Dictionary;

    fn bitmap(w: u32, h: u32) -> Bitmap {
        Bitmap::new(w, h, (255, 255, 255, 255))
    }

    fn encode(b: &Bitmap, title: &str) -> Document {
        let when = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let bytes = encode_single_image_pdf(b, title, &when).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        Document::load_mem(&bytes).unwrap()
    }

    fn only_page(doc: &Document) -> (lopdf::ObjectId, &Dictionary) {
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let id = *pages.values().next().unwrap();
        (id, doc.get_object(id).unwrap().as_dict().unwrap())
    }

    fn floats(objects: &[Object]) -> Vec<f32> {
        objects.iter().map(|o| o.as_float().unwrap()).collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn placement_keeps_aspect_ratio() {
        let p = ImagePlacement::full_width(1588, 2246);
        assert_eq!(p.width_mm, 210.0);
        assert!((p.height_mm - 297.0).abs() < 0.1);
        let p = ImagePlacement::full_width(200, 100);
        assert_eq!(p.height_mm, 105.0);
    }

    #[test]
    fn page_height_matches_a4() {
        assert_eq!(page_height_px(794), 1123);
        assert_eq!(page_height_px(210), 297);
    }

    #[test]
    fn single_a4_page() {
        let doc = encode(&bitmap(20, 10), "Quotation QT-2610-042");
        let (_, page) = only_page(&doc);
        let media = floats(page.get(b"MediaBox").unwrap().as_array().unwrap());
        assert_eq!(media.len(), 4);
        assert!(close(media[2], 595.28) && close(media[3], 841.89));
    }

    #[test]
    fn image_xobject_holds_the_bitmap() {
        let mut b = bitmap(20, 10);
        b.pixels[0..4].copy_from_slice(&[255, 0, 0, 255]);
        let doc = encode(&b, "t");
        let (_, page) = only_page(&doc);
        let xobjects = page
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"XObject"))
            .and_then(Object::as_dict)
            .unwrap();
        let image_id = xobjects.get(IMAGE_NAME.as_bytes()).and_then(Object::as_reference).unwrap();
        let stream = doc.get_object(image_id).and_then(Object::as_stream).unwrap();
        assert_eq!(stream.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 20);
        assert_eq!(stream.dict.get(b"Height").and_then(Object::as_i64).unwrap(), 10);
        let rgb = stream.decompressed_content().unwrap();
        assert_eq!(rgb.len(), 20 * 10 * 3);
        assert_eq!(&rgb[..6], &[255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn image_is_full_width_and_top_aligned() {
        let doc = encode(&bitmap(20, 10), "t");
        let (page_id, _) = only_page(&doc);
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let cm = content.operations.iter().find(|op| op.operator == "cm").unwrap();
        let m = floats(&cm.operands);
        // 210mm wide, 105mm tall, top edge on the page top
        assert!(close(m[0], 595.28));
        assert!(close(m[3], 297.64));
        assert!(close(m[5], 841.89 - 297.64));
        assert!(content.operations.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn info_carries_title_and_date() {
        let doc = encode(&bitmap(4, 4), "Quotation QT-2610-042");
        let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).unwrap();
        let info = doc.get_object(info_id).and_then(Object::as_dict).unwrap();
        assert_eq!(info.get(b"Title").and_then(Object::as_str).unwrap(), b"Quotation QT-2610-042");
        assert_eq!(info.get(b"CreationDate").and_then(Object::as_str).unwrap(), b"D:20261018120000");
    }

    #[test]
    fn empty_bitmap_is_an_error() {
        let when = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            encode_single_image_pdf(&bitmap(0, 0), "t", &when),
            Err(Error::Export(_))
        ));
    }

    #[test]
    fn non_ascii_titles_use_utf16() {
        assert!(matches!(text_string("ok"), Object::String(ref b, StringFormat::Literal) if b == b"ok"));
        match text_string("café") {
            Object::String(bytes, _) => assert_eq!(bytes, vec![0xFE, 0xFF, 0, b'c', 0, b'a', 0, b'f', 0, 0xE9]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
