use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::composition::domain::document_writer::DocumentWriter;
use crate::shared::constants::{A4_HEIGHT_PT, A4_WIDTH_PT, JPEG_QUALITY};
use crate::shared::frame::Frame;

const IMAGE_NAME: &str = "Page";

/// Writes pages as a PDF with one A4 page per frame.
///
/// Each frame is embedded as a JPEG image scaled uniformly to fit the media
/// box, centred horizontally and aligned to the top edge. Pages taller than
/// the A4 ratio leave white margins at the sides instead of being squashed.
pub struct PdfDocumentWriter {
    jpeg_quality: u8,
    page_size: (f64, f64),
}

impl PdfDocumentWriter {
    pub fn new() -> Self {
        Self {
            jpeg_quality: JPEG_QUALITY,
            page_size: (A4_WIDTH_PT, A4_HEIGHT_PT),
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    fn media_box(&self) -> Vec<Object> {
        let (width, height) = self.page_size;
        vec![
            0_i64.into(),
            0_i64.into(),
            (width.round() as i64).into(),
            (height.round() as i64).into(),
        ]
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        frame: &Frame,
    ) -> Result<ObjectId, Box<dyn std::error::Error>> {
        let rgb = frame
            .to_rgb_image()
            .ok_or_else(|| format!("page {} is not an RGB image", frame.index()))?;
        let mut jpeg = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality).encode_image(&rgb)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => frame.width() as i64,
                "Height" => frame.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg.into_inner(),
        ));

        // Image space is the unit square.
        let placement = fit_to_page(frame.width(), frame.height(), self.page_size);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        0_i64.into(),
                        0_i64.into(),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        }))
    }
}

/// Where an image lands on a page, in points from the bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

fn fit_to_page(width: u32, height: u32, page_size: (f64, f64)) -> Placement {
    let (page_width, page_height) = page_size;
    let scale = (page_width / f64::from(width.max(1))).min(page_height / f64::from(height.max(1)));
    let drawn_width = f64::from(width) * scale;
    let drawn_height = f64::from(height) * scale;
    Placement {
        x: ((page_width - drawn_width) / 2.0) as f32,
        y: (page_height - drawn_height) as f32,
        width: drawn_width as f32,
        height: drawn_height as f32,
    }
}

impl Default for PdfDocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWriter for PdfDocumentWriter {
    fn write(&self, path: &Path, pages: &[Frame]) -> Result<(), Box<dyn std::error::Error>> {
        if pages.is_empty() {
            return Err("cannot write a document without pages".into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for page in pages {
            kids.push(Object::Reference(self.add_page(&mut doc, pages_id, page)?));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "MediaBox" => self.media_box(),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.save(path)?;
        log::debug!("Wrote {} pages to {}", pages.len(), path.display());
        Ok(())
    }
}
