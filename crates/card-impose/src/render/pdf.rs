//! PDF document backend
//!
//! Assembles a lopdf document page by page. Content is accumulated as raw
//! content-stream operators while drawing; `finalize` builds the object
//! tree (pages node, catalog, shared font, image XObjects) and compresses.
//!
//! PDF user space is points with a bottom-left origin, so every operation
//! converts from layout millimeters and flips the y axis against the page
//! height.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::constants::mm_to_pt;
use crate::options::LayoutOptions;
use crate::types::Color;
use crate::{ImposeError, Result};

use super::{ImageOp, LineOp, LineStyle, RectOp, RenderAdapter, TextOp, decode_inline, inline_mime};

struct PdfPage {
    content: String,
    /// Resource-name to XObject pairs referenced by this page
    xobjects: Vec<(String, lopdf::ObjectId)>,
    elements: usize,
}

impl PdfPage {
    fn new() -> Self {
        Self {
            content: String::new(),
            xobjects: Vec::new(),
            elements: 0,
        }
    }
}

struct CachedImage {
    id: lopdf::ObjectId,
    name: String,
}

pub struct PdfRenderer {
    page_w: f32,
    page_h: f32,
    doc: Document,
    pages_id: lopdf::ObjectId,
    font_id: lopdf::ObjectId,
    pages: Vec<PdfPage>,
    /// Image XObjects already embedded, by store key
    images: HashMap<String, CachedImage>,
    style: LineStyle,
}

impl PdfRenderer {
    pub fn new(opts: &LayoutOptions) -> Self {
        let (page_w, page_h) = opts.page_size_mm();
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            page_w,
            page_h,
            doc,
            pages_id,
            font_id,
            pages: Vec::new(),
            images: HashMap::new(),
            style: LineStyle::default(),
        }
    }

    fn current(&mut self) -> &mut PdfPage {
        if self.pages.is_empty() {
            self.pages.push(PdfPage::new());
        }
        self.pages.last_mut().unwrap()
    }

    fn op(&mut self, operators: &str) {
        let page = self.current();
        page.content.push_str(operators);
        page.content.push('\n');
        page.elements += 1;
    }

    /// y flip for a point: layout mm from the top edge to pt from the bottom
    fn flip_y(&self, y_mm: f32) -> f32 {
        mm_to_pt(self.page_h - y_mm)
    }

    /// Embed the image bytes once and return its resource, reusing the
    /// XObject for repeated keys. JPEG passes through under DCTDecode; other
    /// formats are decoded to raw RGB and left to stream compression.
    fn embed_image(&mut self, key: &str, data: &str) -> Result<(lopdf::ObjectId, String)> {
        if let Some(cached) = self.images.get(key) {
            return Ok((cached.id, cached.name.clone()));
        }

        let bytes = decode_inline(data)?;
        let is_jpeg = bytes.starts_with(&[0xFF, 0xD8])
            || inline_mime(data).is_some_and(|m| m.ends_with("jpeg") || m.ends_with("jpg"));

        let decoded = image::load_from_memory(&bytes)?;
        let (width, height) = (decoded.width(), decoded.height());

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        let stream = if is_jpeg {
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            let mut stream = Stream::new(dict, bytes);
            stream.allows_compression = false;
            stream
        } else {
            Stream::new(dict, decoded.to_rgb8().into_raw())
        };

        let id = self.doc.add_object(stream);
        let name = format!("Im{}", self.images.len() + 1);
        self.images.insert(
            key.to_string(),
            CachedImage {
                id,
                name: name.clone(),
            },
        );
        Ok((id, name))
    }

    /// Consume the renderer and hand out the assembled document.
    /// Only meaningful after a successful `finalize`.
    pub fn into_document(self) -> Document {
        self.doc
    }
}

fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

fn rg(color: Color) -> (f32, f32, f32) {
    (
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
    )
}

impl RenderAdapter for PdfRenderer {
    fn add_page(&mut self) {
        self.pages.push(PdfPage::new());
    }

    fn save_state(&mut self) {
        let page = self.current();
        page.content.push_str("q\n");
    }

    fn restore_state(&mut self) {
        let page = self.current();
        page.content.push_str("Q\n");
    }

    fn set_transform(&mut self, m: [f32; 6]) {
        // conjugate the top-left-mm matrix by the y flip: b, c and the
        // vertical translation change sign
        let ops = format!(
            "{} {} {} {} {:.2} {:.2} cm",
            m[0],
            -m[1],
            -m[2],
            m[3],
            mm_to_pt(m[4]),
            -mm_to_pt(m[5]),
        );
        let page = self.current();
        page.content.push_str(&ops);
        page.content.push('\n');
    }

    fn draw_text(&mut self, op: &TextOp) {
        let x = mm_to_pt(op.x);
        let y = self.flip_y(op.y);
        let size = mm_to_pt(op.size);
        let ops = format!(
            "BT /F1 {size:.2} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            escape_text(&op.text),
        );
        self.op(&ops);
    }

    fn set_line_style(&mut self, style: &LineStyle) {
        self.style = *style;
    }

    fn draw_line(&mut self, op: &LineOp) {
        let (r, g, b) = rg(self.style.color);
        let mut ops = String::new();
        let _ = write!(
            ops,
            "{:.2} w {r:.3} {g:.3} {b:.3} RG ",
            mm_to_pt(self.style.width),
        );
        if let Some((on, off)) = op.dash {
            let _ = write!(ops, "[{:.2} {:.2}] 0 d ", mm_to_pt(on), mm_to_pt(off));
        }
        let _ = write!(
            ops,
            "{:.2} {:.2} m {:.2} {:.2} l S",
            mm_to_pt(op.x1),
            self.flip_y(op.y1),
            mm_to_pt(op.x2),
            self.flip_y(op.y2),
        );
        if op.dash.is_some() {
            ops.push_str(" [] 0 d");
        }
        self.op(&ops);
    }

    fn fill_rect(&mut self, op: &RectOp) {
        let (r, g, b) = rg(op.color);
        let ops = format!(
            "{r:.3} {g:.3} {b:.3} rg {:.2} {:.2} {:.2} {:.2} re f",
            mm_to_pt(op.x),
            self.flip_y(op.y + op.height),
            mm_to_pt(op.width),
            mm_to_pt(op.height),
        );
        self.op(&ops);
    }

    fn draw_image(&mut self, op: &ImageOp) -> Result<()> {
        let Some(data) = &op.data else {
            log::debug!("no inline data for {}, skipping", op.key);
            return Ok(());
        };
        let (id, name) = self.embed_image(&op.key, data)?;

        let w = mm_to_pt(op.width);
        let h = mm_to_pt(op.height);
        let x = mm_to_pt(op.x);
        let y = self.flip_y(op.y + op.height);
        // image space is the unit square; rotate180 mirrors both axes
        // around the placement rectangle
        let ops = if op.rotate180 {
            format!(
                "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{name} Do Q",
                -w,
                -h,
                x + w,
                y + h,
            )
        } else {
            format!("q {w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm /{name} Do Q")
        };

        let page = self.current();
        if !page.xobjects.iter().any(|(n, _)| *n == name) {
            page.xobjects.push((name.clone(), id));
        }
        self.op(&ops);
        Ok(())
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_w, self.page_h)
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.pages.iter().all(|p| p.elements == 0) {
            return Err(ImposeError::NoContent);
        }

        let w_pt = mm_to_pt(self.page_w);
        let h_pt = mm_to_pt(self.page_h);
        let mut kids = Vec::new();
        for page in self.pages.drain(..) {
            let content_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, page.content.into_bytes()));
            let mut xobjects = Dictionary::new();
            for (name, id) in &page.xobjects {
                xobjects.set(name.as_bytes(), Object::Reference(*id));
            }
            let resources = dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(self.font_id) },
                "XObject" => xobjects,
            };
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(self.pages_id),
                "MediaBox" => vec![0.into(), 0.into(), w_pt.into(), h_pt.into()],
                "Contents" => Object::Reference(content_id),
                "Resources" => resources,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.compress();
        Ok(())
    }
}

/// Write a finished document to disk without blocking the runtime
pub async fn save_document(mut doc: Document, path: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || doc.save(&path).map(|_| ())).await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let mut r = PdfRenderer::new(&LayoutOptions::default());
        assert!(matches!(r.finalize().await, Err(ImposeError::NoContent)));
    }

    #[tokio::test]
    async fn test_page_tree_counts_added_pages() {
        let mut r = PdfRenderer::new(&LayoutOptions::default());
        r.draw_line(&LineOp {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 0.0,
            dash: None,
        });
        r.add_page();
        r.draw_line(&LineOp {
            x1: 0.0,
            y1: 5.0,
            x2: 10.0,
            y2: 5.0,
            dash: None,
        });
        r.finalize().await.unwrap();
        let doc = r.into_document();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
