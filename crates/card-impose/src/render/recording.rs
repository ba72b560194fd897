//! Recording backend
//!
//! Stores every drawing call verbatim instead of producing output, so the
//! export pipeline can be inspected after the fact: which images landed on
//! which page, where, with which rotation. Used heavily by the integration
//! tests and by nothing in the production path.

use crate::options::LayoutOptions;
use crate::{ImposeError, Result};

use super::{ImageOp, LineOp, LineStyle, RectOp, RenderAdapter, TextOp};

/// One recorded image placement
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedImage {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotate180: bool,
}

/// A drawing call as the orchestrator issued it
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Transform([f32; 6]),
    Text(TextOp),
    Line { op: LineOp, style: LineStyle },
    Rect(RectOp),
    Image(RecordedImage),
}

impl Primitive {
    fn is_drawable(&self) -> bool {
        !matches!(self, Primitive::Transform(_))
    }
}

pub struct RecordingRenderer {
    page_w: f32,
    page_h: f32,
    pages: Vec<Vec<Primitive>>,
    style: LineStyle,
}

impl RecordingRenderer {
    pub fn new(opts: &LayoutOptions) -> Self {
        let (page_w, page_h) = opts.page_size_mm();
        Self {
            page_w,
            page_h,
            pages: Vec::new(),
            style: LineStyle::default(),
        }
    }

    fn current(&mut self) -> &mut Vec<Primitive> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages.last_mut().unwrap()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> &[Primitive] {
        self.pages.get(index).map_or(&[], Vec::as_slice)
    }

    /// Image placements on one page, in draw order
    pub fn images_on(&self, index: usize) -> Vec<&RecordedImage> {
        self.page(index)
            .iter()
            .filter_map(|p| match p {
                Primitive::Image(img) => Some(img),
                _ => None,
            })
            .collect()
    }

    pub fn lines_on(&self, index: usize) -> Vec<&LineOp> {
        self.page(index)
            .iter()
            .filter_map(|p| match p {
                Primitive::Line { op, .. } => Some(op),
                _ => None,
            })
            .collect()
    }

    pub fn texts_on(&self, index: usize) -> Vec<&TextOp> {
        self.page(index)
            .iter()
            .filter_map(|p| match p {
                Primitive::Text(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    pub fn rects_on(&self, index: usize) -> Vec<&RectOp> {
        self.page(index)
            .iter()
            .filter_map(|p| match p {
                Primitive::Rect(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    /// The image whose placement origin is within `tolerance` mm of (x, y)
    pub fn image_at(&self, index: usize, x: f32, y: f32, tolerance: f32) -> Option<&RecordedImage> {
        self.images_on(index)
            .into_iter()
            .find(|img| (img.x - x).abs() <= tolerance && (img.y - y).abs() <= tolerance)
    }

    /// Transforms recorded on one page, in call order
    pub fn transforms_on(&self, index: usize) -> Vec<[f32; 6]> {
        self.page(index)
            .iter()
            .filter_map(|p| match p {
                Primitive::Transform(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl RenderAdapter for RecordingRenderer {
    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn save_state(&mut self) {}

    fn restore_state(&mut self) {}

    fn set_transform(&mut self, matrix: [f32; 6]) {
        self.current().push(Primitive::Transform(matrix));
    }

    fn draw_text(&mut self, op: &TextOp) {
        self.current().push(Primitive::Text(op.clone()));
    }

    fn set_line_style(&mut self, style: &LineStyle) {
        self.style = *style;
    }

    fn draw_line(&mut self, op: &LineOp) {
        let style = self.style;
        self.current().push(Primitive::Line { op: *op, style });
    }

    fn fill_rect(&mut self, op: &RectOp) {
        self.current().push(Primitive::Rect(*op));
    }

    fn draw_image(&mut self, op: &ImageOp) -> Result<()> {
        let recorded = RecordedImage {
            key: op.key.clone(),
            x: op.x,
            y: op.y,
            width: op.width,
            height: op.height,
            rotate180: op.rotate180,
        };
        self.current().push(Primitive::Image(recorded));
        Ok(())
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_w, self.page_h)
    }

    async fn finalize(&mut self) -> Result<()> {
        if !self
            .pages
            .iter()
            .any(|p| p.iter().any(Primitive::is_drawable))
        {
            return Err(ImposeError::NoContent);
        }
        Ok(())
    }
}
