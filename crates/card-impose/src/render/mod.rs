//! Rendering backends for the imposition engine
//!
//! Four interchangeable adapters sit behind one capability trait:
//! - vector markup for fast interactive previews
//! - a paginated PDF document for the downloadable artifact
//! - raster compositing for proof images
//! - a recording backend for verification
//!
//! All drawing coordinates are in millimeters with a top-left origin;
//! each backend owns its own unit conversion. Backend-specific behavior
//! (quality tier, embedded vs. linked images) is fixed at construction,
//! never branched on by callers.

mod pdf;
mod raster;
mod recording;
mod svg;

pub use pdf::{PdfRenderer, save_document};
pub use raster::RasterRenderer;
pub use recording::{Primitive, RecordedImage, RecordingRenderer};
pub use svg::{SvgRenderer, save_svg_pages};

use crate::options::LayoutOptions;
use crate::types::Color;
use crate::{ImposeError, Result};
use base64::Engine;

/// Rendering quality tier; controls the raster resample kernel and
/// oversampling factor, and is advisory for the other backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low,
    #[default]
    Standard,
    High,
}

/// A text label draw request
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Font size in millimeters
    pub size: f32,
}

/// Stroke style applied to subsequent lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: Color,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: crate::constants::CUT_MARK_WIDTH_MM,
            color: Color::BLACK,
        }
    }
}

/// A straight line draw request, optionally dashed (dash, gap)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOp {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub dash: Option<(f32, f32)>,
}

/// A filled rectangle draw request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectOp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
}

/// An image draw request.
///
/// `key` is the normalized store key; `data` the inline-encoded bytes when
/// the store had them. The vector backend may reference the key instead of
/// embedding the data, depending on how it was constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOp {
    pub key: String,
    pub data: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotate180: bool,
}

/// The rendering capability contract shared by all four backends.
///
/// Pages materialize lazily: the first drawing call creates page one, and
/// `add_page` appends. `finalize` fails with [`ImposeError::NoContent`]
/// when no page received any drawn element.
pub trait RenderAdapter {
    fn add_page(&mut self);
    fn save_state(&mut self);
    fn restore_state(&mut self);
    /// Replace the current transform with `[a, b, c, d, e, f]` applied in
    /// page space (millimeters, top-left origin)
    fn set_transform(&mut self, matrix: [f32; 6]);
    fn draw_text(&mut self, op: &TextOp);
    fn set_line_style(&mut self, style: &LineStyle);
    fn draw_line(&mut self, op: &LineOp);
    fn fill_rect(&mut self, op: &RectOp);
    fn draw_image(&mut self, op: &ImageOp) -> Result<()>;
    /// Page dimensions in millimeters
    fn page_size(&self) -> (f32, f32);
    async fn finalize(&mut self) -> Result<()>;
}

/// Which backend the factory should build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Vector,
    Document,
    Raster,
    Recording,
}

/// Factory product: any backend behind the one contract, so the export
/// orchestrator never branches on the output target.
pub enum Renderer {
    Vector(SvgRenderer),
    Document(PdfRenderer),
    Raster(RasterRenderer),
    Recording(RecordingRenderer),
}

impl Renderer {
    /// Build a backend from the layout configuration, a quality tier, and
    /// whether the vector backend inlines image bytes or links them.
    pub fn create(
        opts: &LayoutOptions,
        kind: RendererKind,
        quality: Quality,
        embed_images: bool,
    ) -> Renderer {
        match kind {
            RendererKind::Vector => Renderer::Vector(SvgRenderer::new(opts, quality, embed_images)),
            RendererKind::Document => Renderer::Document(PdfRenderer::new(opts)),
            RendererKind::Raster => Renderer::Raster(RasterRenderer::new(opts, quality)),
            RendererKind::Recording => Renderer::Recording(RecordingRenderer::new(opts)),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            Renderer::Vector($inner) => $body,
            Renderer::Document($inner) => $body,
            Renderer::Raster($inner) => $body,
            Renderer::Recording($inner) => $body,
        }
    };
}

impl RenderAdapter for Renderer {
    fn add_page(&mut self) {
        delegate!(self, r => r.add_page())
    }
    fn save_state(&mut self) {
        delegate!(self, r => r.save_state())
    }
    fn restore_state(&mut self) {
        delegate!(self, r => r.restore_state())
    }
    fn set_transform(&mut self, matrix: [f32; 6]) {
        delegate!(self, r => r.set_transform(matrix))
    }
    fn draw_text(&mut self, op: &TextOp) {
        delegate!(self, r => r.draw_text(op))
    }
    fn set_line_style(&mut self, style: &LineStyle) {
        delegate!(self, r => r.set_line_style(style))
    }
    fn draw_line(&mut self, op: &LineOp) {
        delegate!(self, r => r.draw_line(op))
    }
    fn fill_rect(&mut self, op: &RectOp) {
        delegate!(self, r => r.fill_rect(op))
    }
    fn draw_image(&mut self, op: &ImageOp) -> Result<()> {
        delegate!(self, r => r.draw_image(op))
    }
    fn page_size(&self) -> (f32, f32) {
        delegate!(self, r => r.page_size())
    }
    async fn finalize(&mut self) -> Result<()> {
        delegate!(self, r => r.finalize().await)
    }
}

/// Decode an inline-encoded image to raw bytes.
///
/// Accepts a full `data:` URI or bare standard base64, as image stores
/// hand out either form.
pub(crate) fn decode_inline(data: &str) -> Result<Vec<u8>> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest
            .splitn(2, ',')
            .nth(1)
            .ok_or_else(|| ImposeError::Config("malformed data URI".to_string()))?,
        None => data,
    };
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// MIME hint from a `data:` URI header, if present
pub(crate) fn inline_mime(data: &str) -> Option<&str> {
    let rest = data.strip_prefix("data:")?;
    let header = rest.splitn(2, ',').next()?;
    header.split(';').next()
}
