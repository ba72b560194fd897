//! Raster compositing backend
//!
//! Drawing calls are queued per page and replayed during `finalize`, one
//! blocking task per page, so image decoding and resampling run off the
//! async runtime and pages composite concurrently. Results come back in
//! submission order regardless of task completion order.

use image::imageops::FilterType;
use image::{Pixel, Rgba, RgbaImage, imageops};
use tokio::task::JoinSet;

use crate::constants::{HELVETICA_CHAR_WIDTH_RATIO, RASTER_PX_PER_MM};
use crate::options::LayoutOptions;
use crate::types::Color;
use crate::{ImposeError, Result};

use super::{ImageOp, LineOp, LineStyle, Quality, RectOp, RenderAdapter, TextOp, decode_inline};

#[derive(Clone)]
enum Command {
    Save,
    Restore,
    Transform([f32; 6]),
    Text(TextOp),
    Style(LineStyle),
    Line(LineOp),
    Rect(RectOp),
    Image {
        key: String,
        data: Option<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rotate180: bool,
    },
}

impl Command {
    fn is_drawable(&self) -> bool {
        !matches!(
            self,
            Command::Save | Command::Restore | Command::Transform(_) | Command::Style(_)
        )
    }
}

pub struct RasterRenderer {
    page_w: f32,
    page_h: f32,
    quality: Quality,
    pages: Vec<Vec<Command>>,
    results: Vec<RgbaImage>,
}

impl RasterRenderer {
    pub fn new(opts: &LayoutOptions, quality: Quality) -> Self {
        let (page_w, page_h) = opts.page_size_mm();
        Self {
            page_w,
            page_h,
            quality,
            pages: Vec::new(),
            results: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<Command> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages.last_mut().unwrap()
    }

    /// Composited sheets, available after `finalize`
    pub fn into_images(self) -> Vec<RgbaImage> {
        self.results
    }
}

impl RenderAdapter for RasterRenderer {
    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn save_state(&mut self) {
        self.current().push(Command::Save);
    }

    fn restore_state(&mut self) {
        self.current().push(Command::Restore);
    }

    fn set_transform(&mut self, matrix: [f32; 6]) {
        self.current().push(Command::Transform(matrix));
    }

    fn draw_text(&mut self, op: &TextOp) {
        self.current().push(Command::Text(op.clone()));
    }

    fn set_line_style(&mut self, style: &LineStyle) {
        self.current().push(Command::Style(*style));
    }

    fn draw_line(&mut self, op: &LineOp) {
        self.current().push(Command::Line(*op));
    }

    fn fill_rect(&mut self, op: &RectOp) {
        self.current().push(Command::Rect(*op));
    }

    fn draw_image(&mut self, op: &ImageOp) -> Result<()> {
        self.current().push(Command::Image {
            key: op.key.clone(),
            data: op.data.clone(),
            x: op.x,
            y: op.y,
            width: op.width,
            height: op.height,
            rotate180: op.rotate180,
        });
        Ok(())
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_w, self.page_h)
    }

    async fn finalize(&mut self) -> Result<()> {
        if !self
            .pages
            .iter()
            .any(|p| p.iter().any(Command::is_drawable))
        {
            return Err(ImposeError::NoContent);
        }

        let (page_w, page_h, quality) = (self.page_w, self.page_h, self.quality);
        let mut tasks = JoinSet::new();
        for (index, commands) in self.pages.drain(..).enumerate() {
            tasks.spawn_blocking(move || (index, render_page(&commands, page_w, page_h, quality)));
        }

        let mut finished: Vec<(usize, RgbaImage)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            finished.push(joined?);
        }
        finished.sort_by_key(|(index, _)| *index);
        self.results = finished.into_iter().map(|(_, img)| img).collect();
        Ok(())
    }
}

fn oversample(quality: Quality) -> f32 {
    match quality {
        Quality::Low => 1.0,
        Quality::Standard => 2.0,
        Quality::High => 3.0,
    }
}

fn filter(quality: Quality) -> FilterType {
    match quality {
        Quality::Low => FilterType::Nearest,
        Quality::Standard => FilterType::Triangle,
        Quality::High => FilterType::Lanczos3,
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([
        color.r,
        color.g,
        color.b,
        (color.alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

/// Replay one page's command queue onto a white canvas
fn render_page(commands: &[Command], page_w: f32, page_h: f32, quality: Quality) -> RgbaImage {
    let over = oversample(quality);
    let scale = RASTER_PX_PER_MM * over;
    let width = (page_w * scale).round().max(1.0) as u32;
    let height = (page_h * scale).round().max(1.0) as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    let mut offset = (0.0f32, 0.0f32);
    let mut stack: Vec<(f32, f32)> = Vec::new();
    let mut style = LineStyle::default();

    for command in commands {
        match command {
            Command::Save => stack.push(offset),
            Command::Restore => offset = stack.pop().unwrap_or((0.0, 0.0)),
            // only the translation part matters for sheet compositing
            Command::Transform(m) => offset = (m[4], m[5]),
            Command::Style(s) => style = *s,
            Command::Line(op) => draw_line(&mut canvas, op, &style, offset, scale),
            Command::Rect(op) => {
                fill_rect(
                    &mut canvas,
                    (op.x + offset.0) * scale,
                    (op.y + offset.1) * scale,
                    op.width * scale,
                    op.height * scale,
                    rgba(op.color),
                );
            }
            Command::Text(op) => draw_label(&mut canvas, op, offset, scale),
            Command::Image {
                key,
                data,
                x,
                y,
                width,
                height,
                rotate180,
            } => {
                let Some(data) = data else { continue };
                if let Err(err) = blit_image(
                    &mut canvas,
                    data,
                    (x + offset.0) * scale,
                    (y + offset.1) * scale,
                    width * scale,
                    height * scale,
                    *rotate180,
                    filter(quality),
                ) {
                    log::warn!("raster compositing skipped {key}: {err}");
                }
            }
        }
    }

    if over > 1.0 {
        let final_w = (page_w * RASTER_PX_PER_MM).round().max(1.0) as u32;
        let final_h = (page_h * RASTER_PX_PER_MM).round().max(1.0) as u32;
        canvas = imageops::resize(&canvas, final_w, final_h, filter(quality));
    }
    canvas
}

fn blend_px(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    canvas.get_pixel_mut(x as u32, y as u32).blend(&color);
}

fn fill_rect(canvas: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
    let x0 = x.round() as i64;
    let y0 = y.round() as i64;
    let x1 = (x + w).round() as i64;
    let y1 = (y + h).round() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            blend_px(canvas, px, py, color);
        }
    }
}

fn draw_line(canvas: &mut RgbaImage, op: &LineOp, style: &LineStyle, offset: (f32, f32), scale: f32) {
    let (x1, y1) = ((op.x1 + offset.0) * scale, (op.y1 + offset.1) * scale);
    let (x2, y2) = ((op.x2 + offset.0) * scale, (op.y2 + offset.1) * scale);
    let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
    if length <= 0.0 {
        return;
    }
    let half = (style.width * scale / 2.0).max(0.5);
    let color = rgba(style.color);
    let steps = length.ceil() as i64;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        if let Some((on, off)) = op.dash {
            let period = (on + off) * scale;
            if period > 0.0 && (t * length) % period >= on * scale {
                continue;
            }
        }
        let cx = x1 + (x2 - x1) * t;
        let cy = y1 + (y2 - y1) * t;
        let r = half.ceil() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                blend_px(canvas, cx as i64 + dx, cy as i64 + dy, color);
            }
        }
    }
}

// 3x5 stencils for the page-number charset; anything else renders blank
const DIGIT_ROWS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const SLASH_ROWS: [u8; 5] = [0b001, 0b001, 0b010, 0b100, 0b100];

fn draw_label(canvas: &mut RgbaImage, op: &TextOp, offset: (f32, f32), scale: f32) {
    let size = op.size * scale;
    let advance = size * HELVETICA_CHAR_WIDTH_RATIO;
    let cell_w = advance / 4.0;
    let cell_h = size / 6.0;
    let top = (op.y + offset.1) * scale - size;
    let mut x = (op.x + offset.0) * scale;
    let black = Rgba([0, 0, 0, 255]);

    for ch in op.text.chars() {
        let rows = match ch {
            '0'..='9' => Some(DIGIT_ROWS[ch as usize - '0' as usize]),
            '/' => Some(SLASH_ROWS),
            _ => None,
        };
        if let Some(rows) = rows {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) != 0 {
                        fill_rect(
                            canvas,
                            x + col as f32 * cell_w,
                            top + row as f32 * cell_h,
                            cell_w,
                            cell_h,
                            black,
                        );
                    }
                }
            }
        }
        x += advance;
    }
}

#[allow(clippy::too_many_arguments)]
fn blit_image(
    canvas: &mut RgbaImage,
    data: &str,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    rotate180: bool,
    filter: FilterType,
) -> Result<()> {
    let bytes = decode_inline(data)?;
    let decoded = image::load_from_memory(&bytes)?;
    let target_w = w.round().max(1.0) as u32;
    let target_h = h.round().max(1.0) as u32;
    let mut resized = imageops::resize(&decoded.to_rgba8(), target_w, target_h, filter);
    if rotate180 {
        resized = imageops::rotate180(&resized);
    }
    imageops::overlay(canvas, &resized, x.round() as i64, y.round() as i64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_queue_has_no_content() {
        let mut r = RasterRenderer::new(&LayoutOptions::default(), Quality::Low);
        assert!(matches!(r.finalize().await, Err(ImposeError::NoContent)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pages_come_back_in_submission_order() {
        let mut opts = LayoutOptions::default();
        opts.paper_size = crate::types::PaperSize::Custom {
            width_mm: 30.0,
            height_mm: 20.0,
        };
        let mut r = RasterRenderer::new(&opts, Quality::Low);
        // page 1 gets a black square, page 2 stays blank apart from a dot
        r.fill_rect(&RectOp {
            x: 0.0,
            y: 0.0,
            width: 30.0,
            height: 20.0,
            color: Color::BLACK,
        });
        r.add_page();
        r.draw_line(&LineOp {
            x1: 1.0,
            y1: 1.0,
            x2: 1.0,
            y2: 1.0,
            dash: None,
        });
        r.finalize().await.unwrap();
        let images = r.into_images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
        assert_eq!(images[1].get_pixel(15, 15), &Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_registration_translation_moves_content() {
        let mut opts = LayoutOptions::default();
        opts.paper_size = crate::types::PaperSize::Custom {
            width_mm: 30.0,
            height_mm: 30.0,
        };
        let mut r = RasterRenderer::new(&opts, Quality::Low);
        r.save_state();
        r.set_transform([1.0, 0.0, 0.0, 1.0, 10.0, 0.0]);
        r.fill_rect(&RectOp {
            x: 0.0,
            y: 0.0,
            width: 5.0,
            height: 5.0,
            color: Color::BLACK,
        });
        r.restore_state();
        r.finalize().await.unwrap();
        let image = &r.into_images()[0];
        let px_per_mm = RASTER_PX_PER_MM;
        // content landed at 10mm, not at the origin
        assert_eq!(
            image.get_pixel((12.0 * px_per_mm) as u32, (2.0 * px_per_mm) as u32),
            &Rgba([0, 0, 0, 255])
        );
        assert_eq!(
            image.get_pixel((2.0 * px_per_mm) as u32, (2.0 * px_per_mm) as u32),
            &Rgba([255, 255, 255, 255])
        );
    }
}
