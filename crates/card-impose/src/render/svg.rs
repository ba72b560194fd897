//! Vector markup backend
//!
//! Builds one SVG document per sheet. Used for interactive previews, so it
//! favors cheap string assembly over completeness. Images are either
//! embedded as data URIs or linked by store key, chosen at construction.

use crate::Result;
use crate::ImposeError;
use crate::options::LayoutOptions;
use crate::types::Color;

use super::{ImageOp, LineOp, LineStyle, Quality, RectOp, RenderAdapter, TextOp};

struct SvgPage {
    body: String,
    elements: usize,
}

impl SvgPage {
    fn new() -> Self {
        Self {
            body: String::new(),
            elements: 0,
        }
    }
}

pub struct SvgRenderer {
    page_w: f32,
    page_h: f32,
    quality: Quality,
    embed_images: bool,
    pages: Vec<SvgPage>,
    style: LineStyle,
    /// Open `<g>` count per saved state frame
    group_stack: Vec<usize>,
}

impl SvgRenderer {
    pub fn new(opts: &LayoutOptions, quality: Quality, embed_images: bool) -> Self {
        let (page_w, page_h) = opts.page_size_mm();
        Self {
            page_w,
            page_h,
            quality,
            embed_images,
            pages: Vec::new(),
            style: LineStyle::default(),
            group_stack: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut SvgPage {
        if self.pages.is_empty() {
            self.pages.push(SvgPage::new());
        }
        self.pages.last_mut().unwrap()
    }

    fn push(&mut self, element: String) {
        let page = self.current();
        page.body.push_str(&element);
        page.body.push('\n');
        page.elements += 1;
    }

    /// Assemble the finished documents, one string per sheet
    pub fn pages(&self) -> Vec<String> {
        // low quality trades smoothing for viewer speed
        let rendering = match self.quality {
            Quality::Low => "optimizeSpeed",
            Quality::Standard | Quality::High => "geometricPrecision",
        };
        self.pages
            .iter()
            .map(|p| {
                format!(
                    "<svg xmlns=\"http://www.w3.org/2000/svg\" \
                     xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
                     width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\" \
                     shape-rendering=\"{rendering}\">\n{body}</svg>\n",
                    w = self.page_w,
                    h = self.page_h,
                    body = p.body,
                )
            })
            .collect()
    }
}

fn stroke(color: Color) -> String {
    format!("rgb({},{},{})", color.r, color.g, color.b)
}

fn fill(color: Color) -> String {
    if (color.alpha - 1.0).abs() < f32::EPSILON {
        stroke(color)
    } else {
        format!("rgba({},{},{},{})", color.r, color.g, color.b, color.alpha)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl RenderAdapter for SvgRenderer {
    fn add_page(&mut self) {
        // close any groups left open on the previous page
        while let Some(open) = self.group_stack.pop() {
            for _ in 0..open {
                self.current().body.push_str("</g>\n");
            }
        }
        self.pages.push(SvgPage::new());
    }

    fn save_state(&mut self) {
        self.group_stack.push(0);
    }

    fn restore_state(&mut self) {
        if let Some(open) = self.group_stack.pop() {
            for _ in 0..open {
                self.current().body.push_str("</g>\n");
            }
        }
    }

    fn set_transform(&mut self, m: [f32; 6]) {
        let element = format!(
            "<g transform=\"matrix({},{},{},{},{},{})\">",
            m[0], m[1], m[2], m[3], m[4], m[5]
        );
        let page = self.current();
        page.body.push_str(&element);
        page.body.push('\n');
        if let Some(open) = self.group_stack.last_mut() {
            *open += 1;
        }
    }

    fn draw_text(&mut self, op: &TextOp) {
        let element = format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.2}\" \
             font-family=\"Helvetica, sans-serif\" fill=\"black\">{}</text>",
            op.x,
            op.y,
            op.size,
            escape(&op.text),
        );
        self.push(element);
    }

    fn set_line_style(&mut self, style: &LineStyle) {
        self.style = *style;
    }

    fn draw_line(&mut self, op: &LineOp) {
        let dash = match op.dash {
            Some((on, off)) => format!(" stroke-dasharray=\"{on},{off}\""),
            None => String::new(),
        };
        let element = format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" \
             stroke=\"{}\" stroke-width=\"{:.2}\"{}/>",
            op.x1,
            op.y1,
            op.x2,
            op.y2,
            stroke(self.style.color),
            self.style.width,
            dash,
        );
        self.push(element);
    }

    fn fill_rect(&mut self, op: &RectOp) {
        let element = format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            op.x,
            op.y,
            op.width,
            op.height,
            fill(op.color),
        );
        self.push(element);
    }

    fn draw_image(&mut self, op: &ImageOp) -> Result<()> {
        let href = if self.embed_images {
            match &op.data {
                Some(data) if data.starts_with("data:") => data.clone(),
                Some(data) => format!("data:image;base64,{data}"),
                None => return Ok(()),
            }
        } else {
            op.key.clone()
        };
        let transform = if op.rotate180 {
            format!(
                " transform=\"rotate(180,{:.2},{:.2})\"",
                op.x + op.width / 2.0,
                op.y + op.height / 2.0,
            )
        } else {
            String::new()
        };
        let element = format!(
            "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" \
             preserveAspectRatio=\"none\" href=\"{}\"{}/>",
            op.x, op.y, op.width, op.height, href, transform,
        );
        self.push(element);
        Ok(())
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_w, self.page_h)
    }

    async fn finalize(&mut self) -> Result<()> {
        while let Some(open) = self.group_stack.pop() {
            for _ in 0..open {
                self.current().body.push_str("</g>\n");
            }
        }
        if self.pages.iter().all(|p| p.elements == 0) {
            return Err(ImposeError::NoContent);
        }
        Ok(())
    }
}

/// Write finalized documents to `<stem>-1.svg`, `<stem>-2.svg`, ...
pub async fn save_svg_pages(renderer: &SvgRenderer, stem: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    let mut written = Vec::new();
    for (i, doc) in renderer.pages().into_iter().enumerate() {
        let path = stem.with_extension(format!("{}.svg", i + 1));
        tokio::fs::write(&path, doc).await?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> SvgRenderer {
        SvgRenderer::new(&LayoutOptions::default(), Quality::Low, true)
    }

    #[tokio::test]
    async fn test_empty_renderer_has_no_content() {
        let mut r = renderer();
        assert!(matches!(r.finalize().await, Err(ImposeError::NoContent)));
    }

    #[tokio::test]
    async fn test_groups_balance_after_restore() {
        let mut r = renderer();
        r.save_state();
        r.set_transform([1.0, 0.0, 0.0, 1.0, 2.0, -1.0]);
        r.fill_rect(&RectOp {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            color: Color::BLACK,
        });
        r.restore_state();
        r.finalize().await.unwrap();
        let doc = r.pages().remove(0);
        assert_eq!(doc.matches("<g ").count(), doc.matches("</g>").count());
    }

    #[test]
    fn test_linked_images_reference_store_key() {
        let mut r = SvgRenderer::new(&LayoutOptions::default(), Quality::Low, false);
        r.draw_image(&ImageOp {
            key: "card.png".to_string(),
            data: None,
            x: 1.0,
            y: 2.0,
            width: 63.0,
            height: 88.0,
            rotate180: false,
        })
        .unwrap();
        assert!(r.pages()[0].contains("href=\"card.png\""));
    }
}
