//! Export orchestration
//!
//! Drives a full deck export against any rendering backend: waits out the
//! host's pending image jobs, samples border colors for margin fill,
//! paginates, then draws every page record through the shared drawing
//! path. Cooperative cancellation is checked between page records.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;

use crate::constants::{
    FOLD_GUIDE_DASH_MM, GUIDE_LINE_WIDTH_MM, HELVETICA_CHAR_WIDTH_RATIO, PAGE_NUMBER_OFFSET_MM,
    PAGE_NUMBER_SIZE_MM, PENDING_POLL_MS,
};
use crate::layout::{cut_rectangles, needs_rotation, paginate, reorder_back};
use crate::marks::{brochure_guides, cross_mark_lines, cut_mark_lines, fold_guide};
use crate::options::LayoutOptions;
use crate::render::{ImageOp, LineOp, LineStyle, RectOp, RenderAdapter, TextOp};
use crate::types::{BindingMode, Color, DeckState, PageRecord, PageSide, Rect};
use crate::{ImposeError, Result};

/// Host-side jobs (image loads, thumbnail generation) the export must wait
/// out before reading the image store
pub trait PendingJobs: Send + Sync {
    fn size(&self) -> usize;
}

/// Read access to the host's image store, keyed by normalized path
pub trait ImageStore: Send + Sync {
    /// Inline-encoded image bytes (data URI or bare base64), if loaded
    fn get(&self, key: &str) -> Option<String>;
}

/// Derives the margin-fill color for a card image
pub trait BorderColorSampler: Send + Sync {
    fn sample(&self, data: &str) -> Result<Color>;
}

/// Default sampler: the mean color of the outermost pixel band
pub struct AverageBorderSampler;

impl BorderColorSampler for AverageBorderSampler {
    fn sample(&self, data: &str) -> Result<Color> {
        let bytes = crate::render::decode_inline(data)?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(ImposeError::Sampler("empty image".to_string()));
        }
        let band = (w.min(h) / 20).max(1);
        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        let mut count = 0u64;
        for (x, y, px) in image.enumerate_pixels() {
            let border = x < band || y < band || x >= w - band || y >= h - band;
            if border {
                r += u64::from(px[0]);
                g += u64::from(px[1]);
                b += u64::from(px[2]);
                count += 1;
            }
        }
        Ok(Color::new(
            (r / count) as u8,
            (g / count) as u8,
            (b / count) as u8,
            1.0,
        ))
    }
}

/// Image store keys are paths with the separators stripped
pub fn normalize_path_key(path: &str) -> String {
    path.replace(['/', '\\'], "")
}

/// Shared cancellation flag; cloning hands out another handle to the same
/// flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What an export run produced
pub enum ExportOutcome<A> {
    /// The finalized backend, ready to be saved or inspected
    Completed(A),
    /// Cancellation was observed before the document finished
    Aborted,
}

impl<A> ExportOutcome<A> {
    pub fn completed(self) -> Option<A> {
        match self {
            ExportOutcome::Completed(adapter) => Some(adapter),
            ExportOutcome::Aborted => None,
        }
    }
}

/// Run a full export of `deck` through `adapter`.
///
/// Fails with [`ImposeError::NoContent`] when the deck paginates to
/// nothing. Per-image failures are logged and skipped; they never fail the
/// whole export.
pub async fn export_file<A: RenderAdapter>(
    mut adapter: A,
    deck: &DeckState,
    opts: &LayoutOptions,
    pending: &dyn PendingJobs,
    store: &dyn ImageStore,
    sampler: Option<Arc<dyn BorderColorSampler>>,
    cancel: &CancelToken,
) -> Result<ExportOutcome<A>> {
    if wait_for_pending(pending, cancel).await {
        return Ok(ExportOutcome::Aborted);
    }

    let records = paginate(deck, opts);
    log::info!(
        "exporting {} page records ({} cards)",
        records.len(),
        deck.cards.len()
    );

    let colors = match (&sampler, opts.margin_fill) {
        (Some(sampler), true) => sample_border_colors(&records, store, Arc::clone(sampler)).await?,
        _ => HashMap::new(),
    };

    let face_total = records.iter().filter(|r| r.side == PageSide::Face).count();
    let ctx = DrawContext {
        opts,
        store,
        colors: &colors,
        face_total,
        face_offset: 0,
    };
    if draw_records(&mut adapter, &records, &ctx, Some(cancel))? {
        return Ok(ExportOutcome::Aborted);
    }

    adapter.finalize().await?;
    Ok(ExportOutcome::Completed(adapter))
}

/// Poll the pending-jobs barrier until it drains. Returns true when
/// cancellation was observed while waiting.
async fn wait_for_pending(pending: &dyn PendingJobs, cancel: &CancelToken) -> bool {
    while pending.size() > 0 {
        if cancel.is_cancelled() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(PENDING_POLL_MS)).await;
    }
    cancel.is_cancelled()
}

/// Sample the border color of every distinct image concurrently, one
/// blocking task per distinct key. Sampling failures drop the key with a
/// warning; the affected cards simply render without margin fill.
pub(crate) async fn sample_border_colors(
    records: &[PageRecord],
    store: &dyn ImageStore,
    sampler: Arc<dyn BorderColorSampler>,
) -> Result<HashMap<String, Color>> {
    let keys: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.images.iter())
        .flatten()
        .map(|img| normalize_path_key(&img.path))
        .collect();

    let mut tasks = JoinSet::new();
    for key in keys {
        let Some(data) = store.get(&key) else { continue };
        let sampler = Arc::clone(&sampler);
        tasks.spawn_blocking(move || (key, sampler.sample(&data)));
    }

    let mut colors = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (key, sampled) = joined?;
        match sampled {
            Ok(color) => {
                colors.insert(key, color);
            }
            Err(err) => log::warn!("border sampling failed for {key}: {err}"),
        }
    }
    Ok(colors)
}

/// Everything the drawing path needs besides the adapter and the records
pub(crate) struct DrawContext<'a> {
    pub opts: &'a LayoutOptions,
    pub store: &'a dyn ImageStore,
    pub colors: &'a HashMap<String, Color>,
    /// Total face pages of the whole document, for "n/total" labels
    pub face_total: usize,
    /// Face pages preceding `records` when drawing a subset
    pub face_offset: usize,
}

/// Draw a run of page records onto the adapter. Returns true when
/// cancellation interrupted the run.
///
/// Fold-in-half back records share the physical page of the preceding face
/// record; every other record starts a fresh page (the first record draws
/// on the lazily created page one).
pub(crate) fn draw_records<A: RenderAdapter>(
    adapter: &mut A,
    records: &[PageRecord],
    ctx: &DrawContext<'_>,
    cancel: Option<&CancelToken>,
) -> Result<bool> {
    let opts = ctx.opts;
    let page = adapter.page_size();
    let mut face_no = ctx.face_offset;

    for (index, record) in records.iter().enumerate() {
        if let Some(cancel) = cancel {
            if cancel.is_cancelled() {
                log::info!("export aborted after {index} page records");
                return Ok(true);
            }
        }

        let is_back = record.side == PageSide::Back;
        let shares_page = is_back && opts.binding == BindingMode::FoldInHalf;
        if index > 0 && !shares_page {
            adapter.add_page();
        }

        adapter.save_state();
        if is_back
            && opts.avoid_dislocation
            && matches!(
                opts.binding,
                BindingMode::DoubleSided | BindingMode::Brochure
            )
        {
            adapter.set_transform([
                1.0,
                0.0,
                0.0,
                1.0,
                opts.registration_offset_x_mm,
                opts.registration_offset_y_mm,
            ]);
        }

        if !is_back {
            face_no += 1;
            if opts.show_page_numbers {
                draw_page_number(adapter, page, face_no, ctx.face_total);
            }
        }

        draw_record(adapter, record, ctx, page)?;
        adapter.restore_state();
    }

    Ok(false)
}

fn draw_page_number<A: RenderAdapter>(
    adapter: &mut A,
    page: (f32, f32),
    current: usize,
    total: usize,
) {
    let text = format!("{current}/{total}");
    let width = text.len() as f32 * PAGE_NUMBER_SIZE_MM * HELVETICA_CHAR_WIDTH_RATIO;
    adapter.draw_text(&TextOp {
        text,
        x: page.0 / 2.0 - width / 2.0,
        y: page.1 - PAGE_NUMBER_OFFSET_MM,
        size: PAGE_NUMBER_SIZE_MM,
    });
}

/// Draw one record: cut marks, margin fills, card images, guides
fn draw_record<A: RenderAdapter>(
    adapter: &mut A,
    record: &PageRecord,
    ctx: &DrawContext<'_>,
    page: (f32, f32),
) -> Result<()> {
    let opts = ctx.opts;
    let is_back = record.side == PageSide::Back;
    let brochure = opts.binding == BindingMode::Brochure;

    let cut_rects = cut_rectangles(opts, page, true, is_back);
    let draw_rects = cut_rectangles(opts, page, false, is_back);

    let style = if is_back {
        opts.back_marks
    } else {
        opts.face_marks
    };
    if style.has_normal() || style.has_cross() {
        adapter.set_line_style(&LineStyle {
            width: opts.mark_width_mm,
            color: opts.mark_color,
        });
        if style.has_normal() {
            for seg in cut_mark_lines(&cut_rects, page, brochure) {
                adapter.draw_line(&LineOp {
                    x1: seg.x1,
                    y1: seg.y1,
                    x2: seg.x2,
                    y2: seg.y2,
                    dash: None,
                });
            }
        }
        if style.has_cross() {
            for seg in cross_mark_lines(&cut_rects) {
                adapter.draw_line(&LineOp {
                    x1: seg.x1,
                    y1: seg.y1,
                    x2: seg.x2,
                    y2: seg.y2,
                    dash: None,
                });
            }
        }
    }

    let reordered = reorder_back(record, opts);
    let rotate = needs_rotation(opts, is_back);
    let (global_bx, global_by) = opts.clamped_bleed();
    let s = opts.scale();

    for (slot, image) in reordered.images.iter().enumerate() {
        let Some(image) = image else { continue };
        let (Some(cut), Some(base)) = (cut_rects.get(slot), draw_rects.get(slot)) else {
            continue;
        };

        // per-card bleed overrides replace the global bleed for this slot
        let (bx, by, rect) = match reordered.overrides[slot] {
            Some(over) => {
                let (ox, oy) = over.for_side(record.side);
                let (ox, oy) = opts.clamp_override(ox, oy);
                (ox, oy, override_rect(*cut, slot, ox, oy, brochure))
            }
            None => (global_bx, global_by, *base),
        };

        let key = normalize_path_key(&image.path);
        if opts.margin_fill {
            if let Some(color) = ctx.colors.get(&key) {
                let fx = (opts.margin_x_mm * s / 2.0 - bx).max(0.0);
                let fy = (opts.margin_y_mm * s / 2.0 - by).max(0.0);
                let fill = rect.expanded(fx, fy).fixed();
                adapter.fill_rect(&RectOp {
                    x: fill.x,
                    y: fill.y,
                    width: fill.width,
                    height: fill.height,
                    color: *color,
                });
            }
        }

        let op = ImageOp {
            data: ctx.store.get(&key),
            key,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotate180: rotate,
        };
        if let Err(err) = adapter.draw_image(&op) {
            log::warn!("skipping card image {}: {err}", op.key);
        }
    }

    draw_guides(adapter, record, ctx, page, &cut_rects);
    Ok(())
}

/// A bleed override expands the bleed-excluded rectangle. Brochure slots
/// only bleed away from the spread seam; everything else bleeds on all four
/// sides.
fn override_rect(cut: Rect, slot: usize, ox: f32, oy: f32, brochure: bool) -> Rect {
    if !brochure {
        return cut.expanded(ox, oy).fixed();
    }
    let mut rect = Rect::new(cut.x, cut.y - oy, cut.width + ox, cut.height + 2.0 * oy);
    if slot % 2 == 0 {
        rect.x -= ox;
    }
    rect.fixed()
}

fn draw_guides<A: RenderAdapter>(
    adapter: &mut A,
    record: &PageRecord,
    ctx: &DrawContext<'_>,
    page: (f32, f32),
    cut_rects: &[Rect],
) {
    let opts = ctx.opts;
    let guides = match opts.binding {
        // the face record owns the shared fold-in-half page
        BindingMode::FoldInHalf if record.side == PageSide::Face => {
            vec![fold_guide(
                opts.fold_axis,
                page,
                (opts.page_offset_x_mm, opts.page_offset_y_mm),
            )]
        }
        BindingMode::Brochure => brochure_guides(cut_rects, page),
        _ => return,
    };

    adapter.set_line_style(&LineStyle {
        width: GUIDE_LINE_WIDTH_MM,
        color: opts.mark_color,
    });
    for guide in guides {
        adapter.draw_line(&LineOp {
            x1: guide.segment.x1,
            y1: guide.segment.y1,
            x2: guide.segment.x2,
            y2: guide.segment.y2,
            dash: guide.dashed.then_some(FOLD_GUIDE_DASH_MM),
        });
    }
}
