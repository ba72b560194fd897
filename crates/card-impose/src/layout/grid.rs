//! Slot rectangle calculation
//!
//! This module computes where every card sits on a page for each binding
//! mode. All coordinates are in millimeters with a top-left origin, and
//! every emitted rectangle field is rounded to two decimal places.

use crate::options::LayoutOptions;
use crate::types::{BindingMode, FoldAxis, Rect};

/// Compute the ordered slot rectangles for one page.
///
/// `ignore_bleed` yields the cut-line rectangles used for marks and seam
/// checks; otherwise the global bleed (clamped to half the margin) is
/// folded into position and size. For fold-in-half sheets `is_back`
/// selects whether the supplementary (mirrored) half leads the list, so
/// that index `i` of a back record lands in register with face slot `i`
/// once the sheet is folded.
pub fn cut_rectangles(
    opts: &LayoutOptions,
    page_size: (f32, f32),
    ignore_bleed: bool,
    is_back: bool,
) -> Vec<Rect> {
    let s = opts.scale();
    let cell = CellMetrics {
        card_w: opts.card_width_mm * s,
        card_h: opts.card_height_mm * s,
        margin_x: opts.margin_x_mm * s,
        margin_y: opts.margin_y_mm * s,
        bleed: if ignore_bleed {
            (0.0, 0.0)
        } else {
            opts.clamped_bleed()
        },
        fold_margin: opts.fold_margin_mm * s,
    };

    let rects = match opts.binding {
        BindingMode::OneSided | BindingMode::DoubleSided => {
            normal_slots(&cell, opts.rows, opts.columns)
        }
        BindingMode::FoldInHalf => {
            fold_slots(&cell, opts.rows, opts.columns, opts.fold_axis, is_back)
        }
        BindingMode::Brochure => brochure_slots(&cell, opts.rows, opts.columns),
    };

    center_rects(
        rects,
        page_size,
        (opts.page_offset_x_mm, opts.page_offset_y_mm),
    )
}

struct CellMetrics {
    card_w: f32,
    card_h: f32,
    margin_x: f32,
    margin_y: f32,
    bleed: (f32, f32),
    fold_margin: f32,
}

impl CellMetrics {
    /// Cell origin for grid position (row, col), half-margin offset
    fn origin(&self, row: usize, col: usize) -> (f32, f32) {
        (
            col as f32 * (self.card_w + self.margin_x) + self.margin_x / 2.0,
            row as f32 * (self.card_h + self.margin_y) + self.margin_y / 2.0,
        )
    }

    /// Expand a base card rectangle by the active bleed on all four sides
    fn bled(&self, base: Rect) -> Rect {
        base.expanded(self.bleed.0, self.bleed.1)
    }
}

fn normal_slots(cell: &CellMetrics, rows: usize, cols: usize) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = cell.origin(row, col);
            rects.push(cell.bled(Rect::new(x, y, cell.card_w, cell.card_h)));
        }
    }
    rects
}

/// Fold-in-half: the grid splits along the fold axis into a primary half
/// and a supplementary half that mirrors it across the fold line. Primary
/// slots shift `fold_margin/2` away from the line; their mirror images
/// pick up the opposite sign. The supplementary block is enumerated in its
/// own row-major order, so the back-page reorder (which reverses along the
/// fold axis) maps card `i` onto the mirror of face slot `i`.
fn fold_slots(
    cell: &CellMetrics,
    rows: usize,
    cols: usize,
    axis: FoldAxis,
    is_back: bool,
) -> Vec<Rect> {
    let (primary, supplementary) = match axis {
        FoldAxis::Horizontal => {
            let half = rows / 2;
            let fold_line = half as f32 * (cell.card_h + cell.margin_y);
            let mut primary = Vec::with_capacity(half * cols);
            for row in 0..half {
                for col in 0..cols {
                    let (x, y) = cell.origin(row, col);
                    primary.push(Rect::new(
                        x,
                        y - cell.fold_margin / 2.0,
                        cell.card_w,
                        cell.card_h,
                    ));
                }
            }
            let mut supplementary = Vec::with_capacity(half * cols);
            for row in 0..half {
                let src = half - 1 - row;
                for col in 0..cols {
                    let r = primary[src * cols + col];
                    supplementary.push(Rect::new(
                        r.x,
                        2.0 * fold_line - r.y - r.height,
                        r.width,
                        r.height,
                    ));
                }
            }
            (primary, supplementary)
        }
        FoldAxis::Vertical => {
            let half = cols / 2;
            let fold_line = half as f32 * (cell.card_w + cell.margin_x);
            let mut primary = Vec::with_capacity(rows * half);
            for row in 0..rows {
                for col in 0..half {
                    let (x, y) = cell.origin(row, col);
                    primary.push(Rect::new(
                        x - cell.fold_margin / 2.0,
                        y,
                        cell.card_w,
                        cell.card_h,
                    ));
                }
            }
            let mut supplementary = Vec::with_capacity(rows * half);
            for row in 0..rows {
                for col in 0..half {
                    let src = half - 1 - col;
                    let r = primary[row * half + src];
                    supplementary.push(Rect::new(
                        2.0 * fold_line - r.x - r.width,
                        r.y,
                        r.width,
                        r.height,
                    ));
                }
            }
            (primary, supplementary)
        }
    };

    let mut rects = Vec::with_capacity(primary.len() * 2);
    if is_back {
        rects.extend(supplementary.iter().map(|r| cell.bled(*r)));
        rects.extend(primary.iter().map(|r| cell.bled(*r)));
    } else {
        rects.extend(primary.iter().map(|r| cell.bled(*r)));
        rects.extend(supplementary.iter().map(|r| cell.bled(*r)));
    }
    rects
}

/// Brochure: every cell hosts a two-card spread. Bleed is applied only on
/// the three outer edges of each half; the shared center seam never bleeds,
/// so the two halves stay edge-adjacent for any bleed value.
fn brochure_slots(cell: &CellMetrics, rows: usize, cols: usize) -> Vec<Rect> {
    let (bx, by) = cell.bleed;
    let spread_w = cell.card_w * 2.0;
    let mut rects = Vec::with_capacity(rows * cols * 2);
    for row in 0..rows {
        for col in 0..cols {
            let x = col as f32 * (spread_w + cell.margin_x) + cell.margin_x / 2.0;
            let y = row as f32 * (cell.card_h + cell.margin_y) + cell.margin_y / 2.0;
            // left half: bleed on left/top/bottom
            rects.push(Rect::new(
                x - bx,
                y - by,
                cell.card_w + bx,
                cell.card_h + 2.0 * by,
            ));
            // right half: bleed on right/top/bottom
            rects.push(Rect::new(
                x + cell.card_w,
                y - by,
                cell.card_w + bx,
                cell.card_h + 2.0 * by,
            ));
        }
    }
    rects
}

/// Translate the whole set so its bounding box is centered on the page,
/// apply the global page offset, then round every coordinate.
fn center_rects(rects: Vec<Rect>, page_size: (f32, f32), offset: (f32, f32)) -> Vec<Rect> {
    if rects.is_empty() {
        return rects;
    }

    let min_x = rects.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
    let min_y = rects.iter().map(|r| r.y).fold(f32::INFINITY, f32::min);
    let max_x = rects.iter().map(|r| r.right()).fold(f32::NEG_INFINITY, f32::max);
    let max_y = rects.iter().map(|r| r.bottom()).fold(f32::NEG_INFINITY, f32::max);

    let dx = (page_size.0 - (max_x - min_x)) / 2.0 - min_x + offset.0;
    let dy = (page_size.1 - (max_y - min_y)) / 2.0 - min_y + offset.1;

    rects
        .into_iter()
        .map(|r| Rect::new(r.x + dx, r.y + dy, r.width, r.height).fixed())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BindingEdge, PaperSize};

    fn base_options() -> LayoutOptions {
        LayoutOptions {
            binding: BindingMode::OneSided,
            edge: BindingEdge::None,
            columns: 1,
            rows: 1,
            margin_x_mm: 0.0,
            margin_y_mm: 0.0,
            face_marks: crate::types::CutMarkStyle::None,
            ..LayoutOptions::default()
        }
    }

    #[test]
    fn test_single_card_exact_page() {
        let opts = base_options();
        let rects = cut_rectangles(&opts, (63.0, 88.0), true, false);
        assert_eq!(rects, vec![Rect::new(0.0, 0.0, 63.0, 88.0)]);
    }

    #[test]
    fn test_two_cards_with_margin() {
        let mut opts = base_options();
        opts.columns = 2;
        opts.margin_x_mm = 1.0;
        let rects = cut_rectangles(&opts, (127.0, 88.0), true, false);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 63.0, 88.0));
        assert_eq!(rects[1], Rect::new(64.0, 0.0, 63.0, 88.0));
    }

    #[test]
    fn test_rounding_idempotent() {
        let mut opts = base_options();
        opts.columns = 3;
        opts.rows = 3;
        opts.margin_x_mm = 1.7;
        opts.margin_y_mm = 2.3;
        opts.scale_percent = 97.0;
        opts.paper_size = PaperSize::A4;
        let rects = cut_rectangles(&opts, opts.page_size_mm(), false, false);
        for r in &rects {
            assert_eq!(*r, r.fixed());
        }
    }

    #[test]
    fn test_brochure_seam_zero_gap() {
        let mut opts = base_options();
        opts.binding = BindingMode::Brochure;
        opts.margin_x_mm = 4.0;
        opts.margin_y_mm = 4.0;
        opts.bleed_x_mm = 2.0;
        opts.bleed_y_mm = 2.0;
        opts.card_width_mm = 40.0;
        opts.card_height_mm = 60.0;
        let rects = cut_rectangles(&opts, (210.0, 297.0), false, false);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].right(), rects[1].x);
    }

    #[test]
    fn test_fold_halves_mirror_across_center() {
        let mut opts = base_options();
        opts.binding = BindingMode::FoldInHalf;
        opts.fold_axis = FoldAxis::Horizontal;
        opts.rows = 2;
        opts.columns = 2;
        opts.margin_x_mm = 2.0;
        opts.margin_y_mm = 2.0;
        opts.fold_margin_mm = 4.0;
        let page = (210.0, 297.0);
        let rects = cut_rectangles(&opts, page, true, false);
        assert_eq!(rects.len(), 4);

        // primary slot 0 and supplementary slot 0 mirror across the page center
        let center_y = page.1 / 2.0;
        let face_top = rects[0].y;
        let back_bottom = rects[2].bottom();
        assert!((center_y - face_top - (back_bottom - center_y)).abs() < 0.02);
        assert_eq!(rects[0].x, rects[2].x);
    }

    #[test]
    fn test_fold_back_leads_with_supplementary_half() {
        let mut opts = base_options();
        opts.binding = BindingMode::FoldInHalf;
        opts.fold_axis = FoldAxis::Vertical;
        opts.rows = 1;
        opts.columns = 2;
        opts.card_width_mm = 40.0;
        let page = (210.0, 297.0);
        let face = cut_rectangles(&opts, page, true, false);
        let back = cut_rectangles(&opts, page, true, true);
        assert_eq!(face.len(), 2);
        // same physical slot set, opposite block order
        assert_eq!(face[0], back[1]);
        assert_eq!(face[1], back[0]);
    }

    #[test]
    fn test_determinism() {
        let opts = LayoutOptions::default();
        let a = cut_rectangles(&opts, opts.page_size_mm(), false, false);
        let b = cut_rectangles(&opts, opts.page_size_mm(), false, false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_zero_card_size() {
        let mut opts = base_options();
        opts.card_width_mm = 0.0;
        opts.card_height_mm = 0.0;
        let rects = cut_rectangles(&opts, (100.0, 100.0), true, false);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].width, 0.0);
        assert_eq!(rects[0].height, 0.0);
    }
}
