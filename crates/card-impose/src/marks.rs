//! Cut-mark and guide-line geometry
//!
//! Marks are computed here as plain segments, in millimeters, from the
//! bleed-excluded slot rectangles. Every rendering backend draws the same
//! segments, which keeps the four backends consistent with each other.

use crate::constants::CROSS_MARK_ARM_MM;
use crate::types::{Rect, fix};

/// One straight mark segment in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl LineSegment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// A fold or split guide; dashed guides mark folds, solid guides mark cuts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub segment: LineSegment,
    pub dashed: bool,
}

/// Normal cut marks: guide lines running from every cut coordinate out to
/// the nearest page border, confined to the outer margin bands so they
/// never cross a card.
///
/// Rectangles sharing an edge coordinate are grouped into one line. For
/// brochure pages only the outer edge of each spread half is marked; the
/// center seam is a fold, not a cut, and the marked side alternates
/// between the left and right half of every spread.
pub fn cut_mark_lines(rects: &[Rect], page_size: (f32, f32), brochure: bool) -> Vec<LineSegment> {
    if rects.is_empty() {
        return Vec::new();
    }

    let top = rects.iter().map(|r| r.y).fold(f32::INFINITY, f32::min);
    let bottom = rects.iter().map(|r| r.bottom()).fold(f32::NEG_INFINITY, f32::max);
    let left = rects.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
    let right = rects.iter().map(|r| r.right()).fold(f32::NEG_INFINITY, f32::max);

    let mut xs: Vec<f32> = Vec::new();
    if brochure {
        for (i, r) in rects.iter().enumerate() {
            if i % 2 == 0 {
                xs.push(r.x);
            } else {
                xs.push(r.right());
            }
        }
    } else {
        for r in rects {
            xs.push(r.x);
            xs.push(r.right());
        }
    }
    let mut ys: Vec<f32> = rects.iter().flat_map(|r| [r.y, r.bottom()]).collect();

    dedupe(&mut xs);
    dedupe(&mut ys);

    let mut lines = Vec::new();
    for &x in &xs {
        if top > 0.0 {
            lines.push(LineSegment::new(x, 0.0, x, top));
        }
        if bottom < page_size.1 {
            lines.push(LineSegment::new(x, bottom, x, page_size.1));
        }
    }
    for &y in &ys {
        if left > 0.0 {
            lines.push(LineSegment::new(0.0, y, left, y));
        }
        if right < page_size.0 {
            lines.push(LineSegment::new(right, y, page_size.0, y));
        }
    }
    lines
}

/// Cross cut marks: a small `+` centered on every distinct slot corner
pub fn cross_mark_lines(rects: &[Rect]) -> Vec<LineSegment> {
    let mut corners: Vec<(f32, f32)> = Vec::new();
    for r in rects {
        corners.push((r.x, r.y));
        corners.push((r.right(), r.y));
        corners.push((r.x, r.bottom()));
        corners.push((r.right(), r.bottom()));
    }
    corners.sort_by_key(|&(x, y)| (cents(x), cents(y)));
    corners.dedup_by_key(|&mut (x, y)| (cents(x), cents(y)));

    let arm = CROSS_MARK_ARM_MM;
    let mut lines = Vec::with_capacity(corners.len() * 2);
    for (x, y) in corners {
        lines.push(LineSegment::new(x - arm, y, x + arm, y));
        lines.push(LineSegment::new(x, y - arm, x, y + arm));
    }
    lines
}

/// The dashed center guide of a fold-in-half sheet
pub fn fold_guide(
    axis: crate::types::FoldAxis,
    page_size: (f32, f32),
    page_offset: (f32, f32),
) -> GuideLine {
    let segment = match axis {
        crate::types::FoldAxis::Horizontal => {
            let y = fix(page_size.1 / 2.0 + page_offset.1);
            LineSegment::new(0.0, y, page_size.0, y)
        }
        crate::types::FoldAxis::Vertical => {
            let x = fix(page_size.0 / 2.0 + page_offset.0);
            LineSegment::new(x, 0.0, x, page_size.1)
        }
    };
    GuideLine {
        segment,
        dashed: true,
    }
}

/// Brochure guides: a dashed fold guide down every spread seam, and solid
/// split guides between adjacent cells (each cell is a separate booklet).
pub fn brochure_guides(rects: &[Rect], page_size: (f32, f32)) -> Vec<GuideLine> {
    let mut guides = Vec::new();

    // seam folds
    for spread in rects.chunks(2) {
        if spread.len() < 2 {
            continue;
        }
        let seam = spread[0].right();
        guides.push(GuideLine {
            segment: LineSegment::new(seam, spread[0].y, seam, spread[0].bottom()),
            dashed: true,
        });
    }

    // split cuts between cells
    let mut xs: Vec<f32> = Vec::new();
    let mut ys: Vec<f32> = Vec::new();
    for pair in rects.chunks(2).collect::<Vec<_>>().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b[0].y > a[0].y {
            // new cell row below
            ys.push((a[0].bottom() + b[0].y) / 2.0);
        } else if b[0].x > a[1].right() {
            // next cell in the same row
            xs.push((a[1].right() + b[0].x) / 2.0);
        }
    }
    dedupe(&mut xs);
    dedupe(&mut ys);
    for x in xs {
        guides.push(GuideLine {
            segment: LineSegment::new(x, 0.0, x, page_size.1),
            dashed: false,
        });
    }
    for y in ys {
        guides.push(GuideLine {
            segment: LineSegment::new(0.0, y, page_size.0, y),
            dashed: false,
        });
    }
    guides
}

fn cents(v: f32) -> i64 {
    (v * 100.0).round() as i64
}

fn dedupe(values: &mut Vec<f32>) {
    values.sort_by_key(|&v| cents(v));
    values.dedup_by_key(|&mut v| cents(v));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_lines_dedupe_shared_edges() {
        // two cards sharing a vertical cut coordinate
        let rects = vec![
            Rect::new(10.0, 10.0, 60.0, 80.0),
            Rect::new(70.0, 10.0, 60.0, 80.0),
        ];
        let lines = cut_mark_lines(&rects, (140.0, 100.0), false);
        // 3 distinct xs * 2 bands + 2 distinct ys * 2 bands
        assert_eq!(lines.len(), 3 * 2 + 2 * 2);
    }

    #[test]
    fn test_cross_marks_dedupe_shared_corners() {
        let rects = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(10.0, 0.0, 10.0, 10.0),
        ];
        // 6 distinct corners, two segments each
        assert_eq!(cross_mark_lines(&rects).len(), 12);
    }

    #[test]
    fn test_brochure_marks_skip_seam() {
        let rects = vec![
            Rect::new(20.0, 20.0, 40.0, 60.0),
            Rect::new(60.0, 20.0, 40.0, 60.0),
        ];
        let lines = cut_mark_lines(&rects, (120.0, 100.0), true);
        // no vertical line at the seam x = 60
        assert!(
            lines
                .iter()
                .all(|l| !(l.x1 == 60.0 && l.x2 == 60.0))
        );
    }
}
