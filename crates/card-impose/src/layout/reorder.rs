//! Back-page reordering and rotation decision
//!
//! A duplex sheet's back is imaged in a second pass; which physical cell
//! lands behind a given front cell depends on binding edge, orientation
//! and fold axis. `reorder_back` remaps a back record's images and bleed
//! overrides in lock-step so index `i` of the result is what registers
//! behind front slot `i`.

use crate::options::LayoutOptions;
use crate::types::{BindingEdge, BindingMode, FoldAxis, Orientation, PageRecord, PageSide};

/// Remap a back record for duplex registration. Identity for face records.
pub fn reorder_back(record: &PageRecord, opts: &LayoutOptions) -> PageRecord {
    if record.side != PageSide::Back {
        return record.clone();
    }

    match opts.binding {
        BindingMode::FoldInHalf => reorder_fold(record, opts),
        BindingMode::Brochure => reorder_brochure(record, opts),
        BindingMode::DoubleSided => reorder_plain(record, opts),
        BindingMode::OneSided => record.clone(),
    }
}

/// Whether back-page content must be drawn rotated 180 degrees.
///
/// Fold-in-half depends only on the fold axis; every other mode collapses
/// by symmetry to (landscape, long) / (portrait, short).
pub fn needs_rotation(opts: &LayoutOptions, is_back: bool) -> bool {
    if !is_back {
        return false;
    }
    match opts.binding {
        BindingMode::FoldInHalf => opts.fold_axis == FoldAxis::Horizontal,
        _ => flips_vertically(opts),
    }
}

/// True when the duplex pass mirrors the sheet top-to-bottom: flipping on
/// the long edge of a landscape page or the short edge of a portrait page.
fn flips_vertically(opts: &LayoutOptions) -> bool {
    matches!(
        (opts.orientation, opts.edge),
        (Orientation::Landscape, BindingEdge::Long) | (Orientation::Portrait, BindingEdge::Short)
    )
}

/// Apply an index permutation to images and overrides together
fn permuted(record: &PageRecord, map: impl Fn(usize) -> usize) -> PageRecord {
    let n = record.images.len();
    let mut images = vec![None; n];
    let mut overrides = vec![None; n];
    for i in 0..n {
        let src = map(i);
        images[i] = record.images[src].clone();
        overrides[i] = record.overrides[src];
    }
    PageRecord::new(record.side, images, overrides)
}

/// Fold-in-half: mirror cell order along the fold axis within the active
/// half. Horizontal fold reverses within each column, vertical within each
/// row.
fn reorder_fold(record: &PageRecord, opts: &LayoutOptions) -> PageRecord {
    let (rows, cols) = opts.record_grid();
    if rows * cols != record.images.len() || rows == 0 || cols == 0 {
        return record.clone();
    }
    match opts.fold_axis {
        FoldAxis::Horizontal => permuted(record, |i| {
            let (row, col) = (i / cols, i % cols);
            (rows - 1 - row) * cols + col
        }),
        FoldAxis::Vertical => permuted(record, |i| {
            let (row, col) = (i / cols, i % cols);
            row * cols + (cols - 1 - col)
        }),
    }
}

/// Plain double-sided: mirror the whole grid along one axis
fn reorder_plain(record: &PageRecord, opts: &LayoutOptions) -> PageRecord {
    if opts.edge == BindingEdge::None {
        return record.clone();
    }
    let (rows, cols) = (opts.rows, opts.columns);
    if rows * cols != record.images.len() || rows == 0 || cols == 0 {
        return record.clone();
    }
    if flips_vertically(opts) {
        permuted(record, |i| {
            let (row, col) = (i / cols, i % cols);
            (rows - 1 - row) * cols + col
        })
    } else {
        permuted(record, |i| {
            let (row, col) = (i / cols, i % cols);
            row * cols + (cols - 1 - col)
        })
    }
}

/// Brochure: slots come in side-by-side pairs (two per spread cell). A
/// vertical flip reverses row order and keeps pair internals; a horizontal
/// flip reverses pair order within each row and swaps within every pair.
fn reorder_brochure(record: &PageRecord, opts: &LayoutOptions) -> PageRecord {
    if opts.edge == BindingEdge::None {
        return record.clone();
    }
    let (rows, pairs) = (opts.rows, opts.columns);
    if rows * pairs * 2 != record.images.len() || rows == 0 || pairs == 0 {
        return record.clone();
    }
    if flips_vertically(opts) {
        permuted(record, |i| {
            let (row, rest) = (i / (pairs * 2), i % (pairs * 2));
            (rows - 1 - row) * pairs * 2 + rest
        })
    } else {
        permuted(record, |i| {
            let row = i / (pairs * 2);
            let pair = (i % (pairs * 2)) / 2;
            let half = i % 2;
            row * pairs * 2 + (pairs - 1 - pair) * 2 + (1 - half)
        })
    }
}
