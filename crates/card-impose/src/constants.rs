//! Shared constants for card imposition
//!
//! This module centralizes magic numbers and constants used throughout
//! the layout and rendering process.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Default Card Dimensions
// =============================================================================

/// Default card width in millimeters (standard poker card)
pub const DEFAULT_CARD_WIDTH_MM: f32 = 63.0;

/// Default card height in millimeters (standard poker card)
pub const DEFAULT_CARD_HEIGHT_MM: f32 = 88.0;

// =============================================================================
// Cut Marks and Guides
// =============================================================================

/// Default line width for cut marks (millimeters)
pub const CUT_MARK_WIDTH_MM: f32 = 0.1;

/// Half-length of one arm of a cross cut mark (millimeters)
pub const CROSS_MARK_ARM_MM: f32 = 2.0;

/// Dash pattern for fold guides: (dash length, gap length) in millimeters
pub const FOLD_GUIDE_DASH_MM: (f32, f32) = (2.0, 1.5);

/// Line width for fold and split guides (millimeters)
pub const GUIDE_LINE_WIDTH_MM: f32 = 0.1;

// =============================================================================
// Page Numbers
// =============================================================================

/// Font size for page number labels (millimeters)
pub const PAGE_NUMBER_SIZE_MM: f32 = 3.0;

/// Distance of the page number baseline from the bottom page edge (millimeters)
pub const PAGE_NUMBER_OFFSET_MM: f32 = 2.0;

/// Approximate character width ratio for Helvetica
pub const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

// =============================================================================
// Rendering
// =============================================================================

/// Base raster resolution in pixels per millimeter (~96 dpi)
pub const RASTER_PX_PER_MM: f32 = 96.0 / 25.4;

/// Polling interval for the pending-image-jobs barrier (milliseconds)
pub const PENDING_POLL_MS: u64 = 50;
