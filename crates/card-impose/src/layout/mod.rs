//! Layout calculation modules for card imposition
//!
//! Everything here is pure and total: the same configuration always yields
//! the same rectangles and page records, and degenerate inputs produce
//! degenerate but well-formed output.
//!
//! - Geometry: slot rectangles for every binding mode
//! - Pagination: card list -> ordered page records
//! - Reorder: back-page remapping + rotation decision

mod grid;
mod paginate;
mod reorder;

pub use grid::*;
pub use paginate::*;
pub use reorder::*;
