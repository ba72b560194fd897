//! Layout statistics for the configuration view

use crate::layout::paginate;
use crate::options::LayoutOptions;
use crate::types::{BindingMode, DeckState, PageSide};

/// Summary figures for one deck under one layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStatistics {
    /// Cards after repeat expansion
    pub card_count: usize,
    /// Page records the export will draw
    pub record_count: usize,
    /// Physical sheets of paper
    pub sheet_count: usize,
    /// Card slots per page record
    pub slots_per_page: usize,
    /// Unfilled face slots (grid padding on the last page, or brochure
    /// padding to a multiple of four)
    pub blank_slots: usize,
}

/// Derived from an actual pagination run, so the figures always agree
/// with what the export will produce.
pub fn calculate_statistics(deck: &DeckState, opts: &LayoutOptions) -> LayoutStatistics {
    let card_count = deck
        .cards
        .iter()
        .map(|c| c.repeat.max(1) as usize)
        .sum();

    let records = paginate(deck, opts);
    let mut sheet_count = 0;
    let mut blank_slots = 0;
    for (index, record) in records.iter().enumerate() {
        let shares_page =
            record.side == PageSide::Back && opts.binding == BindingMode::FoldInHalf;
        if index == 0 || !shares_page {
            sheet_count += 1;
        }
        if record.side == PageSide::Face {
            blank_slots += record.images.len() - record.occupied_slots();
        }
    }

    LayoutStatistics {
        card_count,
        record_count: records.len(),
        sheet_count,
        slots_per_page: opts.slots_per_record(),
        blank_slots,
    }
}
