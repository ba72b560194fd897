//! Pagination: deck -> ordered page records
//!
//! Expands the card list by repeat counts, resolves back images (falling
//! back to the global background when a back was never assigned), and
//! chunks the result into face/back page records per binding mode.

use crate::options::LayoutOptions;
use crate::types::{
    BindingMode, BleedOverride, CardEntry, DeckState, ImageRef, PageRecord, PageSide,
};

/// One expanded card instance travelling through pagination
#[derive(Debug, Clone, Default)]
struct Slot {
    face: Option<ImageRef>,
    back: Option<ImageRef>,
    bleed: Option<BleedOverride>,
}

impl Slot {
    fn from_card(card: &CardEntry, background: &Option<ImageRef>) -> Self {
        Self {
            face: card.face.clone(),
            back: resolve_back(card, background),
            bleed: card.bleed,
        }
    }
}

/// A back image whose `mtime` was never set is the sentinel for "no real
/// back assigned": such cards use the deck's global background instead.
fn resolve_back(card: &CardEntry, background: &Option<ImageRef>) -> Option<ImageRef> {
    match &card.back {
        Some(back) if back.is_assigned() => Some(back.clone()),
        _ => background.clone(),
    }
}

/// Compute the ordered page records for one deck.
///
/// Pure: identical inputs always yield identical records. An empty card
/// list yields an empty record list.
pub fn paginate(deck: &DeckState, opts: &LayoutOptions) -> Vec<PageRecord> {
    let expanded = expand(deck);
    if expanded.is_empty() {
        return Vec::new();
    }

    match opts.binding {
        BindingMode::Brochure => paginate_brochure(expanded, opts),
        _ => paginate_grid(expanded, opts),
    }
}

fn expand(deck: &DeckState) -> Vec<Slot> {
    let mut slots = Vec::new();
    for card in &deck.cards {
        let slot = Slot::from_card(card, &deck.global_background);
        for _ in 0..card.repeat.max(1) {
            slots.push(slot.clone());
        }
    }
    slots
}

fn paginate_grid(expanded: Vec<Slot>, opts: &LayoutOptions) -> Vec<PageRecord> {
    let per_page = opts.slots_per_record();
    if per_page == 0 {
        return Vec::new();
    }

    let mut records = Vec::new();
    for chunk in expanded.chunks(per_page) {
        records.push(record_from(
            PageSide::Face,
            chunk.iter().map(|s| s.face.clone()),
            chunk.iter().map(|s| s.bleed),
            per_page,
        ));
        if opts.binding.has_back_pages() {
            records.push(record_from(
                PageSide::Back,
                chunk.iter().map(|s| s.back.clone()),
                chunk.iter().map(|s| s.bleed),
                per_page,
            ));
        }
    }
    records
}

/// Brochure pagination.
///
/// The deck is padded to a multiple of four and split into adjacent pairs;
/// pairs are interleaved outermost-with-innermost as in saddle-stitch
/// imposition. The face sequence takes the left card of each interleaved
/// pair; the back sequence takes the partner cards, rotated by half the
/// sequence so each back page carries what registers behind its face page
/// once the folded stack is assembled.
fn paginate_brochure(mut expanded: Vec<Slot>, opts: &LayoutOptions) -> Vec<PageRecord> {
    let per_page = opts.slots_per_record();
    if per_page == 0 {
        return Vec::new();
    }

    while expanded.len() % 4 != 0 {
        expanded.push(Slot::default());
    }

    let pairs: Vec<(Slot, Slot)> = expanded
        .chunks(2)
        .map(|p| (p[0].clone(), p[1].clone()))
        .collect();
    let total = pairs.len();

    // outermost sheet interleaved with innermost
    let mut faces = Vec::with_capacity(total);
    let mut backs = Vec::with_capacity(total);
    for i in 0..total / 2 {
        let far = &pairs[total - 1 - i];
        let near = &pairs[i];
        faces.push(far.1.clone());
        backs.push(far.0.clone());
        faces.push(near.0.clone());
        backs.push(near.1.clone());
    }
    let half = backs.len() / 2;
    backs.rotate_left(half);

    if opts.brochure_repeat_per_page && faces.len() < per_page {
        // multiple small-booklet copies per sheet: tile whole copies only
        let copies = per_page / faces.len();
        faces = faces.iter().cloned().cycle().take(faces.len() * copies).collect();
        backs = backs.iter().cloned().cycle().take(backs.len() * copies).collect();
    }

    let mut records = Vec::new();
    for (face_chunk, back_chunk) in faces.chunks(per_page).zip(backs.chunks(per_page)) {
        records.push(record_from(
            PageSide::Face,
            face_chunk.iter().map(|s| s.face.clone()),
            face_chunk.iter().map(|s| s.bleed),
            per_page,
        ));
        records.push(record_from(
            PageSide::Back,
            back_chunk.iter().map(|s| s.face.clone()),
            back_chunk.iter().map(|s| s.bleed),
            per_page,
        ));
    }
    records
}

fn record_from(
    side: PageSide,
    images: impl Iterator<Item = Option<ImageRef>>,
    overrides: impl Iterator<Item = Option<BleedOverride>>,
    per_page: usize,
) -> PageRecord {
    let mut images: Vec<_> = images.collect();
    let mut overrides: Vec<_> = overrides.collect();
    images.resize(per_page, None);
    overrides.resize(per_page, None);
    PageRecord::new(side, images, overrides)
}
