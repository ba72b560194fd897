use card_impose::*;

fn image(name: &str) -> Option<ImageRef> {
    Some(ImageRef::new(format!("{name}.png"), "png", Some(1)))
}

fn deck_of(names: &[&str]) -> DeckState {
    DeckState {
        cards: names
            .iter()
            .map(|n| CardEntry::new(image(n), None))
            .collect(),
        global_background: None,
    }
}

fn numbered_deck(count: usize) -> DeckState {
    let names: Vec<String> = (1..=count).map(|i| i.to_string()).collect();
    deck_of(&names.iter().map(String::as_str).collect::<Vec<_>>())
}

fn face_names(record: &PageRecord) -> Vec<Option<String>> {
    record
        .images
        .iter()
        .map(|i| i.as_ref().map(|img| img.path.trim_end_matches(".png").to_string()))
        .collect()
}

#[test]
fn test_empty_deck_paginates_to_nothing() {
    let records = paginate(&DeckState::default(), &LayoutOptions::default());
    assert!(records.is_empty());
}

#[test]
fn test_one_sided_emits_faces_only() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::OneSided;
    let records = paginate(&numbered_deck(10), &opts);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.side == PageSide::Face));
    assert_eq!(records[0].occupied_slots(), 9);
    assert_eq!(records[1].occupied_slots(), 1);
}

#[test]
fn test_double_sided_pairs_every_face_page() {
    let records = paginate(&numbered_deck(10), &LayoutOptions::default());
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].side, PageSide::Face);
    assert_eq!(records[1].side, PageSide::Back);
    assert_eq!(records[2].side, PageSide::Face);
    assert_eq!(records[3].side, PageSide::Back);
    // last page padded with empty slots
    assert_eq!(records[2].images.len(), 9);
    assert_eq!(records[2].occupied_slots(), 1);
}

#[test]
fn test_repeat_expands_in_deck_order() {
    let mut deck = deck_of(&["a", "b"]);
    deck.cards[0].repeat = 3;
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::OneSided;
    let records = paginate(&deck, &opts);
    assert_eq!(
        face_names(&records[0])[..4],
        [
            Some("a".to_string()),
            Some("a".to_string()),
            Some("a".to_string()),
            Some("b".to_string())
        ]
    );
}

#[test]
fn test_unassigned_back_falls_back_to_global_background() {
    let mut deck = deck_of(&["a", "b", "c"]);
    // a: back never assigned (no mtime); b: real back; c: no back at all
    deck.cards[0].back = Some(ImageRef::new("stale.png", "png", None));
    deck.cards[1].back = Some(ImageRef::new("real-back.png", "png", Some(7)));
    deck.global_background = Some(ImageRef::new("background.png", "png", Some(2)));

    let records = paginate(&deck, &LayoutOptions::default());
    let backs = &records[1];
    assert_eq!(backs.side, PageSide::Back);
    assert_eq!(backs.images[0].as_ref().unwrap().path, "background.png");
    assert_eq!(backs.images[1].as_ref().unwrap().path, "real-back.png");
    assert_eq!(backs.images[2].as_ref().unwrap().path, "background.png");
}

#[test]
fn test_no_back_and_no_background_stays_empty() {
    let deck = deck_of(&["a"]);
    let records = paginate(&deck, &LayoutOptions::default());
    assert!(records[1].images[0].is_none());
}

#[test]
fn test_bleed_overrides_travel_with_their_card() {
    let mut deck = deck_of(&["a", "b"]);
    deck.cards[1].bleed = Some(BleedOverride {
        face_x: 1.0,
        face_y: 1.5,
        back_x: 0.5,
        back_y: 0.5,
    });
    let records = paginate(&deck, &LayoutOptions::default());
    assert!(records[0].overrides[0].is_none());
    assert_eq!(records[0].overrides[1].unwrap().face_x, 1.0);
    assert_eq!(records[1].overrides[1].unwrap().back_x, 0.5);
}

#[test]
fn test_fold_in_half_halves_page_capacity() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::FoldInHalf;
    opts.rows = 4;
    opts.columns = 3;
    // 6 slots per side
    let records = paginate(&numbered_deck(7), &opts);
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].images.len(), 6);
}

#[test]
fn test_brochure_signature_order() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 1;
    opts.columns = 1;

    let records = paginate(&numbered_deck(16), &opts);
    // 8 two-slot sheets: 4 face records interleaved with 4 back records
    assert_eq!(records.len(), 8);

    let faces: Vec<String> = records
        .iter()
        .filter(|r| r.side == PageSide::Face)
        .flat_map(|r| face_names(r).into_iter().flatten())
        .collect();
    let backs: Vec<String> = records
        .iter()
        .filter(|r| r.side == PageSide::Back)
        .flat_map(|r| face_names(r).into_iter().flatten())
        .collect();

    assert_eq!(faces, ["16", "1", "14", "3", "12", "5", "10", "7"]);
    assert_eq!(backs, ["11", "6", "9", "8", "15", "2", "13", "4"]);
}

#[test]
fn test_brochure_pads_to_multiple_of_four() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 1;
    opts.columns = 1;

    let records = paginate(&numbered_deck(5), &opts);
    // padded to 8 cards: 4 face records and 4 back records of 2 slots
    assert_eq!(records.len(), 8);
    let occupied: usize = records
        .iter()
        .filter(|r| r.side == PageSide::Face)
        .map(PageRecord::occupied_slots)
        .sum();
    assert_eq!(occupied, 5);
}

#[test]
fn test_brochure_repeat_per_page_tiles_whole_copies() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 2;
    opts.columns = 2;
    opts.brochure_repeat_per_page = true;
    // 8 slots per record; a 4-card booklet has a 2-entry face sequence,
    // so 4 copies tile each sheet
    let records = paginate(&numbered_deck(4), &opts);
    assert_eq!(records.len(), 2);
    let faces = face_names(&records[0]);
    assert_eq!(faces.len(), 8);
    assert_eq!(faces[0], faces[2]);
    assert_eq!(faces[1], faces[3]);
}

#[test]
fn test_pagination_is_deterministic() {
    let deck = numbered_deck(12);
    let opts = LayoutOptions::default();
    assert_eq!(paginate(&deck, &opts), paginate(&deck, &opts));
}
