use card_impose::*;

fn back_record(names: &[&str]) -> PageRecord {
    PageRecord::new(
        PageSide::Back,
        names
            .iter()
            .map(|n| Some(ImageRef::new(format!("{n}.png"), "png", Some(1))))
            .collect(),
        vec![None; names.len()],
    )
}

fn names(record: &PageRecord) -> Vec<String> {
    record
        .images
        .iter()
        .map(|i| i.as_ref().unwrap().path.trim_end_matches(".png").to_string())
        .collect()
}

#[test]
fn test_vertical_flip_reverses_rows() {
    let mut opts = LayoutOptions::default();
    opts.rows = 2;
    opts.columns = 4;
    opts.orientation = Orientation::Portrait;
    opts.edge = BindingEdge::Short;

    let record = back_record(&["1", "2", "3", "4", "5", "6", "7", "8"]);
    let reordered = reorder_back(&record, &opts);
    assert_eq!(names(&reordered), ["5", "6", "7", "8", "1", "2", "3", "4"]);
}

#[test]
fn test_horizontal_flip_reverses_columns() {
    let mut opts = LayoutOptions::default();
    opts.rows = 2;
    opts.columns = 4;
    opts.orientation = Orientation::Portrait;
    opts.edge = BindingEdge::Long;

    let record = back_record(&["1", "2", "3", "4", "5", "6", "7", "8"]);
    let reordered = reorder_back(&record, &opts);
    assert_eq!(names(&reordered), ["4", "3", "2", "1", "8", "7", "6", "5"]);
}

#[test]
fn test_edge_none_is_identity() {
    let mut opts = LayoutOptions::default();
    opts.edge = BindingEdge::None;
    opts.rows = 1;
    opts.columns = 3;
    let record = back_record(&["1", "2", "3"]);
    assert_eq!(reorder_back(&record, &opts), record);
}

#[test]
fn test_face_records_never_reorder() {
    let mut opts = LayoutOptions::default();
    opts.rows = 1;
    opts.columns = 3;
    let mut record = back_record(&["1", "2", "3"]);
    record.side = PageSide::Face;
    assert_eq!(reorder_back(&record, &opts), record);
}

#[test]
fn test_reorder_is_an_involution() {
    for (orientation, edge) in [
        (Orientation::Portrait, BindingEdge::Long),
        (Orientation::Portrait, BindingEdge::Short),
        (Orientation::Landscape, BindingEdge::Long),
        (Orientation::Landscape, BindingEdge::Short),
    ] {
        let mut opts = LayoutOptions::default();
        opts.rows = 3;
        opts.columns = 3;
        opts.orientation = orientation;
        opts.edge = edge;
        let record = back_record(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let twice = reorder_back(&reorder_back(&record, &opts), &opts);
        assert_eq!(twice, record);
    }
}

#[test]
fn test_overrides_follow_their_images() {
    let mut opts = LayoutOptions::default();
    opts.rows = 2;
    opts.columns = 2;
    opts.orientation = Orientation::Portrait;
    opts.edge = BindingEdge::Short;

    let mut record = back_record(&["1", "2", "3", "4"]);
    record.overrides[0] = Some(BleedOverride {
        face_x: 0.0,
        face_y: 0.0,
        back_x: 1.5,
        back_y: 1.5,
    });
    let reordered = reorder_back(&record, &opts);
    // card 1 moved to slot 2; its override moved with it
    assert_eq!(names(&reordered), ["3", "4", "1", "2"]);
    assert!(reordered.overrides[0].is_none());
    assert_eq!(reordered.overrides[2].unwrap().back_x, 1.5);
}

#[test]
fn test_fold_reorder_mirrors_along_fold_axis() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::FoldInHalf;
    opts.fold_axis = FoldAxis::Vertical;
    opts.rows = 2;
    opts.columns = 4; // record grid is 2x2

    let record = back_record(&["1", "2", "3", "4"]);
    let reordered = reorder_back(&record, &opts);
    assert_eq!(names(&reordered), ["2", "1", "4", "3"]);
}

#[test]
fn test_brochure_horizontal_flip_swaps_pairs() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 1;
    opts.columns = 2; // two spreads per row: slots [a b][c d]
    opts.orientation = Orientation::Portrait;
    opts.edge = BindingEdge::Long;

    let record = back_record(&["a", "b", "c", "d"]);
    let reordered = reorder_back(&record, &opts);
    assert_eq!(names(&reordered), ["d", "c", "b", "a"]);
}

#[test]
fn test_brochure_vertical_flip_keeps_pairs() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 2;
    opts.columns = 1;
    opts.orientation = Orientation::Portrait;
    opts.edge = BindingEdge::Short;

    let record = back_record(&["a", "b", "c", "d"]);
    let reordered = reorder_back(&record, &opts);
    assert_eq!(names(&reordered), ["c", "d", "a", "b"]);
}

#[test]
fn test_rotation_decision_table() {
    let mut opts = LayoutOptions::default();

    // faces never rotate
    assert!(!needs_rotation(&opts, false));

    for (orientation, edge, expected) in [
        (Orientation::Portrait, BindingEdge::Long, false),
        (Orientation::Portrait, BindingEdge::Short, true),
        (Orientation::Landscape, BindingEdge::Long, true),
        (Orientation::Landscape, BindingEdge::Short, false),
    ] {
        opts.orientation = orientation;
        opts.edge = edge;
        assert_eq!(needs_rotation(&opts, true), expected);
    }
}

#[test]
fn test_fold_rotation_depends_only_on_axis() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::FoldInHalf;

    opts.fold_axis = FoldAxis::Horizontal;
    assert!(needs_rotation(&opts, true));

    opts.fold_axis = FoldAxis::Vertical;
    // edge and orientation must not matter
    for (orientation, edge) in [
        (Orientation::Portrait, BindingEdge::Short),
        (Orientation::Landscape, BindingEdge::Long),
    ] {
        opts.orientation = orientation;
        opts.edge = edge;
        assert!(!needs_rotation(&opts, true));
    }
}
