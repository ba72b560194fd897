use card_impose::*;

#[test]
fn test_defaults() {
    let opts = LayoutOptions::default();
    assert_eq!(opts.paper_size, PaperSize::A4);
    assert_eq!(opts.orientation, Orientation::Portrait);
    assert_eq!(opts.binding, BindingMode::DoubleSided);
    assert_eq!(opts.edge, BindingEdge::Long);
    assert_eq!(opts.columns, 3);
    assert_eq!(opts.rows, 3);
    assert_eq!(opts.card_width_mm, 63.0);
    assert_eq!(opts.card_height_mm, 88.0);
    assert_eq!(opts.scale_percent, 100.0);
    assert_eq!(opts.face_marks, CutMarkStyle::Normal);
    assert_eq!(opts.back_marks, CutMarkStyle::None);
    assert!(!opts.margin_fill);
    assert!(!opts.avoid_dislocation);
}

#[test]
fn test_page_size_follows_orientation() {
    let mut opts = LayoutOptions::default();
    assert_eq!(opts.page_size_mm(), (210.0, 297.0));
    opts.orientation = Orientation::Landscape;
    assert_eq!(opts.page_size_mm(), (297.0, 210.0));
}

#[test]
fn test_bleed_clamps_to_half_margin() {
    let mut opts = LayoutOptions::default();
    opts.margin_x_mm = 4.0;
    opts.margin_y_mm = 6.0;
    opts.bleed_x_mm = 10.0;
    opts.bleed_y_mm = 2.5;
    assert_eq!(opts.clamped_bleed(), (2.0, 2.5));

    // scaling shrinks both the bleed and its ceiling
    opts.scale_percent = 50.0;
    assert_eq!(opts.clamped_bleed(), (1.0, 1.25));

    // negative values clamp to zero
    opts.scale_percent = 100.0;
    opts.bleed_x_mm = -3.0;
    assert_eq!(opts.clamped_bleed().0, 0.0);
}

#[test]
fn test_slots_per_record_by_binding() {
    let mut opts = LayoutOptions::default();
    opts.rows = 4;
    opts.columns = 3;

    opts.binding = BindingMode::OneSided;
    assert_eq!(opts.slots_per_record(), 12);

    opts.binding = BindingMode::DoubleSided;
    assert_eq!(opts.slots_per_record(), 12);

    opts.binding = BindingMode::FoldInHalf;
    opts.fold_axis = FoldAxis::Horizontal;
    assert_eq!(opts.slots_per_record(), 6);
    opts.fold_axis = FoldAxis::Vertical;
    assert_eq!(opts.slots_per_record(), 4);

    opts.binding = BindingMode::Brochure;
    assert_eq!(opts.slots_per_record(), 24);
}

#[test]
fn test_odd_fold_grids_drop_the_extra_line() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::FoldInHalf;
    opts.fold_axis = FoldAxis::Horizontal;
    opts.rows = 3;
    opts.columns = 2;
    // only one full row fits on each side of the fold
    assert_eq!(opts.slots_per_record(), 2);
}

#[test]
fn test_record_grid_brochure_doubles_columns() {
    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.rows = 2;
    opts.columns = 3;
    assert_eq!(opts.record_grid(), (2, 6));
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_save_and_load_options() {
    use tempfile::NamedTempFile;

    let mut opts = LayoutOptions::default();
    opts.binding = BindingMode::Brochure;
    opts.paper_size = PaperSize::Letter;
    opts.orientation = Orientation::Landscape;
    opts.columns = 2;
    opts.rows = 4;
    opts.scale_percent = 92.5;
    opts.mark_color = Color::new(120, 0, 40, 1.0);
    opts.margin_fill = true;
    opts.show_page_numbers = true;

    let temp = NamedTempFile::new().unwrap();
    opts.save(temp.path()).await.unwrap();

    let loaded = LayoutOptions::load(temp.path()).await.unwrap();
    assert_eq!(loaded, opts);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_load_rejects_malformed_config() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    tokio::fs::write(temp.path(), b"{not json").await.unwrap();

    let result = LayoutOptions::load(temp.path()).await;
    assert!(matches!(result, Err(ImposeError::Config(_))));
}
