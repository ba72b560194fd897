use crate::constants::{DEFAULT_CARD_HEIGHT_MM, DEFAULT_CARD_WIDTH_MM};
use crate::types::*;

#[cfg(feature = "serde")]
use crate::{ImposeError, Result};

/// Comprehensive layout configuration for one deck export.
///
/// Everything is expressed in millimeters before scaling; `scale_percent`
/// is applied uniformly to card size, margins, bleed and fold margin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutOptions {
    // Page
    pub paper_size: PaperSize,
    pub orientation: Orientation,

    // Binding
    pub binding: BindingMode,
    pub edge: BindingEdge,
    pub fold_axis: FoldAxis,

    // Grid
    pub columns: usize,
    pub rows: usize,

    // Card geometry
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub scale_percent: f32,

    // Spacing
    pub margin_x_mm: f32,
    pub margin_y_mm: f32,
    pub bleed_x_mm: f32,
    pub bleed_y_mm: f32,
    pub fold_margin_mm: f32,

    // Offsets
    pub page_offset_x_mm: f32,
    pub page_offset_y_mm: f32,
    pub registration_offset_x_mm: f32,
    pub registration_offset_y_mm: f32,

    // Cut marks
    pub face_marks: CutMarkStyle,
    pub back_marks: CutMarkStyle,
    pub mark_color: Color,
    pub mark_width_mm: f32,

    // Flags
    pub margin_fill: bool,
    pub avoid_dislocation: bool,
    pub brochure_repeat_per_page: bool,
    pub show_page_numbers: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            binding: BindingMode::DoubleSided,
            edge: BindingEdge::Long,
            fold_axis: FoldAxis::Horizontal,
            columns: 3,
            rows: 3,
            card_width_mm: DEFAULT_CARD_WIDTH_MM,
            card_height_mm: DEFAULT_CARD_HEIGHT_MM,
            scale_percent: 100.0,
            margin_x_mm: 2.0,
            margin_y_mm: 2.0,
            bleed_x_mm: 0.0,
            bleed_y_mm: 0.0,
            fold_margin_mm: 0.0,
            page_offset_x_mm: 0.0,
            page_offset_y_mm: 0.0,
            registration_offset_x_mm: 0.0,
            registration_offset_y_mm: 0.0,
            face_marks: CutMarkStyle::Normal,
            back_marks: CutMarkStyle::None,
            mark_color: Color::BLACK,
            mark_width_mm: crate::constants::CUT_MARK_WIDTH_MM,
            margin_fill: false,
            avoid_dislocation: false,
            brochure_repeat_per_page: false,
            show_page_numbers: false,
        }
    }
}

impl LayoutOptions {
    /// Page dimensions in millimeters with orientation applied
    pub fn page_size_mm(&self) -> (f32, f32) {
        self.paper_size.dimensions_with_orientation(self.orientation)
    }

    /// The uniform scale factor derived from `scale_percent`
    pub fn scale(&self) -> f32 {
        self.scale_percent / 100.0
    }

    /// Scaled global bleed, clamped to at most half the margin on each axis.
    ///
    /// The configuration editor enforces bleed <= margin/2 upstream; the
    /// core tolerates violations by clamping here.
    pub fn clamped_bleed(&self) -> (f32, f32) {
        let s = self.scale();
        (
            (self.bleed_x_mm * s).clamp(0.0, self.margin_x_mm * s / 2.0),
            (self.bleed_y_mm * s).clamp(0.0, self.margin_y_mm * s / 2.0),
        )
    }

    /// Clamp a per-card bleed override to at most half the margin
    pub fn clamp_override(&self, bleed_x: f32, bleed_y: f32) -> (f32, f32) {
        let s = self.scale();
        (
            (bleed_x * s).clamp(0.0, self.margin_x_mm * s / 2.0),
            (bleed_y * s).clamp(0.0, self.margin_y_mm * s / 2.0),
        )
    }

    /// Number of card slots on one page record for this binding mode.
    ///
    /// Fold-in-half sheets expose only half their physical grid per side;
    /// brochure cells hold two cards each.
    pub fn slots_per_record(&self) -> usize {
        match self.binding {
            BindingMode::OneSided | BindingMode::DoubleSided => self.rows * self.columns,
            BindingMode::FoldInHalf => match self.fold_axis {
                FoldAxis::Horizontal => (self.rows / 2) * self.columns,
                FoldAxis::Vertical => self.rows * (self.columns / 2),
            },
            BindingMode::Brochure => self.rows * self.columns * 2,
        }
    }

    /// Grid dimensions (rows, columns) of one page record's slot layout
    pub fn record_grid(&self) -> (usize, usize) {
        match self.binding {
            BindingMode::OneSided | BindingMode::DoubleSided => (self.rows, self.columns),
            BindingMode::FoldInHalf => match self.fold_axis {
                FoldAxis::Horizontal => (self.rows / 2, self.columns),
                FoldAxis::Vertical => (self.rows, self.columns / 2),
            },
            // Brochure rows hold `columns` spreads of two slots each
            BindingMode::Brochure => (self.rows, self.columns * 2),
        }
    }

    /// Load options from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ImposeError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to a JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ImposeError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
