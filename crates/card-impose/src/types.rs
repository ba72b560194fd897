/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// How the deck is bound once printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingMode {
    /// Faces only, one printed side per sheet
    OneSided,
    /// Faces and backs on alternating duplex pages
    #[default]
    DoubleSided,
    /// Faces and backs share one printed side; the sheet is folded to register
    FoldInHalf,
    /// Saddle-stitch booklet of card spreads
    Brochure,
}

impl BindingMode {
    /// Whether this mode produces paired back records
    pub fn has_back_pages(self) -> bool {
        !matches!(self, BindingMode::OneSided)
    }
}

/// Which paper edge the duplex pass flips around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingEdge {
    #[default]
    None,
    Long,
    Short,
}

/// Axis of the fold line for fold-in-half sheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FoldAxis {
    /// Fold line runs horizontally; halves are stacked vertically
    #[default]
    Horizontal,
    /// Fold line runs vertically; halves sit side by side
    Vertical,
}

/// Cut-mark style for one printed side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CutMarkStyle {
    None,
    /// Guide lines running from the card edges out to the page border
    #[default]
    Normal,
    /// Small crosses on every card corner
    Cross,
    /// Both guide lines and corner crosses
    Both,
}

impl CutMarkStyle {
    pub fn has_normal(self) -> bool {
        matches!(self, CutMarkStyle::Normal | CutMarkStyle::Both)
    }

    pub fn has_cross(self) -> bool {
        matches!(self, CutMarkStyle::Cross | CutMarkStyle::Both)
    }
}

/// Which logical side of the deck a page record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageSide {
    Face,
    Back,
}

/// An RGB color with alpha, as produced by the border sampler
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        alpha: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self { r, g, b, alpha }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Round a coordinate to two decimal places.
///
/// Equality comparisons and zero-gap adjacency checks depend on every
/// emitted rectangle field passing through this.
#[inline]
pub fn fix(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// A rectangular area in millimeters, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Copy with every field rounded to two decimals
    pub fn fixed(&self) -> Rect {
        Rect::new(fix(self.x), fix(self.y), fix(self.width), fix(self.height))
    }

    /// Grow by `dx`/`dy` on each side
    pub fn expanded(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }
}

/// Reference to a card image held by the external image store.
///
/// `mtime == None` on a back image means no real back was ever assigned;
/// pagination falls back to the deck's global background for that card.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRef {
    pub path: String,
    pub extension: String,
    pub mtime: Option<u64>,
}

impl ImageRef {
    pub fn new(path: impl Into<String>, extension: impl Into<String>, mtime: Option<u64>) -> Self {
        Self {
            path: path.into(),
            extension: extension.into(),
            mtime,
        }
    }

    /// Whether this reference points at a real, assigned image
    pub fn is_assigned(&self) -> bool {
        self.mtime.is_some()
    }
}

/// Per-card bleed override in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BleedOverride {
    pub face_x: f32,
    pub face_y: f32,
    pub back_x: f32,
    pub back_y: f32,
}

impl BleedOverride {
    /// Bleed for the given side as an (x, y) pair
    pub fn for_side(&self, side: PageSide) -> (f32, f32) {
        match side {
            PageSide::Face => (self.face_x, self.face_y),
            PageSide::Back => (self.back_x, self.back_y),
        }
    }
}

/// One card of the deck
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardEntry {
    pub face: Option<ImageRef>,
    pub back: Option<ImageRef>,
    /// How many copies of this card the deck contains (>= 1)
    pub repeat: u32,
    pub bleed: Option<BleedOverride>,
}

impl CardEntry {
    pub fn new(face: Option<ImageRef>, back: Option<ImageRef>) -> Self {
        Self {
            face,
            back,
            repeat: 1,
            bleed: None,
        }
    }
}

/// One output page of the imposition.
///
/// `images[i]` and `overrides[i]` always describe the same logical card,
/// through pagination and back-page reordering alike.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub side: PageSide,
    pub images: Vec<Option<ImageRef>>,
    pub overrides: Vec<Option<BleedOverride>>,
}

impl PageRecord {
    pub fn new(
        side: PageSide,
        images: Vec<Option<ImageRef>>,
        overrides: Vec<Option<BleedOverride>>,
    ) -> Self {
        debug_assert_eq!(images.len(), overrides.len());
        Self {
            side,
            images,
            overrides,
        }
    }

    /// Number of slots that actually carry an image
    pub fn occupied_slots(&self) -> usize {
        self.images.iter().filter(|i| i.is_some()).count()
    }
}

/// Transient deck snapshot handed to pagination and export
#[derive(Debug, Clone, Default)]
pub struct DeckState {
    pub cards: Vec<CardEntry>,
    /// Fallback image drawn behind cards whose back was never assigned
    pub global_background: Option<ImageRef>,
}
