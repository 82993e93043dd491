//! Pure placement computation for the tutorial's explanatory panel.
//!
//! Given the highlighted region's bounding box and a preferred side, this
//! computes where the panel goes so it stays fully inside the viewport.
//! Applying the result to a rendered element is the renderer's job; nothing
//! here touches display state.

/// Panel width in layout units.
pub const PANEL_WIDTH: f64 = 600.0;
/// Panel height in layout units.
pub const PANEL_HEIGHT: f64 = 400.0;
/// Gap between the highlighted region and the panel.
pub const PADDING: f64 = 30.0;
/// Minimum distance kept from the viewport edges.
pub const MARGIN: f64 = 20.0;

/// Axis-aligned bounding box of a page region, viewport-relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Preferred panel position relative to the highlighted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredSide {
    /// Left of the region, falling back on overflow
    Left,
    /// Right of the region, falling back on overflow
    Right,
    /// Below the region, flipping above on vertical overflow
    Bottom,
    /// Below the region, never falling back (page layout guarantees room)
    BottomForced,
    /// Viewport center, ignoring the region
    Center,
}

/// Final panel coordinates (top-left corner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
}

/// Computes the panel placement.
///
/// Fallback order for the horizontal sides: preferred side, then the
/// mirrored side, then stacked below or above depending on which vertical
/// half of the viewport holds the region's center. A missing target region
/// degrades to a centered panel.
pub fn compute_placement(
    preferred: PreferredSide,
    target: Option<Rect>,
    viewport: Viewport,
) -> Placement {
    let Some(rect) = target else {
        return centered(viewport);
    };

    match preferred {
        PreferredSide::Center => centered(viewport),
        PreferredSide::BottomForced => Placement {
            left: clamp_left(rect.center_x() - PANEL_WIDTH / 2.0, viewport),
            top: rect.bottom() + PADDING,
        },
        PreferredSide::Bottom => stack_vertical(rect, viewport, true),
        PreferredSide::Left | PreferredSide::Right => {
            let left_pos = rect.left - PANEL_WIDTH - PADDING;
            let right_pos = rect.right() + PADDING;
            let left_fits = left_pos >= MARGIN;
            let right_fits = right_pos + PANEL_WIDTH + MARGIN <= viewport.width;

            let chosen = match preferred {
                PreferredSide::Left if left_fits => Some(left_pos),
                PreferredSide::Left if right_fits => Some(right_pos),
                PreferredSide::Right if right_fits => Some(right_pos),
                PreferredSide::Right if left_fits => Some(left_pos),
                _ => None,
            };

            match chosen {
                Some(left) => Placement {
                    left,
                    top: clamp_top(rect.top, viewport),
                },
                // Neither horizontal side fits: stack on the emptier half
                None => stack_vertical(rect, viewport, rect.center_y() < viewport.height / 2.0),
            }
        }
    }
}

fn centered(viewport: Viewport) -> Placement {
    Placement {
        left: (viewport.width - PANEL_WIDTH) / 2.0,
        top: (viewport.height - PANEL_HEIGHT) / 2.0,
    }
}

/// Places the panel below (or above) the region, horizontally centered on it.
fn stack_vertical(rect: Rect, viewport: Viewport, below: bool) -> Placement {
    let left = clamp_left(rect.center_x() - PANEL_WIDTH / 2.0, viewport);
    let top = if below {
        let below_pos = rect.bottom() + PADDING;
        if below_pos + PANEL_HEIGHT + MARGIN > viewport.height {
            rect.top - PANEL_HEIGHT - PADDING
        } else {
            below_pos
        }
    } else {
        let above_pos = rect.top - PANEL_HEIGHT - PADDING;
        if above_pos < MARGIN {
            rect.bottom() + PADDING
        } else {
            above_pos
        }
    };
    Placement {
        left,
        top: top.max(MARGIN),
    }
}

fn clamp_left(left: f64, viewport: Viewport) -> f64 {
    left.min(viewport.width - PANEL_WIDTH - MARGIN).max(MARGIN)
}

fn clamp_top(top: f64, viewport: Viewport) -> f64 {
    top.min(viewport.height - PANEL_HEIGHT - MARGIN).max(MARGIN)
}
