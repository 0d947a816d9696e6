//! Raw engine bounds and the selection-rectangle adapter.

use crate::rect::{Point, Rect};

/// Minimal edge length of a selection rectangle, in pixels. Elements whose
/// rendered bounds collapse below this still get a usable hit target.
pub const SELECTION_MIN_EDGE: i32 = 6;

/// Parent-relative bounds as reported by the rendering engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RawBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RawBounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Converts these bounds into an absolute rectangle given the cumulative
    /// offset of all ancestors. The resulting width/height are stored with
    /// the inclusive convention (`far - near - 1`), see [`Rect`].
    pub const fn to_absolute(&self, offset: Point) -> Rect {
        let w = self.right - self.left;
        let h = self.bottom - self.top;

        Rect::new(self.left + offset.x, self.top + offset.y, w - 1, h - 1)
    }
}

/// Derives the selection rectangle from an absolute rectangle.
///
/// Each edge smaller than `min_edge` is grown to `min_edge`, shifting the
/// origin back by half the deficit so the expansion stays visually centered.
/// Rectangles that already meet the minimum come back unchanged.
pub fn to_selection_rect(abs: Rect, min_edge: i32) -> Rect {
    // Work on the exclusive extent; the stored fields are inclusive.
    let mut x = abs.x;
    let mut y = abs.y;
    let mut w = abs.width + 1;
    let mut h = abs.height + 1;

    if w < min_edge {
        x -= (min_edge - w) / 2;
        w = min_edge;
    }

    if h < min_edge {
        y -= (min_edge - h) / 2;
        h = min_edge;
    }

    Rect::new(x, y, w - 1, h - 1)
}

/// Margins reported by the rendering engine for a widget, when known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}
