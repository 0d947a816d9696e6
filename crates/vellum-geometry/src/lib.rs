//! Integer geometry for the Vellum canvas model.
//!
//! The rendering engine reports parent-relative pixel bounds; this crate
//! converts them into absolute rectangles and derives the minimum-size
//! selection rectangles used for hit testing and highlighting.

mod bounds;
mod rect;

pub use bounds::*;
pub use rect::*;

pub mod prelude {
    pub use crate::bounds::{to_selection_rect, Margins, RawBounds, SELECTION_MIN_EDGE};
    pub use crate::rect::{Point, Rect};
}
