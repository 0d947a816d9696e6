//! Canvas selection model for Vellum.
//!
//! An external rendering engine lays out a source document and returns a
//! geometry tree. This crate reconciles that tree with the document and
//! builds a [`SelectionTree`]: ordered, selectable elements whose bounds
//! are usable for hit testing and highlighting, each linked back to the
//! exact source element it represents when one exists.
//!
//! The entry point is [`build`]. One call builds one immutable tree; the
//! call is synchronous, performs no I/O, and may run on a worker thread as
//! long as the document stays read-stable for its duration.

mod reconcile;
mod render;
mod tree;

pub use reconcile::{build, CookieFidelity};
pub use render::{Cookie, RenderNode, ViewHandle};
pub use tree::{GroupId, SelectionId, SelectionTree};

pub mod prelude {
    pub use crate::reconcile::{build, CookieFidelity};
    pub use crate::render::{Cookie, RenderNode, ViewHandle};
    pub use crate::tree::{SelectionId, SelectionTree};
}
