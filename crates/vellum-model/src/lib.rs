//! Source document tree for the Vellum canvas model.
//!
//! The document is the authored element tree a layout was rendered from.
//! The reconciler only ever reads it: stable element identity, ordered
//! children, and parent back-references are the whole contract.

mod document;

pub use document::*;

pub mod prelude {
    pub use crate::document::{
        Document, ElementDescriptor, SourceId, ATTR_LAYOUT, INCLUDE_TAG, MERGE_TAG,
    };
}
