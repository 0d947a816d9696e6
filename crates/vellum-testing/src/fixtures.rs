//! Shorthand constructors for render trees and documents.

use vellum_canvas::RenderNode;
use vellum_geometry::RawBounds;
use vellum_model::{Document, ElementDescriptor, SourceId};

/// A render node with the given class name and parent-relative bounds
/// `(left, top, right, bottom)`. Chain `with_cookie`/`with_child` onto it.
pub fn render(class_name: &str, bounds: (i32, i32, i32, i32)) -> RenderNode {
    let (left, top, right, bottom) = bounds;
    RenderNode::new(class_name, RawBounds::new(left, top, right, bottom))
}

/// A document with a single container root.
pub fn container_doc(root_tag: &str) -> (Document, SourceId) {
    let mut doc = Document::new();
    let root = doc.add_root(ElementDescriptor::container(root_tag));
    (doc, root)
}

/// A document with a container root and one widget child per tag, in order.
pub fn linear_doc(root_tag: &str, child_tags: &[&str]) -> (Document, SourceId, Vec<SourceId>) {
    let (mut doc, root) = container_doc(root_tag);
    let children = child_tags
        .iter()
        .map(|&tag| doc.add_child(root, ElementDescriptor::widget(tag)))
        .collect();
    (doc, root, children)
}
