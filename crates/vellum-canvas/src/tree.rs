//! The selection tree: the reconciler's output.
//!
//! Nodes live in an arena addressed by [`SelectionId`]; parent links and
//! sibling-group membership are plain ids, so the tree carries no ownership
//! cycles. One reconciliation produces one tree; the tree is read-only
//! afterwards except for the [`set_exploded`](SelectionTree::set_exploded)
//! flag, and is replaced wholesale by the next render.

use smallvec::SmallVec;
use vellum_geometry::{Margins, Rect, SELECTION_MIN_EDGE};
use vellum_model::{Document, SourceId, ATTR_LAYOUT};

use crate::render::ViewHandle;

/// Identity of a node within one [`SelectionTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelectionId(pub(crate) usize);

/// Identity of a sibling group within one [`SelectionTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

pub(crate) struct SelectionNode {
    pub(crate) name: String,
    pub(crate) view: Option<ViewHandle>,
    /// The source element this node represents. Absent for purely synthetic
    /// nodes (the headless context root, manufactured merge containers have
    /// the merge element itself).
    pub(crate) source: Option<SourceId>,
    pub(crate) abs_rect: Rect,
    pub(crate) selection_rect: Rect,
    pub(crate) baseline: Option<i32>,
    pub(crate) margins: Option<Margins>,
    pub(crate) parent: Option<SelectionId>,
    pub(crate) children: SmallVec<[SelectionId; 4]>,
    pub(crate) group: Option<GroupId>,
    pub(crate) exploded: bool,
}

/// A tree of selectable, inspectable elements with hit-testable bounds.
///
/// Consumers must treat the tree as read-only and use
/// [`selection_rect`](Self::selection_rect), not
/// [`abs_rect`](Self::abs_rect), for hit testing and highlighting.
pub struct SelectionTree {
    pub(crate) nodes: Vec<SelectionNode>,
    pub(crate) groups: Vec<SmallVec<[SelectionId; 2]>>,
    pub(crate) root: SelectionId,
    pub(crate) included_bounds: Vec<Rect>,
}

impl SelectionTree {
    /// The true root of the tree.
    pub fn root(&self) -> SelectionId {
        self.root
    }

    /// All node ids, in construction order.
    pub fn ids(&self) -> impl Iterator<Item = SelectionId> {
        (0..self.nodes.len()).map(SelectionId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Absolute bounds of each top-level included region. Non-empty only
    /// when the render root had no back-reference into this document (the
    /// layout was rendered embedded in some outer context).
    pub fn included_bounds(&self) -> &[Rect] {
        &self.included_bounds
    }

    /// Widget class name (or construct tag for synthesized nodes).
    pub fn name(&self, id: SelectionId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn view(&self, id: SelectionId) -> Option<ViewHandle> {
        self.nodes[id.0].view
    }

    /// The source element the node represents, when one exists.
    pub fn source(&self, id: SelectionId) -> Option<SourceId> {
        self.nodes[id.0].source
    }

    /// Bounds in absolute engine coordinates, inclusive width/height.
    pub fn abs_rect(&self, id: SelectionId) -> Rect {
        self.nodes[id.0].abs_rect
    }

    /// Hit-test bounds, each edge at least [`SELECTION_MIN_EDGE`] long.
    pub fn selection_rect(&self, id: SelectionId) -> Rect {
        self.nodes[id.0].selection_rect
    }

    pub fn baseline(&self, id: SelectionId) -> Option<i32> {
        self.nodes[id.0].baseline
    }

    pub fn margins(&self, id: SelectionId) -> Option<Margins> {
        self.nodes[id.0].margins
    }

    /// None only at the true root.
    pub fn parent(&self, id: SelectionId) -> Option<SelectionId> {
        self.nodes[id.0].parent
    }

    /// Children in display order.
    pub fn children(&self, id: SelectionId) -> &[SelectionId] {
        &self.nodes[id.0].children
    }

    /// True if `ancestor` is a direct or transitive parent of `id`.
    pub fn is_ancestor(&self, id: SelectionId, ancestor: SelectionId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// True for the true root, and for direct children of a source-less
    /// synthetic root (each embedded region acts as a root of its own in
    /// the headless-context case).
    pub fn is_root(&self, id: SelectionId) -> bool {
        match self.parent(id) {
            None => true,
            Some(p) => self.source(p).is_none() && self.parent(p).is_none(),
        }
    }

    /// The node's sibling group: every node representing the same source
    /// element, this node included. None for ungrouped nodes. A group
    /// always has at least two members.
    pub fn siblings(&self, id: SelectionId) -> Option<&[SelectionId]> {
        self.nodes[id.0]
            .group
            .map(|g| self.groups[g.0].as_slice())
    }

    /// True if the node is the first-constructed member of its sibling
    /// group. Ungrouped nodes count as primary.
    pub fn is_primary_sibling(&self, id: SelectionId) -> bool {
        match self.nodes[id.0].group {
            None => true,
            Some(g) => self.groups[g.0].first() == Some(&id),
        }
    }

    /// Children filtered to one entry per source element: secondary
    /// sibling-group members are skipped. Outline views consume this so a
    /// multiply-rendered element shows up once.
    pub fn unique_children(&self, id: SelectionId) -> Vec<SelectionId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_primary_sibling(child))
            .collect()
    }

    /// First node representing `source`, preferring a sibling group's
    /// primary member.
    pub fn find_by_source(&self, source: SourceId) -> Option<SelectionId> {
        self.ids().find(|&id| {
            self.nodes[id.0].source == Some(source) && self.is_primary_sibling(id)
        })
    }

    /// Deepest node whose selection rectangle contains the point. Later
    /// children are drawn on top and win over earlier ones.
    pub fn find_at(&self, x: i32, y: i32) -> Option<SelectionId> {
        self.find_at_in(self.root, x, y)
    }

    fn find_at_in(&self, id: SelectionId, x: i32, y: i32) -> Option<SelectionId> {
        if !self.selection_rect(id).contains(x, y) {
            return None;
        }
        for &child in self.children(id).iter().rev() {
            if let Some(hit) = self.find_at_in(child, x, y) {
                return Some(hit);
            }
        }
        Some(id)
    }

    /// True when the node rendered too small to see and is worth inflating
    /// before the next render: below-minimum extent, and either a container
    /// element or collapsed to nothing at all.
    pub fn is_invisible(&self, id: SelectionId, doc: &Document) -> bool {
        let abs = self.abs_rect(id);
        if abs.width >= SELECTION_MIN_EDGE && abs.height >= SELECTION_MIN_EDGE {
            return false;
        }
        match self.source(id) {
            Some(source) => {
                doc.descriptor(source).container || abs.width <= 0 || abs.height <= 0
            }
            None => false,
        }
    }

    /// Whether this node was inflated for visibility during the render pass
    /// that produced it. Set by the caller, never by the reconciler.
    pub fn is_exploded(&self, id: SelectionId) -> bool {
        self.nodes[id.0].exploded
    }

    pub fn set_exploded(&mut self, id: SelectionId, exploded: bool) {
        self.nodes[id.0].exploded = exploded;
    }

    /// The `layout` attribute of the closest enclosing `include` element,
    /// if this node was rendered as part of an embedded document reference.
    pub fn enclosing_include_ref<'doc>(
        &self,
        id: SelectionId,
        doc: &'doc Document,
    ) -> Option<&'doc str> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(source) = self.source(node) {
                if doc.is_include(source) {
                    if let Some(url) = doc.attribute(source, ATTR_LAYOUT) {
                        if !url.is_empty() {
                            return Some(url);
                        }
                    }
                }
            }
            current = self.parent(node);
        }
        None
    }
}
