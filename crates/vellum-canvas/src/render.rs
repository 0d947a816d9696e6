//! Input types produced by the rendering engine.
//!
//! The engine lays out a document and hands back a tree of [`RenderNode`]s
//! with parent-relative bounds. Each node may carry a [`Cookie`] pointing
//! back at the source element that produced it; everything the reconciler
//! does revolves around how reliable those cookies are.

use vellum_geometry::{Margins, RawBounds};
use vellum_model::SourceId;

/// Opaque identifier of the live widget instance inside the rendering
/// engine. Carried through to the selection tree untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);

/// Back-reference from a render node to the source element it represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cookie {
    /// No back-reference: adapter content, inert decoration, content of an
    /// embedded document, or an engine capability level that cannot report
    /// one for this position.
    None,
    /// Direct reference to the source element.
    Node(SourceId),
    /// The render node is a flattened representation of the element, e.g.
    /// a child hoisted out of a `merge` construct. Several render nodes may
    /// carry a `Merge` cookie for the same element.
    Merge(SourceId),
}

impl Cookie {
    /// True for cookies the reconciler can act on.
    pub const fn is_usable(&self) -> bool {
        matches!(self, Cookie::Node(_) | Cookie::Merge(_))
    }

    /// The referenced source element, unwrapping merge cookies.
    pub const fn source(&self) -> Option<SourceId> {
        match *self {
            Cookie::None => None,
            Cookie::Node(id) | Cookie::Merge(id) => Some(id),
        }
    }
}

/// One node of the engine-produced geometry tree. Read-only to the
/// reconciler; coordinates are relative to the parent render node.
#[derive(Clone, Debug)]
pub struct RenderNode {
    /// Widget class name as reported by the engine.
    pub class_name: String,
    pub view: Option<ViewHandle>,
    pub bounds: RawBounds,
    /// Baseline offset, when the widget has one.
    pub baseline: Option<i32>,
    pub margins: Option<Margins>,
    pub cookie: Cookie,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(class_name: impl Into<String>, bounds: RawBounds) -> Self {
        Self {
            class_name: class_name.into(),
            view: None,
            bounds,
            baseline: None,
            margins: None,
            cookie: Cookie::None,
            children: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_view(mut self, view: ViewHandle) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_baseline(mut self, baseline: i32) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = Some(margins);
        self
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }
}
