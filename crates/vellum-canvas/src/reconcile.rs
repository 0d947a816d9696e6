//! Reconciles the engine's geometry tree with the source document tree.
//!
//! Render nodes and source elements do not align one to one: an embedded
//! document, a `merge` construct, or an older engine capability level can
//! all leave render nodes without back-references, several render nodes can
//! share one element, and elements can render nothing at all. The builder
//! here walks both trees in lock-step and degrades every mismatch into
//! either an omitted node or a zero-size placeholder; it never fails and it
//! never mutates its inputs.

use std::collections::VecDeque;

use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vellum_geometry::{to_selection_rect, Margins, Point, Rect, SELECTION_MIN_EDGE};
use vellum_model::{Document, SourceId, MERGE_TAG};

use crate::render::{Cookie, RenderNode, ViewHandle};
use crate::tree::{GroupId, SelectionId, SelectionNode, SelectionTree};

/// How reliably the rendering engine populates cookies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookieFidelity {
    /// The engine reports a back-reference for every structural position
    /// that has one; cookie-less render nodes are genuinely inert content
    /// and can be skipped without looking at the document.
    Complete,
    /// Older capability level: cookies can be missing for positions that do
    /// have source counterparts, so cookie-less children must be matched
    /// against the document by order.
    Legacy,
}

/// Builds the selection tree for one render pass.
///
/// Single-pass and synchronous; the caller must keep `doc` read-stable for
/// the duration of the call. The returned tree replaces any previous one
/// wholesale.
pub fn build(doc: &Document, render_root: &RenderNode, fidelity: CookieFidelity) -> SelectionTree {
    Builder::new(doc, fidelity).build(render_root)
}

struct Builder<'doc> {
    doc: &'doc Document,
    fidelity: CookieFidelity,
    nodes: Vec<SelectionNode>,
    groups: Vec<SmallVec<[SelectionId; 2]>>,
    /// Elements seen through merge cookies, mapped to their sibling group,
    /// in first-seen order.
    merge_groups: IndexMap<SourceId, GroupId>,
}

impl<'doc> Builder<'doc> {
    fn new(doc: &'doc Document, fidelity: CookieFidelity) -> Self {
        Self {
            doc,
            fidelity,
            nodes: Vec::new(),
            groups: Vec::new(),
            merge_groups: IndexMap::new(),
        }
    }

    fn build(mut self, render_root: &RenderNode) -> SelectionTree {
        match render_root.cookie {
            Cookie::None => {
                // The engine rendered an outer context this document is
                // merely embedded in. Manufacture a source-less root and
                // collect the regions that do belong to this document
                // under it.
                let root = self.create_view(None, render_root, Point::ZERO);
                self.add_keyed_subtrees(Some(root), render_root, Point::ZERO);

                // Included bounds are recorded before any merge container
                // is synthesized, one per distinct top-level element.
                let included: Vec<Rect> = self.nodes[root.0]
                    .children
                    .iter()
                    .filter(|&&child| self.is_primary(child))
                    .map(|&child| self.nodes[child.0].abs_rect)
                    .collect();

                self.insert_top_level_merge(root);
                self.finish(root, included)
            }
            Cookie::Node(_) | Cookie::Merge(_) => {
                let built = self.add_keyed_subtrees(None, render_root, Point::ZERO);
                // A usable cookie with no parent cannot be dropped, but
                // degrade to a source-less root rather than fail.
                let root = built.unwrap_or_else(|| {
                    self.create_view_for_source(None, render_root, Point::ZERO, None)
                });
                let root = self.expose_merge_root(root);
                self.finish(root, Vec::new())
            }
        }
    }

    /// Descends past cookie-less outer render nodes until subtrees with
    /// usable cookies are found, and builds those.
    fn add_keyed_subtrees(
        &mut self,
        parent: Option<SelectionId>,
        render: &RenderNode,
        offset: Point,
    ) -> Option<SelectionId> {
        if render.cookie.is_usable() {
            let subtree = self.create_subtree(parent, render, offset);
            if let (Some(parent), Some(subtree)) = (parent, subtree) {
                self.attach(parent, subtree);
            }
            subtree
        } else {
            let child_offset = offset.offset(render.bounds.left, render.bounds.top);
            for child in &render.children {
                self.add_keyed_subtrees(parent, child, child_offset);
            }
            None
        }
    }

    /// Builds the node for `render` and recurses into its children.
    /// Returns None when the node must be dropped.
    fn create_subtree(
        &mut self,
        parent: Option<SelectionId>,
        render: &RenderNode,
        offset: Point,
    ) -> Option<SelectionId> {
        let source = render.cookie.source()?;

        // A degenerate engine output can echo the parent's own element in
        // its children; such subtrees are dropped at this point.
        if let Some(parent) = parent {
            if self.nodes[parent.0].source == Some(source) {
                debug!("dropping render child echoing its parent element {source:?}");
                return None;
            }
        }

        let view = self.create_view(parent, render, offset);

        // Child bounds are relative to this render node.
        let child_offset = offset.offset(render.bounds.left, render.bounds.top);

        match self.fidelity {
            CookieFidelity::Complete => {
                for child in &render.children {
                    // Cookie-less children are adapter content or inert
                    // decoration; not independently selectable.
                    if child.cookie.is_usable() {
                        if let Some(subtree) = self.create_subtree(Some(view), child, child_offset)
                        {
                            self.attach(view, subtree);
                        }
                    }
                }
            }
            CookieFidelity::Legacy => {
                self.reconcile_children(view, source, render, child_offset);
            }
        }

        Some(view)
    }

    /// Legacy-mode child handling: cookie-less render children are matched
    /// against source children no cookie has claimed.
    fn reconcile_children(
        &mut self,
        view: SelectionId,
        source: SourceId,
        render: &RenderNode,
        offset: Point,
    ) {
        let mut missing = 0usize;
        let mut merges = 0usize;
        for child in &render.children {
            match child.cookie {
                Cookie::None => missing += 1,
                Cookie::Merge(_) => merges += 1,
                Cookie::Node(_) => {}
            }
        }

        if missing == 0 && merges == 0 {
            // Every child is directly usable; plain recursion.
            for child in &render.children {
                if let Some(subtree) = self.create_subtree(Some(view), child, offset) {
                    self.attach(view, subtree);
                }
            }
            return;
        }

        if self.doc.is_include(source) {
            // Expected: the content of an include lives in another document
            // and is a single opaque unit with no selectable children.
            return;
        }

        let mut unused: VecDeque<SourceId> =
            self.doc.children(source).iter().copied().collect();
        for child in &render.children {
            if let Some(claimed) = child.cookie.source() {
                if let Some(at) = unused.iter().position(|&u| u == claimed) {
                    unused.remove(at);
                }
            }
        }

        if unused.is_empty() && merges == 0 {
            // Views without cookies but nothing left to pair them with;
            // they cannot be represented.
            debug!("ignoring {missing} render children of {source:?} with no source candidate");
            for child in &render.children {
                if child.cookie.is_usable() {
                    if let Some(subtree) = self.create_subtree(Some(view), child, offset) {
                        self.attach(view, subtree);
                    }
                }
            }
            return;
        }

        if unused.len() == missing {
            // Counts line up; assume positional correspondence, consuming
            // the unclaimed elements in source order.
            for child in &render.children {
                if child.cookie.is_usable() {
                    if let Some(subtree) = self.create_subtree(Some(view), child, offset) {
                        self.attach(view, subtree);
                    }
                } else if let Some(paired) = unused.pop_front() {
                    let flat = self.create_view_for_source(Some(view), child, offset, Some(paired));
                    self.attach(view, flat);
                }
            }
        } else {
            self.add_mismatched(view, offset, &render.children, &mut unused);
        }
    }

    /// Uneven counts: pair each cookie-less render child with the first
    /// unclaimed element that fits between its usable neighbors in
    /// source-sibling order, then emit placeholders for whatever remains.
    fn add_mismatched(
        &mut self,
        parent: SelectionId,
        offset: Point,
        children: &[RenderNode],
        unused: &mut VecDeque<SourceId>,
    ) {
        // A usable sibling V1/N1 before the gap and V2/N2 after it
        // constrain the pairing: a candidate must sit strictly between N1
        // and N2 in source-sibling order. The unmatched counts are small,
        // so a linear scan per gap is enough.
        let mut after: Option<SourceId> = None;
        for (index, child) in children.iter().enumerate() {
            if child.cookie.is_usable() {
                if let Some(subtree) = self.create_subtree(Some(parent), child, offset) {
                    self.attach(parent, subtree);
                }
                if let Cookie::Node(id) = child.cookie {
                    after = Some(id);
                }
                continue;
            }

            let before = next_node_cookie(children, index);
            let matching = unused.iter().copied().find(|&candidate| {
                after.is_none_or(|a| self.is_after(a, candidate))
                    && before.is_none_or(|b| self.is_before(b, candidate))
            });

            if let Some(matched) = matching {
                if let Some(at) = unused.iter().position(|&u| u == matched) {
                    unused.remove(at);
                }
                let flat = self.create_view_for_source(Some(parent), child, offset, Some(matched));
                self.attach(parent, flat);
                after = Some(matched);
            } else {
                // No element satisfies the window; the render child stays
                // unrepresented. Only source-backed elements are
                // selectable, so this is a silent omission.
                debug!(
                    "no source candidate for cookie-less render child under {:?}",
                    self.nodes[parent.0].source
                );
            }
        }

        if !unused.is_empty() {
            self.add_placeholders(parent, offset, unused);
        }
    }

    /// Elements that rendered nothing still need to show up in outlines and
    /// stay selectable (and deletable). They become zero-size nodes at the
    /// current offset, slotted in by source-sibling rank.
    fn add_placeholders(
        &mut self,
        parent: SelectionId,
        offset: Point,
        unused: &mut VecDeque<SourceId>,
    ) {
        let abs = Rect::new(offset.x, offset.y, 0, 0);
        let sel = to_selection_rect(abs, SELECTION_MIN_EDGE);

        let source_parent = unused.front().and_then(|&node| self.doc.parent(node));
        if let Some(source_parent) = source_parent {
            let mut rank: FxHashMap<SourceId, usize> = FxHashMap::default();
            for (index, &child) in self.doc.children(source_parent).iter().enumerate() {
                rank.insert(child, index);
            }

            let mut ranks: Vec<usize> = unused
                .iter()
                .filter_map(|node| rank.get(node).copied())
                .collect();
            ranks.sort_unstable();

            for &target in ranks.iter().rev() {
                let found = unused
                    .iter()
                    .copied()
                    .find(|node| rank.get(node) == Some(&target));
                let Some(found) = found else { continue };

                let name = self.doc.tag(found).to_string();
                let placeholder =
                    self.alloc(Some(parent), name, None, Some(found), abs, sel, None, None);
                let insert_at = self.placeholder_position(parent, &rank, target);
                self.nodes[parent.0].children.insert(insert_at, placeholder);
                if let Some(at) = unused.iter().position(|&u| u == found) {
                    unused.remove(at);
                }
                debug!("added zero-size placeholder for {found:?} at rank {target}");
            }
        }

        // Anything without an established rank goes at the end.
        while let Some(node) = unused.pop_front() {
            let name = self.doc.tag(node).to_string();
            let placeholder = self.alloc(Some(parent), name, None, Some(node), abs, sel, None, None);
            self.attach(parent, placeholder);
        }
    }

    /// Insert position for a placeholder: immediately after the last
    /// already-present child whose source rank is smaller.
    fn placeholder_position(
        &self,
        parent: SelectionId,
        rank: &FxHashMap<SourceId, usize>,
        target: usize,
    ) -> usize {
        let siblings = &self.nodes[parent.0].children;
        for index in (0..siblings.len()).rev() {
            if let Some(source) = self.nodes[siblings[index].0].source {
                if let Some(&sibling_rank) = rank.get(&source) {
                    if sibling_rank < target {
                        return index + 1;
                    }
                }
            }
        }
        siblings.len()
    }

    /// In the headless case, groups of merge-hoisted views sitting directly
    /// under the synthetic root get wrapped in one synthesized container so
    /// the merge construct itself becomes selectable. Only the first
    /// consistent merge parent wins; later ones stay unmerged.
    fn insert_top_level_merge(&mut self, root: SelectionId) {
        if self.merge_groups.is_empty() {
            return;
        }

        let mut merge: Option<SourceId> = None;
        let mut merged: Vec<SelectionId> = Vec::new();
        for (&node, &group) in &self.merge_groups {
            let Some(parent) = self.doc.merge_parent(node) else {
                continue;
            };
            let Some(&primary) = self.groups[group.0].first() else {
                continue;
            };
            if self.nodes[primary.0].parent != Some(root) {
                continue;
            }
            if merge.is_some_and(|m| m != parent) {
                debug!("leaving additional merge group under {parent:?} unmerged");
                continue;
            }
            merge = Some(parent);
            merged.push(primary);
        }

        if merged.is_empty() {
            return;
        }

        let mut bounds = self.nodes[merged[0].0].abs_rect;
        for &member in &merged[1..] {
            bounds = bounds.union(&self.nodes[member.0].abs_rect);
        }
        let sel = to_selection_rect(bounds, SELECTION_MIN_EDGE);
        let container = self.alloc(
            Some(root),
            MERGE_TAG.to_string(),
            None,
            merge,
            bounds,
            sel,
            None,
            None,
        );

        for &member in &merged {
            let at = self.nodes[root.0].children.iter().position(|&c| c == member);
            if let Some(at) = at {
                self.nodes[root.0].children.remove(at);
                self.nodes[member.0].parent = Some(container);
                self.nodes[container.0].children.push(member);
            }
        }
        self.nodes[root.0].children.push(container);
        debug!(
            "inserted top-level merge container with {} members",
            self.nodes[container.0].children.len()
        );
    }

    /// A merge element is never represented by the engine. When the built
    /// root's element sits under one, surface the merge itself as the new
    /// true root so it can be selected and inspected.
    fn expose_merge_root(&mut self, root: SelectionId) -> SelectionId {
        let Some(source) = self.nodes[root.0].source else {
            return root;
        };
        let Some(merge) = self.doc.merge_parent(source) else {
            return root;
        };

        let abs = self.nodes[root.0].abs_rect;
        let sel = self.nodes[root.0].selection_rect;
        let container = self.alloc(
            None,
            MERGE_TAG.to_string(),
            None,
            Some(merge),
            abs,
            sel,
            None,
            None,
        );
        self.nodes[root.0].parent = Some(container);
        self.nodes[container.0].children.push(root);
        container
    }

    /// Builds one node, resolving its cookie and registering sibling-group
    /// membership for merge-hoisted views. Does not recurse.
    fn create_view(
        &mut self,
        parent: Option<SelectionId>,
        render: &RenderNode,
        offset: Point,
    ) -> SelectionId {
        let id = self.create_view_for_source(parent, render, offset, render.cookie.source());
        if let Cookie::Merge(merged) = render.cookie {
            self.register_sibling(merged, id);
        }
        id
    }

    /// Builds one node for an explicitly chosen source element (or none).
    /// Does not recurse and does not attach to the parent's child list.
    fn create_view_for_source(
        &mut self,
        parent: Option<SelectionId>,
        render: &RenderNode,
        offset: Point,
        source: Option<SourceId>,
    ) -> SelectionId {
        let abs = render.bounds.to_absolute(offset);
        let sel = to_selection_rect(abs, SELECTION_MIN_EDGE);
        self.alloc(
            parent,
            render.class_name.clone(),
            render.view,
            source,
            abs,
            sel,
            render.baseline,
            render.margins,
        )
    }

    fn register_sibling(&mut self, source: SourceId, id: SelectionId) {
        let group = match self.merge_groups.get(&source) {
            Some(&existing) => existing,
            None => {
                let group = GroupId(self.groups.len());
                self.groups.push(SmallVec::new());
                self.merge_groups.insert(source, group);
                group
            }
        };
        self.groups[group.0].push(id);
        self.nodes[id.0].group = Some(group);
    }

    #[allow(clippy::too_many_arguments)]
    fn alloc(
        &mut self,
        parent: Option<SelectionId>,
        name: String,
        view: Option<ViewHandle>,
        source: Option<SourceId>,
        abs_rect: Rect,
        selection_rect: Rect,
        baseline: Option<i32>,
        margins: Option<Margins>,
    ) -> SelectionId {
        let id = SelectionId(self.nodes.len());
        self.nodes.push(SelectionNode {
            name,
            view,
            source,
            abs_rect,
            selection_rect,
            baseline,
            margins,
            parent,
            children: SmallVec::new(),
            group: None,
            exploded: false,
        });
        id
    }

    fn attach(&mut self, parent: SelectionId, child: SelectionId) {
        self.nodes[parent.0].children.push(child);
    }

    fn is_primary(&self, id: SelectionId) -> bool {
        match self.nodes[id.0].group {
            None => true,
            Some(group) => self.groups[group.0].first() == Some(&id),
        }
    }

    /// True when `candidate` sits before `target` in their shared sibling
    /// list; false when no relation can be established.
    fn is_before(&self, target: SourceId, candidate: SourceId) -> bool {
        let Some(parent) = self.doc.parent(candidate) else {
            return false;
        };
        for &sibling in self.doc.children(parent) {
            if sibling == target {
                return false;
            }
            if sibling == candidate {
                return true;
            }
        }
        false
    }

    /// True when `candidate` sits after `target` in their shared sibling
    /// list; false when no relation can be established.
    fn is_after(&self, target: SourceId, candidate: SourceId) -> bool {
        let Some(parent) = self.doc.parent(candidate) else {
            return false;
        };
        for &sibling in self.doc.children(parent) {
            if sibling == target {
                return true;
            }
            if sibling == candidate {
                return false;
            }
        }
        false
    }

    fn finish(mut self, root: SelectionId, included_bounds: Vec<Rect>) -> SelectionTree {
        // A group only means something once a second view shows up;
        // dissolve the ones that never got one.
        let groups = std::mem::take(&mut self.groups);
        for members in &groups {
            if members.len() < 2 {
                for &member in members {
                    self.nodes[member.0].group = None;
                }
            }
        }

        SelectionTree {
            nodes: self.nodes,
            groups,
            root,
            included_bounds,
        }
    }
}

/// Source element of the next later render child carrying a direct cookie.
fn next_node_cookie(children: &[RenderNode], from: usize) -> Option<SourceId> {
    children[from..].iter().find_map(|child| match child.cookie {
        Cookie::Node(id) => Some(id),
        _ => None,
    })
}
