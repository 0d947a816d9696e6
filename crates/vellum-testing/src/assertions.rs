//! Structural assertions over built selection trees.

use vellum_canvas::{SelectionId, SelectionTree};
use vellum_geometry::SELECTION_MIN_EDGE;

/// Checks the invariants every built tree must satisfy: parent/child
/// symmetry, minimum selection size, no self-parenting, sibling-group
/// symmetry with exactly one primary, and containment of source-backed
/// children within their source-backed parents.
pub fn assert_tree_invariants(tree: &SelectionTree) {
    for id in tree.ids() {
        for &child in tree.children(id) {
            assert_eq!(
                tree.parent(child),
                Some(id),
                "child {child:?} does not point back at {id:?}"
            );
        }
        if let Some(parent) = tree.parent(id) {
            assert!(
                tree.children(parent).contains(&id),
                "{id:?} missing from its parent's child list"
            );

            if let (Some(source), Some(parent_source)) = (tree.source(id), tree.source(parent)) {
                assert_ne!(
                    source, parent_source,
                    "{id:?} carries the same source element as its parent"
                );
            }
        }

        // Selection rects store inclusive extents; compare exclusive ones.
        let sel = tree.selection_rect(id);
        assert!(
            sel.width + 1 >= SELECTION_MIN_EDGE && sel.height + 1 >= SELECTION_MIN_EDGE,
            "selection rect of {id:?} is below the minimum edge: {sel:?}"
        );
        let abs = tree.abs_rect(id);
        if abs.width + 1 >= SELECTION_MIN_EDGE && abs.height + 1 >= SELECTION_MIN_EDGE {
            assert_eq!(
                sel, abs,
                "selection rect of {id:?} should equal its absolute rect"
            );
        }

        if let Some(siblings) = tree.siblings(id) {
            assert!(
                siblings.len() >= 2,
                "sibling group of {id:?} has a single member"
            );
            assert!(
                siblings.contains(&id),
                "sibling group of {id:?} does not contain it"
            );
            for &member in siblings {
                assert_eq!(
                    tree.siblings(member),
                    Some(siblings),
                    "sibling group of {member:?} differs from {id:?}'s"
                );
            }
            let primaries = siblings
                .iter()
                .filter(|&&member| tree.is_primary_sibling(member))
                .count();
            assert_eq!(primaries, 1, "group of {id:?} must have exactly one primary");
        }
    }

    assert_containment(tree, tree.root());
}

fn assert_containment(tree: &SelectionTree, id: SelectionId) {
    let parent_rect = tree.abs_rect(id);
    for &child in tree.children(id) {
        if tree.source(id).is_some() {
            let child_rect = tree.abs_rect(child);
            assert!(
                parent_rect.contains_rect(&child_rect),
                "{child:?} at {child_rect:?} escapes its parent at {parent_rect:?}"
            );
        }
        assert_containment(tree, child);
    }
}

/// Asserts two builds of the same inputs produced structurally identical
/// trees: same shape, names, sources, rectangles, and sibling groupings.
pub fn assert_same_shape(a: &SelectionTree, b: &SelectionTree) {
    assert_eq!(a.included_bounds(), b.included_bounds());
    assert_same_subtree(a, a.root(), b, b.root());
}

fn assert_same_subtree(a: &SelectionTree, at: SelectionId, b: &SelectionTree, bt: SelectionId) {
    assert_eq!(a.name(at), b.name(bt));
    assert_eq!(a.source(at), b.source(bt));
    assert_eq!(a.abs_rect(at), b.abs_rect(bt));
    assert_eq!(a.selection_rect(at), b.selection_rect(bt));
    assert_eq!(a.is_primary_sibling(at), b.is_primary_sibling(bt));
    assert_eq!(
        a.siblings(at).map(<[SelectionId]>::len),
        b.siblings(bt).map(<[SelectionId]>::len)
    );
    assert_eq!(a.children(at).len(), b.children(bt).len());
    for (&ac, &bc) in a.children(at).iter().zip(b.children(bt)) {
        assert_same_subtree(a, ac, b, bc);
    }
}

/// Child names in display order, for order-sensitive assertions.
pub fn child_names(tree: &SelectionTree, id: SelectionId) -> Vec<String> {
    tree.children(id)
        .iter()
        .map(|&child| tree.name(child).to_string())
        .collect()
}
